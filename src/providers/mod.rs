pub mod azure;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::model::work_item::RawWorkItem;

/// The backend a report is built from.
#[async_trait]
pub trait Tracker: Send + Sync {
    fn name(&self) -> &str;

    /// Run a query and return the ids it selects, in query order.
    async fn query_ids(&self, query: &str) -> Result<Vec<u32>>;

    /// Fetch full records for up to 200 ids, optionally as they were at `as_of`.
    ///
    /// Ids that are deleted or not visible are returned as `None` rather than
    /// failing the request.
    async fn fetch_batch(
        &self,
        ids: &[u32],
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Vec<Option<RawWorkItem>>>;
}


pub fn create_tracker(config: &AppConfig) -> Result<Box<dyn Tracker>> {
    let azure = config.azure_settings()?;
    Ok(Box::new(azure::AzureDevOpsTracker::new(
        azure.organization_url,
        azure.project,
        azure.token,
    )))
}
