use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Tracker;
use crate::model::work_item::RawWorkItem;

const API_VERSION: &str = "7.0";

pub struct AzureDevOpsTracker {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl AzureDevOpsTracker {
    pub fn new(organization_url: String, project: Option<String>, token: String) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(":{token}"));
        Self {
            base_url: api_base(&organization_url, project.as_deref()),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}/_apis/wit/{path}?api-version={API_VERSION}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .with_context(|| format!("Azure DevOps {path} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Azure DevOps {path} returned {status}: {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse Azure DevOps {path} response"))
    }
}

fn api_base(organization_url: &str, project: Option<&str>) -> String {
    let org = organization_url.trim_end_matches('/');
    match project {
        Some(p) if !p.is_empty() => format!("{org}/{}", urlencoding::encode(p)),
        _ => org.to_string(),
    }
}

#[derive(Serialize)]
struct WiqlRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WiqlResponse {
    #[serde(default)]
    work_items: Vec<WorkItemReference>,
}

#[derive(Deserialize)]
struct WorkItemReference {
    id: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchRequest<'a> {
    ids: &'a [u32],
    #[serde(rename = "$expand")]
    expand: &'static str,
    error_policy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    as_of: Option<String>,
}

impl<'a> BatchRequest<'a> {
    fn new(ids: &'a [u32], as_of: Option<DateTime<Utc>>) -> Self {
        Self {
            ids,
            expand: "All",
            error_policy: "Omit",
            as_of: as_of.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    value: Vec<Option<RawWorkItem>>,
}

#[async_trait]
impl Tracker for AzureDevOpsTracker {
    fn name(&self) -> &str {
        "Azure DevOps"
    }

    async fn query_ids(&self, query: &str) -> Result<Vec<u32>> {
        tracing::debug!(%query, "Running WIQL query");
        let resp: WiqlResponse = self.post("wiql", &WiqlRequest { query }).await?;
        Ok(resp.work_items.into_iter().map(|r| r.id).collect())
    }

    async fn fetch_batch(
        &self,
        ids: &[u32],
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Vec<Option<RawWorkItem>>> {
        let request = BatchRequest::new(ids, as_of);
        let resp: BatchResponse = self.post("workitemsbatch", &request).await?;
        Ok(resp.value)
    }
}
