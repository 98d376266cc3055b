use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::fan_out;
use crate::model::work_item::{RawWorkItem, WorkItem};
use crate::providers::Tracker;

/// Largest id list the batch endpoint accepts in one request.
pub const BATCH_SIZE: usize = 200;

pub fn build_query(work_item_type: &str, as_of: Option<NaiveDate>) -> String {
    let escaped = work_item_type.replace('\'', "''");
    let mut query =
        format!("select [System.Id] From WorkItems where [System.workItemType] = '{escaped}'");
    if let Some(date) = as_of {
        query.push_str(&format!(" ASOF '{}'", date.format("%Y-%m-%d")));
    }
    query
}

pub fn partition_ids(ids: &[u32]) -> Vec<&[u32]> {
    ids.chunks(BATCH_SIZE).collect()
}

/// Point in time a dated snapshot is taken at: the last millisecond of that day (UTC).
pub fn snapshot_instant(date: NaiveDate) -> DateTime<Utc> {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or_default();
    date.and_time(end_of_day).and_utc()
}

/// Query and hydrate every matching item, unprocessed.
pub async fn fetch_raw(
    tracker: &dyn Tracker,
    work_item_type: &str,
    as_of: Option<NaiveDate>,
) -> Result<Vec<RawWorkItem>> {
    let query = build_query(work_item_type, as_of);
    let ids = tracker
        .query_ids(&query)
        .await
        .with_context(|| format!("{} query failed", tracker.name()))?;

    let batches = partition_ids(&ids);
    let total = batches.len();
    let instant = as_of.map(snapshot_instant);
    tracing::debug!(
        ids = ids.len(),
        batches = total,
        as_of = ?as_of,
        "Fetching work item batches"
    );

    let results = fan_out::all_or_nothing(batches.iter().enumerate().map(|(i, batch)| async move {
        tracker
            .fetch_batch(batch, instant)
            .await
            .with_context(|| format!("Batch {} of {total} failed", i + 1))
    }))
    .await?;

    let returned: usize = results.iter().map(Vec::len).sum();
    let items: Vec<RawWorkItem> = results.into_iter().flatten().flatten().collect();
    let omitted = ids.len().saturating_sub(items.len());
    if omitted > 0 {
        tracing::debug!(omitted, returned, "Some work items were not returned");
    }

    Ok(items)
}

/// Work items of `work_item_type`, as of the end of `as_of` or as they are now.
///
/// Order is not meaningful: batches are fetched concurrently.
pub async fn get_work_items(
    tracker: &dyn Tracker,
    work_item_type: &str,
    as_of: Option<NaiveDate>,
) -> Result<Vec<WorkItem>> {
    let raw = fetch_raw(tracker, work_item_type, as_of).await?;
    let items: Vec<WorkItem> = raw.iter().map(WorkItem::from).collect();
    tracing::info!(count = items.len(), as_of = ?as_of, "Fetched work items");
    Ok(items)
}
