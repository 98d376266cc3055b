use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::fan_out;
use crate::fetch::{fetch_raw, get_work_items};
use crate::model::state::State;
use crate::model::summary::{key_name, summarize, StatesSummary};
use crate::providers::Tracker;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedSummary {
    /// `None` for the current (non-dated) snapshot.
    pub as_of: Option<NaiveDate>,
    pub states: StatesSummary,
}

pub async fn summarize_date(
    tracker: &dyn Tracker,
    work_item_type: &str,
    as_of: Option<NaiveDate>,
) -> Result<DatedSummary> {
    let items = get_work_items(tracker, work_item_type, as_of).await?;
    let states = summarize(&items);
    if states.is_empty() {
        tracing::warn!(as_of = ?as_of, work_item_type, "No work items matched");
    }
    Ok(DatedSummary { as_of, states })
}

/// One summary per date, all fetched at once. Any failed date fails the report.
pub async fn summarize_dates(
    tracker: &dyn Tracker,
    work_item_type: &str,
    dates: &[NaiveDate],
) -> Result<Vec<DatedSummary>> {
    fan_out::all_or_nothing(dates.iter().map(|date| async move {
        summarize_date(tracker, work_item_type, Some(*date))
            .await
            .with_context(|| format!("Snapshot {date} failed"))
    }))
    .await
}

/// Like [`summarize_dates`], but a failed date does not discard the others.
pub async fn summarize_dates_settled(
    tracker: &dyn Tracker,
    work_item_type: &str,
    dates: &[NaiveDate],
) -> Vec<(NaiveDate, Result<DatedSummary>)> {
    let outcomes = fan_out::settled(
        dates
            .iter()
            .map(|date| summarize_date(tracker, work_item_type, Some(*date))),
    )
    .await;
    dates.iter().copied().zip(outcomes).collect()
}

/// Write the raw fetch result as pretty JSON.
pub async fn dump_raw(
    tracker: &dyn Tracker,
    work_item_type: &str,
    as_of: Option<NaiveDate>,
    path: &Path,
) -> Result<usize> {
    let raw = fetch_raw(tracker, work_item_type, as_of).await?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&raw)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(count = raw.len(), path = %path.display(), "Wrote raw work items");
    Ok(raw.len())
}

pub fn render(summary: &DatedSummary) -> String {
    let heading = summary
        .as_of
        .map_or_else(|| "current".to_string(), |d| d.to_string());
    let total = summary.states.total();
    let mut out = format!(
        "{heading}  ({} items, {} points)\n",
        total.count,
        format_points(total.story_points)
    );

    let ordered = State::ALL.iter().map(|s| Some(*s)).chain(std::iter::once(None));
    for key in ordered {
        if let Some(s) = summary.states.get(key) {
            let _ = writeln!(
                out,
                "  {:<14} {:>5} {:>8}",
                key_name(key),
                s.count,
                format_points(s.story_points)
            );
        }
    }
    out
}

fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points:.1}")
    }
}
