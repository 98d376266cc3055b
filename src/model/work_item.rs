use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::state::{to_state, MappedState};

const BUSINESS_BOARD: &str = "WEF_76EA049BBA4140FEA4D87B5A9F33458C_Kanban";
const DEV_BOARD: &str = "WEF_B16E2796978A433587ED3C652FE9C636_Kanban";

/// A work item exactly as returned by the batch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWorkItem {
    pub id: u32,
    pub rev: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Relations, links and anything else `$expand=All` brings along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: u32,
    pub rev: u32,
    pub state: MappedState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// `Microsoft.VSTS.Scheduling.StoryPoints`, unset on many item types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<f64>,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_path: Option<String>,
    #[serde(default)]
    pub area_levels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration_level1: Option<String>,
    pub board: BoardColumn,
    pub business_board: BoardColumn,
    pub dev_board: BoardColumn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_change_date: Option<DateTime<Utc>>,
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn flag(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key).and_then(|v| v.as_bool())
}

fn timestamp(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    fields
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn board(fields: &Map<String, Value>, prefix: &str) -> BoardColumn {
    BoardColumn {
        column: text(fields, &format!("{prefix}.Column")),
        done: flag(fields, &format!("{prefix}.Column.Done")),
        lane: text(fields, &format!("{prefix}.Lane")),
    }
}

impl From<&RawWorkItem> for WorkItem {
    fn from(raw: &RawWorkItem) -> Self {
        let f = &raw.fields;
        let state = to_state(text(f, "System.State").as_deref().unwrap_or_default());
        let area_levels = ["System.AreaLevel1", "System.AreaLevel2", "System.AreaLevel3"]
            .iter()
            .map_while(|key| text(f, key))
            .collect();

        WorkItem {
            id: raw.id,
            rev: raw.rev,
            state,
            work_item_type: text(f, "System.WorkItemType"),
            reason: text(f, "System.Reason"),
            story_points: f
                .get("Microsoft.VSTS.Scheduling.StoryPoints")
                .and_then(|v| v.as_f64()),
            title: text(f, "System.Title").unwrap_or_default(),
            url: raw.url.clone(),
            team_project: text(f, "System.TeamProject"),
            node_name: text(f, "System.NodeName"),
            area_path: text(f, "System.AreaPath"),
            area_levels,
            iteration_path: text(f, "System.IterationPath"),
            iteration_level1: text(f, "System.IterationLevel1"),
            board: BoardColumn {
                column: text(f, "System.BoardColumn"),
                done: flag(f, "System.BoardColumnDone"),
                lane: text(f, "System.BoardLane"),
            },
            business_board: board(f, BUSINESS_BOARD),
            dev_board: board(f, DEV_BOARD),
            created_date: timestamp(f, "System.CreatedDate"),
            changed_date: timestamp(f, "System.ChangedDate"),
            authorized_date: timestamp(f, "System.AuthorizedDate"),
            revised_date: timestamp(f, "System.RevisedDate"),
            state_change_date: timestamp(f, "Microsoft.VSTS.Common.StateChangeDate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::state::State;

    fn sample() -> RawWorkItem {
        serde_json::from_value(serde_json::json!({
            "id": 4711,
            "rev": 12,
            "url": "https://dev.azure.com/contoso/_apis/wit/workItems/4711",
            "fields": {
                "System.State": "In Technical Design",
                "System.Title": "Interface for ledger export",
                "System.WorkItemType": "Hybrid Story",
                "System.Reason": "Moved to state In Technical Design",
                "System.TeamProject": "BDC",
                "System.NodeName": "Business",
                "System.AreaPath": "BDC\\OAS (roll up)\\Business",
                "System.AreaLevel1": "BDC",
                "System.AreaLevel2": "OAS (roll up)",
                "System.AreaLevel3": "Business",
                "System.IterationPath": "BDC",
                "System.IterationLevel1": "BDC",
                "System.BoardColumn": "New",
                "System.BoardColumnDone": false,
                "System.CreatedDate": "2021-11-18T14:34:06.54Z",
                "System.ChangedDate": "2022-07-15T16:10:36.237Z",
                "System.AuthorizedDate": "2022-07-15T16:10:36.237Z",
                "System.RevisedDate": "9999-01-01T00:00:00Z",
                "Microsoft.VSTS.Common.StateChangeDate": "2021-11-18T14:34:06.54Z",
                "Microsoft.VSTS.Scheduling.StoryPoints": 5.0,
                "WEF_76EA049BBA4140FEA4D87B5A9F33458C_Kanban.Column": "01-Work in Progress",
                "WEF_76EA049BBA4140FEA4D87B5A9F33458C_Kanban.Column.Done": false,
                "WEF_76EA049BBA4140FEA4D87B5A9F33458C_Kanban.Lane": "Pod 5",
                "WEF_B16E2796978A433587ED3C652FE9C636_Kanban.Column": "In Technical Design",
                "WEF_B16E2796978A433587ED3C652FE9C636_Kanban.Column.Done": true
            },
            "relations": []
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_known_fields() {
        let item = WorkItem::from(&sample());
        assert_eq!(item.id, 4711);
        assert_eq!(item.rev, 12);
        assert_eq!(item.state, MappedState::Mapped(State::InTd));
        assert_eq!(item.story_points, Some(5.0));
        assert_eq!(item.title, "Interface for ledger export");
        assert_eq!(item.work_item_type.as_deref(), Some("Hybrid Story"));
        assert_eq!(item.area_levels, vec!["BDC", "OAS (roll up)", "Business"]);
        assert_eq!(item.iteration_level1.as_deref(), Some("BDC"));
        assert_eq!(item.board.column.as_deref(), Some("New"));
        assert_eq!(item.board.done, Some(false));
    }

    #[test]
    fn normalizes_both_kanban_boards() {
        let item = WorkItem::from(&sample());
        assert_eq!(
            item.business_board.column.as_deref(),
            Some("01-Work in Progress")
        );
        assert_eq!(item.business_board.lane.as_deref(), Some("Pod 5"));
        assert_eq!(item.dev_board.column.as_deref(), Some("In Technical Design"));
        assert_eq!(item.dev_board.done, Some(true));
        assert_eq!(item.dev_board.lane, None);
    }

    #[test]
    fn parses_timestamps() {
        let item = WorkItem::from(&sample());
        let changed = item.changed_date.unwrap();
        assert_eq!(changed.to_rfc3339(), "2022-07-15T16:10:36.237+00:00");
        assert!(item.revised_date.is_some());
    }

    #[test]
    fn missing_fields_stay_absent() {
        let raw: RawWorkItem = serde_json::from_value(serde_json::json!({
            "id": 1,
            "rev": 1,
            "fields": { "System.State": "Parked" }
        }))
        .unwrap();
        let item = WorkItem::from(&raw);
        assert_eq!(item.state, MappedState::Unmapped("Parked".into()));
        assert_eq!(item.story_points, None);
        assert!(item.title.is_empty());
        assert!(item.area_levels.is_empty());
        assert_eq!(item.created_date, None);
    }

    #[test]
    fn raw_item_keeps_expanded_payload() {
        let raw = sample();
        assert!(raw.extra.contains_key("relations"));
        let json = serde_json::to_value(&raw).unwrap();
        assert!(json.get("relations").is_some());
    }
}
