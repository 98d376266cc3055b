use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use super::state::State;
use super::work_item::WorkItem;

/// Key used for items whose backend label did not map to a `State`.
pub const UNMAPPED_KEY: &str = "unmapped";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub count: u32,
    pub story_points: f64,
}

/// Story points are kept as whole thousandths while accumulating.
const POINT_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bucket {
    count: u32,
    milli_points: i64,
}

impl Bucket {
    fn summary(&self) -> StateSummary {
        StateSummary {
            count: self.count,
            story_points: self.milli_points as f64 / POINT_SCALE,
        }
    }
}

fn milli_points(story_points: Option<f64>) -> i64 {
    story_points
        .filter(|p| !p.is_nan())
        .map_or(0, |p| (p * POINT_SCALE).round() as i64)
}

/// Per-state totals. Only states seen in the input have an entry.
///
/// Accumulation is exact, so the result does not depend on item order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatesSummary {
    buckets: BTreeMap<Option<State>, Bucket>,
}

impl StatesSummary {
    pub fn get(&self, state: Option<State>) -> Option<StateSummary> {
        self.buckets.get(&state).map(Bucket::summary)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> StateSummary {
        let total = self
            .buckets
            .values()
            .fold(Bucket::default(), |acc, b| Bucket {
                count: acc.count + b.count,
                milli_points: acc.milli_points + b.milli_points,
            });
        total.summary()
    }

    fn add(&mut self, state: Option<State>, story_points: Option<f64>) {
        let bucket = self.buckets.entry(state).or_default();
        bucket.count += 1;
        bucket.milli_points += milli_points(story_points);
    }
}

pub fn key_name(state: Option<State>) -> &'static str {
    state.map_or(UNMAPPED_KEY, |s| s.as_str())
}

impl Serialize for StatesSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (state, bucket) in &self.buckets {
            map.serialize_entry(key_name(*state), &bucket.summary())?;
        }
        map.end()
    }
}

pub fn summarize<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> StatesSummary {
    items
        .into_iter()
        .fold(StatesSummary::default(), |mut summary, item| {
            summary.add(item.state.state(), item.story_points);
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::state::MappedState;
    use crate::model::work_item::{BoardColumn, WorkItem};

    fn item(id: u32, state: MappedState, story_points: Option<f64>) -> WorkItem {
        WorkItem {
            id,
            rev: 1,
            state,
            work_item_type: Some("Hybrid Story".into()),
            reason: None,
            story_points,
            title: format!("Item {id}"),
            url: String::new(),
            team_project: None,
            node_name: None,
            area_path: None,
            area_levels: vec![],
            iteration_path: None,
            iteration_level1: None,
            board: BoardColumn::default(),
            business_board: BoardColumn::default(),
            dev_board: BoardColumn::default(),
            created_date: None,
            changed_date: None,
            authorized_date: None,
            revised_date: None,
            state_change_date: None,
        }
    }

    fn mapped(state: State) -> MappedState {
        MappedState::Mapped(state)
    }

    #[test]
    fn closed_and_in_dev_example() {
        let items = vec![
            item(1, mapped(State::Closed), Some(3.0)),
            item(2, mapped(State::Closed), Some(2.0)),
            item(3, mapped(State::InDev), Some(f64::NAN)),
        ];
        let summary = summarize(&items);

        assert_eq!(summary.buckets.len(), 2);
        assert_eq!(
            summary.get(Some(State::Closed)),
            Some(StateSummary {
                count: 2,
                story_points: 5.0
            })
        );
        assert_eq!(
            summary.get(Some(State::InDev)),
            Some(StateSummary {
                count: 1,
                story_points: 0.0
            })
        );
    }

    #[test]
    fn absent_story_points_count_as_zero() {
        let items = vec![item(1, mapped(State::New), None)];
        let summary = summarize(&items);
        let bucket = summary.get(Some(State::New)).unwrap();
        assert_eq!(bucket.count, 1);
        assert_eq!(bucket.story_points, 0.0);
    }

    #[test]
    fn unobserved_states_have_no_entry() {
        let items = vec![item(1, mapped(State::Blocked), Some(1.0))];
        let summary = summarize(&items);
        assert_eq!(summary.get(Some(State::New)), None);
        assert_eq!(summary.buckets.len(), 1);
    }

    #[test]
    fn unmapped_states_share_one_bucket() {
        let items = vec![
            item(1, MappedState::Unmapped("Parked".into()), Some(1.0)),
            item(2, MappedState::Unmapped("On Hold".into()), Some(2.0)),
            item(3, mapped(State::Closed), Some(8.0)),
        ];
        let summary = summarize(&items);
        assert_eq!(
            summary.get(None),
            Some(StateSummary {
                count: 2,
                story_points: 3.0
            })
        );
    }

    #[test]
    fn order_does_not_change_the_result() {
        let items = vec![
            item(1, mapped(State::Closed), Some(3.0)),
            item(2, mapped(State::InTest), Some(1.0)),
            item(3, mapped(State::Closed), None),
            item(4, MappedState::Unmapped("Parked".into()), Some(0.5)),
            item(5, mapped(State::InTest), Some(2.0)),
        ];
        let forward = summarize(&items);
        let reversed = summarize(items.iter().rev());
        let rotated = summarize(items[2..].iter().chain(items[..2].iter()));
        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
    }

    #[test]
    fn fractional_points_are_order_independent() {
        let items = vec![
            item(1, mapped(State::InTest), Some(0.1)),
            item(2, mapped(State::InTest), Some(0.2)),
            item(3, mapped(State::InTest), Some(0.3)),
        ];
        let forward = summarize(&items);
        let reversed = summarize(items.iter().rev());
        assert_eq!(forward, reversed);
        assert_eq!(forward.get(Some(State::InTest)).unwrap().story_points, 0.6);
    }

    #[test]
    fn reordering_fractional_points_keeps_the_sum() {
        let points = [0.1, 0.2, 0.3, 0.7, 1.1];
        let items: Vec<WorkItem> = points
            .iter()
            .enumerate()
            .map(|(i, p)| item(i as u32, mapped(State::Closed), Some(*p)))
            .collect();
        let expected = summarize(&items);

        let mut order: Vec<usize> = (0..items.len()).collect();
        for _ in 0..order.len() {
            for j in 1..order.len() {
                order.swap(j - 1, j);
                assert_eq!(summarize(order.iter().map(|&k| &items[k])), expected);
            }
        }
        assert_eq!(expected.total().story_points, 2.4);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let summary = summarize(&Vec::<WorkItem>::new());
        assert!(summary.is_empty());
        assert_eq!(summary.total(), StateSummary::default());
    }

    #[test]
    fn total_adds_all_buckets() {
        let items = vec![
            item(1, mapped(State::Closed), Some(3.0)),
            item(2, MappedState::Unmapped("Parked".into()), Some(2.5)),
        ];
        let total = summarize(&items).total();
        assert_eq!(total.count, 2);
        assert_eq!(total.story_points, 5.5);
    }

    #[test]
    fn serializes_with_state_keys() {
        let items = vec![
            item(1, mapped(State::InTd), Some(3.0)),
            item(2, MappedState::Unmapped("Parked".into()), None),
        ];
        let json = serde_json::to_value(summarize(&items)).unwrap();
        assert_eq!(json["inTD"]["count"], 1);
        assert_eq!(json["inTD"]["storyPoints"], 3.0);
        assert_eq!(json["unmapped"]["count"], 1);
    }
}
