use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum State {
    New,
    Elaborated,
    FdApproved,
    #[serde(rename = "inTD")]
    InTd,
    TdComplete,
    InDev,
    InCodeReview,
    ReadyForTest,
    InTest,
    Closed,
    Removed,
    Blocked,
}

impl State {
    pub const ALL: [State; 12] = [
        State::New,
        State::Elaborated,
        State::FdApproved,
        State::InTd,
        State::TdComplete,
        State::InDev,
        State::InCodeReview,
        State::ReadyForTest,
        State::InTest,
        State::Closed,
        State::Removed,
        State::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::New => "new",
            State::Elaborated => "elaborated",
            State::FdApproved => "fdApproved",
            State::InTd => "inTD",
            State::TdComplete => "tdComplete",
            State::InDev => "inDev",
            State::InCodeReview => "inCodeReview",
            State::ReadyForTest => "readyForTest",
            State::InTest => "inTest",
            State::Closed => "closed",
            State::Removed => "removed",
            State::Blocked => "blocked",
        }
    }

    /// The label the backend uses for this state in `System.State`.
    pub fn label(&self) -> &'static str {
        match self {
            State::New => "New",
            State::Elaborated => "Elaborated",
            State::FdApproved => "Functional Design Approved",
            State::InTd => "In Technical Design",
            State::TdComplete => "Technical Design Completed",
            State::InDev => "In Development",
            State::InCodeReview => "In Code Review",
            State::ReadyForTest => "Ready for Test",
            State::InTest => "In Test",
            State::Closed => "Closed",
            State::Removed => "Removed",
            State::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of translating a backend status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum MappedState {
    Mapped(State),
    Unmapped(String),
}

impl MappedState {
    pub fn state(&self) -> Option<State> {
        match self {
            MappedState::Mapped(state) => Some(*state),
            MappedState::Unmapped(_) => None,
        }
    }
}

/// Exact, case-sensitive lookup of a `System.State` label.
pub fn to_state(label: &str) -> MappedState {
    match State::ALL.into_iter().find(|s| s.label() == label) {
        Some(state) => MappedState::Mapped(state),
        None => {
            tracing::warn!(label, "Unrecognized work item state");
            MappedState::Unmapped(label.to_string())
        }
    }
}
