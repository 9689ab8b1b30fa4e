//! Shared id aliases and small domain enums.

use serde::{Deserialize, Serialize};

/// Opaque stable client identifier, unique for the connection's lifetime.
pub type ClientId = String;
/// Presentation identifier, the session registry key.
pub type PresentationId = String;
/// Poll identifier, scoped to one presentation.
pub type PollId = String;

/// Connection role, fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Presenter,
    Listener,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Presenter => "presenter",
            Role::Listener => "listener",
        }
    }
}

/// Presentation run state as carried in `presentation-state` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Pending,
    Active,
    Finished,
}
