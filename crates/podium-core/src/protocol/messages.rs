//! Presentation message set: wire names and payload types.

use serde::{Deserialize, Serialize};

use crate::types::{ClientId, PollId, PresentationId};

/// Inbound message names (client -> gateway).
pub mod client {
    pub const INIT: &str = "init";
    pub const PRESENTER_START: &str = "presenter-start";
    pub const PRESENTER_FINISH: &str = "presenter-finish";
    pub const PRESENTER_POLL_START: &str = "presenter-poll-start";
    pub const PRESENTER_POLL_FINISH: &str = "presenter-poll-finish";
    pub const LISTENER_VOTE_UP: &str = "listener-vote-up";
    pub const LISTENER_VOTE_DOWN: &str = "listener-vote-down";
    pub const LISTENER_QUESTION: &str = "listener-question";
    pub const LISTENER_POLL_VOTE: &str = "listener-poll-vote";
}

/// Outbound message names (gateway -> client).
pub mod server {
    pub const INITIAL_STATE: &str = "initial-state";
    pub const PRESENTATION_STATE: &str = "presentation-state";
    pub const POLL: &str = "poll";
    pub const PRESENTER_TOTAL_LISTENERS: &str = "presenter-total-listeners";
    pub const PRESENTER_QUESTION: &str = "presenter-question";
    pub const PRESENTER_POLL_RESULTS: &str = "presenter-poll-results";
}

/// Payload of the `init` message: the connection declares who it is and
/// which presentation it attaches to.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct InitPayload {
    pub presentation_id: PresentationId,
    pub client_id: ClientId,
    #[serde(default)]
    pub presenter: bool,
}

/// A poll as authored by the presenter and broadcast to listeners.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    pub options: Vec<String>,
}

/// Per-option vote tally for a poll, indexed by option position.
pub type PollResults = Vec<u64>;

/// The active poll together with its running tally.
#[derive(Debug, Clone)]
pub struct PollWithResults {
    pub poll: Poll,
    pub results: PollResults,
}
