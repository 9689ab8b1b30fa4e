//! Presentation business model, consumed through a narrow interface.
//!
//! The routing core never owns presentation data; it forwards mutations and
//! reflects the returned values outward. Lookup absence is the explicit
//! stale-reference case: every active-state handler treats `None` as a
//! silent no-op.

mod memory;

pub use memory::MemoryStore;

use std::sync::Arc;

use podium_core::protocol::messages::{Poll, PollResults, PollWithResults};
use podium_core::types::{ClientId, RunState};

/// Lookup surface of the business model.
pub trait PresentationStore: Send + Sync {
    fn presentation_by_id(&self, id: &str) -> Option<Arc<dyn Presentation>>;
}

/// One presentation's record. Mutators return the updated values the routing
/// core sends outward.
pub trait Presentation: Send + Sync {
    fn presenter_id(&self) -> ClientId;
    fn run_state(&self) -> RunState;
    fn slide_id(&self) -> Option<String>;
    fn total_clients(&self) -> u64;
    fn poll(&self) -> Option<PollWithResults>;

    fn set_presenter_id(&self, id: &str);
    fn start(&self) -> RunState;
    fn finish(&self) -> RunState;
    /// Make `poll` the active poll; returns its empty tally.
    fn start_poll(&self, poll: Poll) -> PollResults;
    fn stop_poll(&self);
    /// Register `id` as present; returns the updated listener total.
    fn add_client(&self, id: &str) -> u64;
    /// Mark `id` absent; returns the updated listener total.
    fn mark_client_absent(&self, id: &str) -> u64;
    fn vote_up(&self);
    fn vote_down(&self);
    fn add_message(&self, text: &str);
    /// Record a poll answer. `None` when rejected: no active poll, option
    /// out of range, or the client already answered this poll.
    fn answer_poll(&self, client_id: &str, option: usize) -> Option<PollResults>;
    /// The option this client chose for `poll_id`, if any.
    fn poll_vote_of(&self, client_id: &str, poll_id: &str) -> Option<usize>;
}
