//! In-memory presentation store, seeded at boot and shared by tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use podium_core::protocol::messages::{Poll, PollResults, PollWithResults};
use podium_core::types::{ClientId, PollId, PresentationId, RunState};

use super::{Presentation, PresentationStore};

/// Process-local presentation records.
#[derive(Default)]
pub struct MemoryStore {
    presentations: HashMap<PresentationId, Arc<MemoryPresentation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one presentation record.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        presenter_id: impl Into<String>,
        slide_id: Option<String>,
    ) {
        let id = id.into();
        self.presentations.insert(
            id,
            Arc::new(MemoryPresentation::new(presenter_id.into(), slide_id)),
        );
    }
}

impl PresentationStore for MemoryStore {
    fn presentation_by_id(&self, id: &str) -> Option<Arc<dyn Presentation>> {
        self.presentations
            .get(id)
            .cloned()
            .map(|p| p as Arc<dyn Presentation>)
    }
}

struct ActivePoll {
    poll: Poll,
    results: PollResults,
}

#[derive(Default)]
struct PresentationState {
    presenter_id: ClientId,
    run_state: RunState,
    slide_id: Option<String>,
    present: HashSet<ClientId>,
    poll: Option<ActivePoll>,
    votes_by_poll: HashMap<ClientId, HashMap<PollId, usize>>,
    mood_up: u64,
    mood_down: u64,
    messages: Vec<String>,
}

pub struct MemoryPresentation {
    state: Mutex<PresentationState>,
}

impl MemoryPresentation {
    fn new(presenter_id: ClientId, slide_id: Option<String>) -> Self {
        Self {
            state: Mutex::new(PresentationState {
                presenter_id,
                slide_id,
                ..PresentationState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PresentationState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Presentation for MemoryPresentation {
    fn presenter_id(&self) -> ClientId {
        self.lock().presenter_id.clone()
    }

    fn run_state(&self) -> RunState {
        self.lock().run_state
    }

    fn slide_id(&self) -> Option<String> {
        self.lock().slide_id.clone()
    }

    fn total_clients(&self) -> u64 {
        self.lock().present.len() as u64
    }

    fn poll(&self) -> Option<PollWithResults> {
        self.lock().poll.as_ref().map(|active| PollWithResults {
            poll: active.poll.clone(),
            results: active.results.clone(),
        })
    }

    fn set_presenter_id(&self, id: &str) {
        self.lock().presenter_id = id.to_string();
    }

    fn start(&self) -> RunState {
        let mut st = self.lock();
        st.run_state = RunState::Active;
        st.run_state
    }

    fn finish(&self) -> RunState {
        let mut st = self.lock();
        st.run_state = RunState::Finished;
        st.run_state
    }

    fn start_poll(&self, poll: Poll) -> PollResults {
        let mut st = self.lock();
        let results = vec![0; poll.options.len()];
        st.poll = Some(ActivePoll {
            poll,
            results: results.clone(),
        });
        results
    }

    fn stop_poll(&self) {
        self.lock().poll = None;
    }

    fn add_client(&self, id: &str) -> u64 {
        let mut st = self.lock();
        st.present.insert(id.to_string());
        st.present.len() as u64
    }

    fn mark_client_absent(&self, id: &str) -> u64 {
        let mut st = self.lock();
        st.present.remove(id);
        st.present.len() as u64
    }

    fn vote_up(&self) {
        self.lock().mood_up += 1;
    }

    fn vote_down(&self) {
        self.lock().mood_down += 1;
    }

    fn add_message(&self, text: &str) {
        self.lock().messages.push(text.to_string());
    }

    fn answer_poll(&self, client_id: &str, option: usize) -> Option<PollResults> {
        let mut guard = self.lock();
        let st = &mut *guard;
        let active = st.poll.as_mut()?;
        if option >= active.results.len() {
            return None;
        }
        let votes = st.votes_by_poll.entry(client_id.to_string()).or_default();
        if votes.contains_key(&active.poll.id) {
            return None;
        }
        votes.insert(active.poll.id.clone(), option);
        active.results[option] += 1;
        Some(active.results.clone())
    }

    fn poll_vote_of(&self, client_id: &str, poll_id: &str) -> Option<usize> {
        self.lock()
            .votes_by_poll
            .get(client_id)
            .and_then(|votes| votes.get(poll_id))
            .copied()
    }
}
