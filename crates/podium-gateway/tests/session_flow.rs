//! End-to-end routing tests: dispatcher, registry, and broadcast router
//! exercised over channel-backed connections, no WebSocket transport.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::extract::ws::Message;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use podium_core::error::CloseCode;
use podium_core::protocol::envelope::Envelope;
use podium_core::types::{Role, RunState};
use podium_gateway::dispatch::{Dispatcher, Outcome, Phase};
use podium_gateway::session::{BroadcastRouter, Connection, SessionRegistry};
use podium_gateway::store::{MemoryStore, PresentationStore};

const PRESENTATION: &str = "deep-dive";
const PRESENTER: &str = "alice";

fn fixture() -> (Dispatcher, Arc<SessionRegistry>, Arc<dyn PresentationStore>) {
    let mut store = MemoryStore::new();
    store.insert(PRESENTATION, PRESENTER, Some("slide-1".to_string()));
    let store: Arc<dyn PresentationStore> = Arc::new(store);
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = Dispatcher::new(store.clone(), registry.clone());
    (dispatcher, registry, store)
}

fn envelope(v: Value) -> Envelope {
    serde_json::from_str(&v.to_string()).unwrap()
}

fn init_env(client_id: &str, presenter: bool) -> Envelope {
    envelope(json!({
        "type": "init",
        "data": {
            "presentationId": PRESENTATION,
            "clientId": client_id,
            "presenter": presenter,
        }
    }))
}

fn msg(msg_type: &str) -> Envelope {
    envelope(json!({ "type": msg_type }))
}

fn msg_with(msg_type: &str, data: Value) -> Envelope {
    envelope(json!({ "type": msg_type, "data": data }))
}

/// One simulated endpoint: dispatch phase plus both ends of its queue.
struct Peer {
    phase: Phase,
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
}

impl Peer {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(64);
        Self {
            phase: Phase::Uninitialized,
            tx,
            rx,
        }
    }

    fn join(dispatcher: &Dispatcher, client_id: &str, presenter: bool) -> Self {
        let mut peer = Self::new();
        let out = dispatcher.dispatch(&mut peer.phase, &peer.tx, &init_env(client_id, presenter));
        assert_eq!(out, Outcome::Continue);
        peer
    }

    fn recv_raw(&mut self) -> String {
        match self.rx.try_recv().expect("expected a frame") {
            Message::Text(s) => s,
            other => panic!("unexpected message: {other:?}"),
        }
    }

    fn recv_frame(&mut self) -> (String, Value) {
        let v: Value = serde_json::from_str(&self.recv_raw()).unwrap();
        let msg_type = v["type"].as_str().unwrap().to_string();
        (msg_type, v.get("data").cloned().unwrap_or(Value::Null))
    }

    fn assert_empty(&mut self) {
        assert!(self.rx.try_recv().is_err(), "expected no pending frames");
    }
}

#[test]
fn fresh_session_has_no_presenter_and_no_listeners() {
    let registry = SessionRegistry::new();
    let (presenter_absent, listener_count) =
        registry.with_session("unseen", |s| (s.presenter().is_none(), s.listeners().len()));
    assert!(presenter_absent);
    assert_eq!(listener_count, 0);
    // the probe itself leaves no entry behind
    assert!(!registry.contains("unseen"));
    assert_eq!(registry.session_count(), 0);
}

#[test]
fn presenter_init_receives_initial_state() {
    let (dispatcher, registry, _) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);

    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "initial-state");
    assert_eq!(data["state"], "pending");
    assert_eq!(data["totalClients"], 0);
    assert_eq!(data["slideId"], "slide-1");
    assert!(data.get("poll").is_none());
    assert!(data.get("pollResults").is_none());

    assert!(registry.contains(PRESENTATION));
    assert!(registry.connection(PRESENTER).is_some());
}

#[test]
fn unauthorized_presenter_is_closed_without_session_mutation() {
    let (dispatcher, registry, _) = fixture();
    let mut mallory = Peer::new();

    let out = dispatcher.dispatch(&mut mallory.phase, &mallory.tx, &init_env("mallory", true));
    assert_eq!(out, Outcome::Close(CloseCode::Unauthorized));
    assert_eq!(registry.session_count(), 0);
    assert!(matches!(mallory.phase, Phase::Uninitialized));
    mallory.assert_empty();
}

#[test]
fn unknown_presentation_is_closed_without_registry_entry() {
    let (dispatcher, registry, _) = fixture();
    let mut bob = Peer::new();

    let env = envelope(json!({
        "type": "init",
        "data": {"presentationId": "ghost", "clientId": "bob", "presenter": false}
    }));
    let out = dispatcher.dispatch(&mut bob.phase, &bob.tx, &env);
    assert_eq!(out, Outcome::Close(CloseCode::PresentationNotFound));
    assert_eq!(registry.session_count(), 0);
    bob.assert_empty();
}

#[test]
fn messages_before_init_are_dropped() {
    let (dispatcher, registry, _) = fixture();
    let mut peer = Peer::new();

    let out = dispatcher.dispatch(&mut peer.phase, &peer.tx, &msg("listener-vote-up"));
    assert_eq!(out, Outcome::Continue);
    assert!(matches!(peer.phase, Phase::Uninitialized));
    assert_eq!(registry.session_count(), 0);
    peer.assert_empty();
}

#[test]
fn role_mismatched_messages_are_dropped() {
    let (dispatcher, _, store) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    alice.recv_frame();
    bob.recv_frame();

    // a listener cannot drive the presentation
    dispatcher.dispatch(&mut bob.phase, &bob.tx, &msg("presenter-start"));
    let p = store.presentation_by_id(PRESENTATION).unwrap();
    assert_eq!(p.run_state(), RunState::Pending);
    alice.assert_empty();
    bob.assert_empty();

    // a second init on an active connection is ignored
    dispatcher.dispatch(&mut bob.phase, &bob.tx, &init_env("bob", false));
    bob.assert_empty();
}

#[test]
fn broadcast_writes_identical_bytes_to_each_listener_only() {
    let registry = Arc::new(SessionRegistry::new());
    let router = BroadcastRouter::new(registry.clone());

    let (presenter_tx, mut presenter_rx) = mpsc::channel(8);
    registry.attach(Connection::new(
        "alice".into(),
        "p".into(),
        Role::Presenter,
        presenter_tx,
    ));

    let mut listener_rxs = Vec::new();
    for i in 0..3 {
        let (tx, rx) = mpsc::channel(8);
        registry.attach(Connection::new(format!("l{i}"), "p".into(), Role::Listener, tx));
        listener_rxs.push(rx);
    }

    router.broadcast("p", "presentation-state", &RunState::Active);

    let frames: Vec<String> = listener_rxs
        .iter_mut()
        .map(|rx| match rx.try_recv().unwrap() {
            Message::Text(s) => s,
            other => panic!("unexpected message: {other:?}"),
        })
        .collect();
    assert_eq!(frames.len(), 3);
    assert!(frames.windows(2).all(|w| w[0] == w[1]));
    assert!(presenter_rx.try_recv().is_err());
}

#[test]
fn notify_presenter_without_presenter_is_noop() {
    let registry = Arc::new(SessionRegistry::new());
    let router = BroadcastRouter::new(registry.clone());

    router.notify_presenter("p", "presenter-question", &"anyone?");
    assert_eq!(registry.session_count(), 0);
}

#[test]
fn presenter_and_listener_poll_flow() {
    let (dispatcher, registry, _) = fixture();

    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "initial-state");
    assert_eq!(data["totalClients"], 0);

    let mut bob = Peer::join(&dispatcher, "bob", false);
    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "presenter-total-listeners");
    assert_eq!(data, json!(1));
    let (msg_type, data) = bob.recv_frame();
    assert_eq!(msg_type, "initial-state");
    assert_eq!(data["state"], "pending");
    assert!(data.get("poll").is_none());

    let poll = json!({"id": "poll-1", "question": "ship it?", "options": ["yes", "later"]});
    dispatcher.dispatch(
        &mut alice.phase,
        &alice.tx,
        &msg_with("presenter-poll-start", poll.clone()),
    );
    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "presenter-poll-results");
    assert_eq!(data, json!([0, 0]));
    let (msg_type, data) = bob.recv_frame();
    assert_eq!(msg_type, "poll");
    assert_eq!(data, poll);

    dispatcher.dispatch(&mut bob.phase, &bob.tx, &msg_with("listener-poll-vote", json!(0)));
    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "presenter-poll-results");
    assert_eq!(data, json!([1, 0]));
    bob.assert_empty();

    // a duplicate answer is rejected with no outbound traffic
    dispatcher.dispatch(&mut bob.phase, &bob.tx, &msg_with("listener-poll-vote", json!(1)));
    alice.assert_empty();
    bob.assert_empty();

    dispatcher.handle_close(&mut bob.phase);
    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "presenter-total-listeners");
    assert_eq!(data, json!(0));
    assert!(registry.contains(PRESENTATION), "session retained while presenter is connected");
    assert!(registry.connection("bob").is_none());

    dispatcher.handle_close(&mut alice.phase);
    assert_eq!(registry.session_count(), 0);
}

#[test]
fn start_broadcasts_state_to_listeners_not_presenter() {
    let (dispatcher, _, _) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    alice.recv_frame();
    bob.recv_frame();

    dispatcher.dispatch(&mut alice.phase, &alice.tx, &msg("presenter-start"));
    let (msg_type, data) = bob.recv_frame();
    assert_eq!(msg_type, "presentation-state");
    assert_eq!(data, json!("active"));
    alice.assert_empty();
}

#[test]
fn poll_finish_broadcasts_clear_signal() {
    let (dispatcher, _, _) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    alice.recv_frame();
    bob.recv_frame();

    let poll = json!({"id": "poll-1", "question": "ship it?", "options": ["yes", "later"]});
    dispatcher.dispatch(&mut alice.phase, &alice.tx, &msg_with("presenter-poll-start", poll));
    alice.recv_frame();
    bob.recv_frame();

    dispatcher.dispatch(&mut alice.phase, &alice.tx, &msg("presenter-poll-finish"));
    let (msg_type, data) = bob.recv_frame();
    assert_eq!(msg_type, "poll");
    assert_eq!(data, json!(false));
}

#[test]
fn listener_question_reaches_presenter_as_raw_text() {
    let (dispatcher, _, _) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    alice.recv_frame();
    bob.recv_frame();

    dispatcher.dispatch(
        &mut bob.phase,
        &bob.tx,
        &msg_with("listener-question", json!("why rust?")),
    );
    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "presenter-question");
    assert_eq!(data, json!("why rust?"));
    bob.assert_empty();
}

#[test]
fn mood_votes_produce_no_outbound_traffic() {
    let (dispatcher, _, _) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    alice.recv_frame();
    bob.recv_frame();

    dispatcher.dispatch(&mut bob.phase, &bob.tx, &msg("listener-vote-up"));
    dispatcher.dispatch(&mut bob.phase, &bob.tx, &msg("listener-vote-down"));
    alice.assert_empty();
    bob.assert_empty();
}

#[test]
fn late_listener_sees_active_poll_and_own_vote() {
    let (dispatcher, _, _) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    alice.recv_frame();

    let poll = json!({"id": "poll-1", "question": "ship it?", "options": ["yes", "later"]});
    dispatcher.dispatch(&mut alice.phase, &alice.tx, &msg_with("presenter-poll-start", poll.clone()));
    alice.recv_frame();

    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    let (msg_type, data) = bob.recv_frame();
    assert_eq!(msg_type, "initial-state");
    assert_eq!(data["poll"], poll);
    assert!(data.get("pollVote").is_none());

    dispatcher.dispatch(&mut bob.phase, &bob.tx, &msg_with("listener-poll-vote", json!(1)));
    alice.recv_frame();
    dispatcher.handle_close(&mut bob.phase);
    alice.recv_frame();

    // same client reconnects: the initial state reports the earlier answer
    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    let (msg_type, data) = bob.recv_frame();
    assert_eq!(msg_type, "initial-state");
    assert_eq!(data["poll"], poll);
    assert_eq!(data["pollVote"], json!(1));
}

#[test]
fn close_is_consumed_exactly_once() {
    let (dispatcher, registry, store) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    let mut bob = Peer::join(&dispatcher, "bob", false);
    alice.recv_frame();
    alice.recv_frame();
    bob.recv_frame();

    dispatcher.handle_close(&mut bob.phase);
    let (msg_type, data) = alice.recv_frame();
    assert_eq!(msg_type, "presenter-total-listeners");
    assert_eq!(data, json!(0));

    // the second close is a no-op: no duplicate departure, no new frames
    dispatcher.handle_close(&mut bob.phase);
    alice.assert_empty();
    let p = store.presentation_by_id(PRESENTATION).unwrap();
    assert_eq!(p.total_clients(), 0);
    assert!(registry.contains(PRESENTATION));
}

#[test]
fn last_connection_close_removes_the_session() {
    let (dispatcher, registry, _) = fixture();
    let mut alice = Peer::join(&dispatcher, PRESENTER, true);
    alice.recv_frame();
    assert!(registry.contains(PRESENTATION));

    dispatcher.handle_close(&mut alice.phase);
    assert!(!registry.contains(PRESENTATION));
    assert_eq!(registry.session_count(), 0);
    assert!(registry.connection(PRESENTER).is_none());
}

#[test]
fn close_capability_queues_a_close_frame() {
    let (tx, mut rx) = mpsc::channel(4);
    let conn = Connection::new("x".into(), "p".into(), Role::Listener, tx);
    conn.close(CloseCode::Unauthorized);

    match rx.try_recv().unwrap() {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, 4401);
            assert_eq!(frame.reason, "unauthorized");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}
