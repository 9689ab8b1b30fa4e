//! Routes inbound frames to role handlers.
//!
//! A connection passes through two states: uninitialized (only `init` is
//! meaningful) and active (role handlers attached). The close transition is
//! consumed exactly once per connection. Handlers re-look-up the presentation
//! on every message; a record that has vanished from the store is a benign
//! race and the handler is a silent no-op.

use std::sync::Arc;

use axum::extract::ws::Message;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use podium_core::error::CloseCode;
use podium_core::protocol::envelope::Envelope;
use podium_core::protocol::messages::{client, server, InitPayload, Poll};
use podium_core::types::Role;

use crate::session::{BroadcastRouter, Connection, SessionRegistry};
use crate::store::{Presentation, PresentationStore};

/// Per-connection dispatch state.
pub enum Phase {
    /// Awaiting the init message.
    Uninitialized,
    /// Init accepted; the connection is attached to its session.
    Active(Connection),
    /// Close consumed; terminal.
    Closed,
}

impl Phase {
    /// The attached connection, once active.
    pub fn connection(&self) -> Option<&Connection> {
        match self {
            Phase::Active(conn) => Some(conn),
            _ => None,
        }
    }
}

/// What the transport loop should do after a dispatch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Close(CloseCode),
}

pub struct Dispatcher {
    store: Arc<dyn PresentationStore>,
    registry: Arc<SessionRegistry>,
    router: BroadcastRouter,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn PresentationStore>, registry: Arc<SessionRegistry>) -> Self {
        let router = BroadcastRouter::new(registry.clone());
        Self {
            store,
            registry,
            router,
        }
    }

    /// Single dispatch entry point. Consults the connection's phase, routes
    /// to the role handler table, and tells the transport whether to keep the
    /// socket open.
    pub fn dispatch(
        &self,
        phase: &mut Phase,
        tx: &mpsc::Sender<Message>,
        env: &Envelope,
    ) -> Outcome {
        match phase {
            Phase::Uninitialized => self.dispatch_init(phase, tx, env),
            Phase::Active(conn) => {
                let conn = conn.clone();
                self.dispatch_active(&conn, env);
                Outcome::Continue
            }
            Phase::Closed => Outcome::Continue,
        }
    }

    /// Consume the one-shot close transition. Subsequent calls are no-ops.
    pub fn handle_close(&self, phase: &mut Phase) {
        match std::mem::replace(phase, Phase::Closed) {
            Phase::Active(conn) => match conn.role() {
                Role::Presenter => self.presenter_left(&conn),
                Role::Listener => self.listener_left(&conn),
            },
            Phase::Uninitialized | Phase::Closed => {}
        }
    }

    fn dispatch_init(
        &self,
        phase: &mut Phase,
        tx: &mpsc::Sender<Message>,
        env: &Envelope,
    ) -> Outcome {
        if env.msg_type != client::INIT {
            tracing::debug!(msg_type = %env.msg_type, "message before init, dropped");
            return Outcome::Continue;
        }
        let init: InitPayload = match env.payload() {
            Ok(init) => init,
            Err(e) => {
                tracing::debug!(%e, "invalid init payload, dropped");
                return Outcome::Continue;
            }
        };

        let Some(presentation) = self.store.presentation_by_id(&init.presentation_id) else {
            tracing::debug!(
                presentation = %init.presentation_id,
                client = %init.client_id,
                "found no presentation for client"
            );
            return Outcome::Close(CloseCode::PresentationNotFound);
        };

        if init.presenter {
            if presentation.presenter_id() != init.client_id {
                tracing::debug!(client = %init.client_id, "unauthorized presenter");
                return Outcome::Close(CloseCode::Unauthorized);
            }
            let conn = Connection::new(
                init.client_id,
                init.presentation_id,
                Role::Presenter,
                tx.clone(),
            );
            self.attach_presenter(&conn, presentation.as_ref());
            *phase = Phase::Active(conn);
        } else {
            let conn = Connection::new(
                init.client_id,
                init.presentation_id,
                Role::Listener,
                tx.clone(),
            );
            self.attach_listener(&conn, presentation.as_ref());
            *phase = Phase::Active(conn);
        }
        Outcome::Continue
    }

    fn attach_presenter(&self, conn: &Connection, presentation: &dyn Presentation) {
        tracing::debug!(
            client = %conn.client_id(),
            presentation = %conn.presentation_id(),
            "presenter connected"
        );

        presentation.set_presenter_id(conn.client_id());
        self.registry.attach(conn.clone());

        let mut initial = Map::new();
        initial.insert("state".into(), json!(presentation.run_state()));
        initial.insert("totalClients".into(), json!(presentation.total_clients()));
        if let Some(slide_id) = presentation.slide_id() {
            initial.insert("slideId".into(), json!(slide_id));
        }
        if let Some(active) = presentation.poll() {
            initial.insert("poll".into(), json!(active.poll));
            initial.insert("pollResults".into(), json!(active.results));
        }
        conn.send(server::INITIAL_STATE, &Value::Object(initial));
    }

    fn attach_listener(&self, conn: &Connection, presentation: &dyn Presentation) {
        tracing::debug!(
            client = %conn.client_id(),
            presentation = %conn.presentation_id(),
            "listener connected"
        );

        self.registry.attach(conn.clone());

        let total = presentation.add_client(conn.client_id());
        tracing::debug!(total, "now total listeners");
        self.router
            .notify_presenter(conn.presentation_id(), server::PRESENTER_TOTAL_LISTENERS, &total);

        let mut initial = Map::new();
        initial.insert("state".into(), json!(presentation.run_state()));
        if let Some(active) = presentation.poll() {
            initial.insert("poll".into(), json!(active.poll));
            if let Some(vote) = presentation.poll_vote_of(conn.client_id(), &active.poll.id) {
                initial.insert("pollVote".into(), json!(vote));
            }
        }
        conn.send(server::INITIAL_STATE, &Value::Object(initial));
    }

    /// Role handler table. A message whose name belongs to the other role, an
    /// unknown name, or a repeated `init` is dropped.
    fn dispatch_active(&self, conn: &Connection, env: &Envelope) {
        match (conn.role(), env.msg_type.as_str()) {
            (Role::Presenter, client::PRESENTER_START) => self.on_presenter_start(conn),
            (Role::Presenter, client::PRESENTER_FINISH) => self.on_presenter_finish(conn),
            (Role::Presenter, client::PRESENTER_POLL_START) => self.on_poll_start(conn, env),
            (Role::Presenter, client::PRESENTER_POLL_FINISH) => self.on_poll_finish(conn),
            (Role::Listener, client::LISTENER_VOTE_UP) => self.on_vote_up(conn),
            (Role::Listener, client::LISTENER_VOTE_DOWN) => self.on_vote_down(conn),
            (Role::Listener, client::LISTENER_QUESTION) => self.on_question(conn, env),
            (Role::Listener, client::LISTENER_POLL_VOTE) => self.on_poll_vote(conn, env),
            _ => tracing::debug!(
                client = %conn.client_id(),
                role = conn.role().as_str(),
                msg_type = %env.msg_type,
                "message not handled for role, dropped"
            ),
        }
    }

    fn on_presenter_start(&self, conn: &Connection) {
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        let state = presentation.start();
        self.router
            .broadcast(conn.presentation_id(), server::PRESENTATION_STATE, &state);
    }

    fn on_presenter_finish(&self, conn: &Connection) {
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        let state = presentation.finish();
        self.router
            .broadcast(conn.presentation_id(), server::PRESENTATION_STATE, &state);
    }

    fn on_poll_start(&self, conn: &Connection, env: &Envelope) {
        let poll: Poll = match env.payload() {
            Ok(poll) => poll,
            Err(e) => {
                tracing::debug!(%e, "invalid poll payload, dropped");
                return;
            }
        };
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        let results = presentation.start_poll(poll.clone());
        // empty tally reaches the presenter before the poll reaches the room
        self.router
            .notify_presenter(conn.presentation_id(), server::PRESENTER_POLL_RESULTS, &results);
        self.router
            .broadcast(conn.presentation_id(), server::POLL, &poll);
    }

    fn on_poll_finish(&self, conn: &Connection) {
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        presentation.stop_poll();
        self.router
            .broadcast(conn.presentation_id(), server::POLL, &Value::Bool(false));
    }

    fn on_vote_up(&self, conn: &Connection) {
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        presentation.vote_up();
    }

    fn on_vote_down(&self, conn: &Connection) {
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        presentation.vote_down();
    }

    fn on_question(&self, conn: &Connection, env: &Envelope) {
        let text: String = match env.payload() {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(%e, "invalid question payload, dropped");
                return;
            }
        };
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        presentation.add_message(&text);
        self.router
            .notify_presenter(conn.presentation_id(), server::PRESENTER_QUESTION, &text);
    }

    fn on_poll_vote(&self, conn: &Connection, env: &Envelope) {
        let option: usize = match env.payload() {
            Ok(option) => option,
            Err(e) => {
                tracing::debug!(%e, "invalid poll vote payload, dropped");
                return;
            }
        };
        let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) else {
            return;
        };
        // a rejected answer produces no outbound traffic at all
        if let Some(results) = presentation.answer_poll(conn.client_id(), option) {
            self.router
                .notify_presenter(conn.presentation_id(), server::PRESENTER_POLL_RESULTS, &results);
        }
    }

    fn presenter_left(&self, conn: &Connection) {
        tracing::debug!(
            client = %conn.client_id(),
            presentation = %conn.presentation_id(),
            "presenter left"
        );
        self.registry.detach(conn);
    }

    fn listener_left(&self, conn: &Connection) {
        tracing::debug!(
            client = %conn.client_id(),
            presentation = %conn.presentation_id(),
            "listener left"
        );
        if !self.registry.detach(conn) {
            tracing::debug!(client = %conn.client_id(), "listener not found in session");
        }
        if let Some(presentation) = self.store.presentation_by_id(conn.presentation_id()) {
            let total = presentation.mark_client_absent(conn.client_id());
            tracing::debug!(total, "now total listeners");
            self.router.notify_presenter(
                conn.presentation_id(),
                server::PRESENTER_TOTAL_LISTENERS,
                &total,
            );
        }
    }
}
