//! Session registry:
//! - `presentation_id -> Session` (presenter slot + ordered listeners)
//! - `client_id -> Connection` global index
//!
//! The registry is an owned object constructed at process start and injected
//! wherever session state is consulted. All session mutation and every read
//! snapshot runs under one lock, so connection tasks never race on presenter
//! assignment, listener edits, or broadcast iteration.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use dashmap::DashMap;

use podium_core::types::{ClientId, PresentationId, Role};

use super::connection::Connection;

/// Live routing state for one presentation.
#[derive(Default)]
pub struct Session {
    presenter: Option<Connection>,
    listeners: Vec<Connection>,
}

impl Session {
    pub fn presenter(&self) -> Option<&Connection> {
        self.presenter.as_ref()
    }

    /// Listener sequence in attach order.
    pub fn listeners(&self) -> &[Connection] {
        &self.listeners
    }

    pub fn is_empty(&self) -> bool {
        self.presenter.is_none() && self.listeners.is_empty()
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<PresentationId, Session>>,
    clients: DashMap<ClientId, Connection>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create access to one session. The entry is created on first
    /// access and removed before returning whenever the closure leaves it
    /// with no presenter and no listeners, so an entry exists iff it routes
    /// to at least one connection.
    pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut sessions = lock(&self.sessions);
        let created = !sessions.contains_key(id);
        let session = sessions.entry(id.to_string()).or_default();
        if created {
            tracing::debug!(presentation = %id, "created empty session");
        }
        let out = f(&mut *session);
        if session.is_empty() {
            sessions.remove(id);
            tracing::debug!(presentation = %id, "removed empty session");
        }
        out
    }

    /// Attach an initialized connection in its role. Attaching is the only
    /// writer of the client-id -> connection relationship.
    pub fn attach(&self, conn: Connection) {
        let presentation_id = conn.presentation_id().to_string();
        self.clients.insert(conn.client_id().to_string(), conn.clone());
        self.with_session(&presentation_id, move |session| match conn.role() {
            Role::Presenter => session.presenter = Some(conn),
            Role::Listener => session.listeners.push(conn),
        });
    }

    /// Detach a closed connection from its session and the client index.
    /// Returns whether the session actually held it (a presenter detach
    /// always reports true; a listener not found is the caller's log line,
    /// not an error).
    pub fn detach(&self, conn: &Connection) -> bool {
        self.clients.remove(conn.client_id());
        self.with_session(conn.presentation_id(), |session| match conn.role() {
            Role::Presenter => {
                session.presenter = None;
                true
            }
            Role::Listener => {
                let before = session.listeners.len();
                session
                    .listeners
                    .retain(|c| c.client_id() != conn.client_id());
                session.listeners.len() < before
            }
        })
    }

    /// Presenter connection for a presentation, if one is attached.
    pub fn presenter_of(&self, id: &str) -> Option<Connection> {
        self.with_session(id, |session| session.presenter.clone())
    }

    /// Snapshot of the listener sequence, in attach order.
    pub fn listeners_of(&self, id: &str) -> Vec<Connection> {
        self.with_session(id, |session| session.listeners.to_vec())
    }

    /// Connection currently registered for a client id.
    pub fn connection(&self, client_id: &str) -> Option<Connection> {
        self.clients.get(client_id).map(|c| c.value().clone())
    }

    /// Whether a session entry currently exists. Does not create one.
    pub fn contains(&self, id: &str) -> bool {
        lock(&self.sessions).contains_key(id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}
