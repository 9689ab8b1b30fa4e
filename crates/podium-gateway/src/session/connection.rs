//! Connection handle: the core's non-owning reference to one transport
//! endpoint. The transport task owns the socket; the core only holds the
//! outbound queue sender plus the identity fixed at init.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message};
use serde::Serialize;
use tokio::sync::mpsc;

use podium_core::error::CloseCode;
use podium_core::protocol::envelope;
use podium_core::types::{ClientId, PresentationId, Role};

#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    client_id: ClientId,
    presentation_id: PresentationId,
    role: Role,
    tx: mpsc::Sender<Message>,
}

impl Connection {
    pub fn new(
        client_id: ClientId,
        presentation_id: PresentationId,
        role: Role,
        tx: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                client_id,
                presentation_id,
                role,
                tx,
            }),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    pub fn presentation_id(&self) -> &str {
        &self.inner.presentation_id
    }

    pub fn role(&self) -> Role {
        self.inner.role
    }

    /// Encode and queue one message for this connection. Delivery is
    /// best-effort: a full or closed outbound queue drops the frame.
    pub fn send<T: Serialize>(&self, msg_type: &str, data: &T) {
        match envelope::encode(msg_type, data) {
            Ok(frame) => self.write(frame),
            Err(e) => {
                tracing::debug!(client = %self.inner.client_id, %e, "dropped unencodable frame")
            }
        }
    }

    /// Queue an already-serialized frame (broadcast path).
    pub fn write(&self, frame: String) {
        let _ = self.inner.tx.try_send(Message::Text(frame));
    }

    /// Queue a close frame with an application close code. The transport
    /// loop forwards it and tears the socket down.
    pub fn close(&self, code: CloseCode) {
        let frame = CloseFrame {
            code: code.as_u16(),
            reason: code.as_str().into(),
        };
        let _ = self.inner.tx.try_send(Message::Close(Some(frame)));
    }
}
