//! Outbound routing: listener fan-out and presenter unicast.

use std::sync::Arc;

use serde::Serialize;

use podium_core::protocol::envelope;

use super::registry::SessionRegistry;

/// Egress over a shared registry: serialize once then write identical bytes
/// to every listener, or send to the session's presenter only.
pub struct BroadcastRouter {
    registry: Arc<SessionRegistry>,
}

impl BroadcastRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Write one identical frame to every listener currently attached, in
    /// session order. Encoding failure is a no-op: no partial send. Nothing
    /// is sent to the presenter.
    pub fn broadcast<T: Serialize>(&self, presentation_id: &str, msg_type: &str, data: &T) {
        let frame = match envelope::encode(msg_type, data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(presentation = %presentation_id, %e, "broadcast encode failed");
                return;
            }
        };

        let listeners = self.registry.listeners_of(presentation_id);
        tracing::debug!(
            presentation = %presentation_id,
            msg_type,
            total = listeners.len(),
            "broadcast"
        );
        for conn in &listeners {
            conn.write(frame.clone());
        }
    }

    /// Send one message to the presenter only. A session without a presenter
    /// is a no-op. Unicast takes the per-connection encoding path; it has no
    /// fan-out to amortize.
    pub fn notify_presenter<T: Serialize>(&self, presentation_id: &str, msg_type: &str, data: &T) {
        match self.registry.presenter_of(presentation_id) {
            Some(presenter) => presenter.send(msg_type, data),
            None => {
                tracing::debug!(presentation = %presentation_id, msg_type, "no presenter to notify")
            }
        }
    }
}
