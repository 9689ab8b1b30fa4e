//! Decode-once codec for the transport layer.
//!
//! - Text frames => Envelope (lazy `RawValue` for data)
//! - Ping/Pong/Close are surfaced for lifecycle management
//! - Binary frames are rejected: the presentation protocol is text-only

use axum::extract::ws::Message;

use podium_core::error::{PodiumError, Result};
use podium_core::protocol::envelope::Envelope;

#[derive(Debug)]
pub enum Inbound {
    Frame(Envelope),
    Ping(Vec<u8>),
    Pong,
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let env: Envelope = serde_json::from_str(&s)
                .map_err(|e| PodiumError::BadRequest(format!("invalid envelope json: {e}")))?;
            Ok(Inbound::Frame(env))
        }
        Message::Binary(_) => Err(PodiumError::BadRequest("binary frames unsupported".into())),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
