//! JSON frame envelope.
//!
//! Inbound frames keep `data` as `RawValue` so the payload is parsed only
//! after the dispatcher has accepted the message name for the connection's
//! role. Outbound frames go through the single [`encode`] point, which is
//! what lets the broadcast path serialize once and fan out bytes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{PodiumError, Result};

/// One inbound frame: `{"type": <name>, "data": <payload>}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Message name (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl Envelope {
    /// Parse the payload as `T`. A missing payload is reported the same way
    /// as a malformed one.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self
            .data
            .as_ref()
            .ok_or_else(|| PodiumError::BadRequest(format!("{}: missing data", self.msg_type)))?;
        serde_json::from_str(raw.get())
            .map_err(|e| PodiumError::BadRequest(format!("{}: invalid data: {e}", self.msg_type)))
    }
}

/// Serialize one outbound frame.
pub fn encode<T: Serialize>(msg_type: &str, data: &T) -> Result<String> {
    #[derive(Serialize)]
    struct Frame<'a, T> {
        #[serde(rename = "type")]
        msg_type: &'a str,
        data: &'a T,
    }
    serde_json::to_string(&Frame { msg_type, data })
        .map_err(|e| PodiumError::Internal(format!("encode {msg_type} failed: {e}")))
}
