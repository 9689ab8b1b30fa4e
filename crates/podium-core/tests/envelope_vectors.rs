//! Envelope and close-code vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use podium_core::error::CloseCode;
use podium_core::protocol::envelope::{encode, Envelope};
use podium_core::protocol::messages::InitPayload;

#[test]
fn parse_envelope_min() {
    let env: Envelope = serde_json::from_str(r#"{"type":"presenter-start"}"#).unwrap();
    assert_eq!(env.msg_type, "presenter-start");
    assert!(env.data.is_none());
    // a payload request against a bare frame is an error, not a panic
    assert!(env.payload::<String>().is_err());
}

#[test]
fn parse_envelope_with_init_payload() {
    let s = r#"{"type":"init","data":{"presentationId":"deep-dive","clientId":"alice","presenter":true}}"#;
    let env: Envelope = serde_json::from_str(s).unwrap();
    let init: InitPayload = env.payload().unwrap();
    assert_eq!(init.presentation_id, "deep-dive");
    assert_eq!(init.client_id, "alice");
    assert!(init.presenter);
}

#[test]
fn presenter_flag_defaults_to_listener() {
    let s = r#"{"type":"init","data":{"presentationId":"deep-dive","clientId":"bob"}}"#;
    let env: Envelope = serde_json::from_str(s).unwrap();
    let init: InitPayload = env.payload().unwrap();
    assert!(!init.presenter);
}

#[test]
fn unknown_envelope_field_rejected() {
    let s = r#"{"type":"init","data":{},"extra":1}"#;
    assert!(serde_json::from_str::<Envelope>(s).is_err());
}

#[test]
fn malformed_payload_is_an_error() {
    let s = r#"{"type":"listener-poll-vote","data":"not-a-number"}"#;
    let env: Envelope = serde_json::from_str(s).unwrap();
    assert!(env.payload::<usize>().is_err());
}

#[test]
fn encode_frame_shape() {
    let frame = encode("poll", &false).unwrap();
    assert_eq!(frame, r#"{"type":"poll","data":false}"#);

    let frame = encode("presenter-total-listeners", &3u64).unwrap();
    assert_eq!(frame, r#"{"type":"presenter-total-listeners","data":3}"#);
}

#[test]
fn close_codes_are_stable() {
    assert_eq!(CloseCode::PresentationNotFound.as_u16(), 4404);
    assert_eq!(CloseCode::PresentationNotFound.as_str(), "presentation_not_found");
    assert_eq!(CloseCode::Unauthorized.as_u16(), 4401);
    assert_eq!(CloseCode::Unauthorized.as_str(), "unauthorized");
}
