#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use podium_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
presentations:
  - id: "deep-dive"
    presenterId: "alice" # wrong key spelling should fail
"#;

    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
presentations:
  - id: "deep-dive"
    presenter_id: "alice"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.presentations[0].id, "deep-dive");
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.gateway.send_queue, 256);
}

#[test]
fn empty_presentations_rejected() {
    let bad = r#"
version: 1
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn idle_timeout_must_exceed_ping_interval() {
    let bad = r#"
version: 1
gateway:
  ping_interval_ms: 30000
  idle_timeout_ms: 20000
presentations:
  - id: "deep-dive"
    presenter_id: "alice"
"#;
    assert!(config::load_from_str(bad).is_err());
}
