//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Feed decoded frames into the protocol dispatcher
//! - Lifecycle: heartbeat ping + idle timeout, one-shot teardown on exit
//!
//! The loop never blocks on the core: sends from the routing side arrive on
//! the outbound queue and are written here, and a queued close frame from a
//! `Connection::close` terminates the socket.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use podium_core::types::Role;

use crate::app_state::AppState;
use crate::dispatch::{Outcome, Phase};
use crate::transport::codec::{decode, Inbound};

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    app.metrics().ws_upgrades.inc(&[]);
    ws.on_upgrade(move |socket| run_session(app, socket))
}

async fn run_session(app: AppState, socket: WebSocket) {
    let gw = &app.cfg().gateway;
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(gw.send_queue);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let dispatcher = app.dispatcher();
    let mut phase = Phase::Uninitialized;
    let mut counted_role: Option<Role> = None;
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(Message::Close(frame)) => {
                        let _ = ws_tx.send(Message::Close(frame)).await;
                        break;
                    }
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                match decode(msg) {
                    Ok(Inbound::Frame(env)) => {
                        app.metrics().messages_in.inc(&[("type", env.msg_type.as_str())]);
                        match dispatcher.dispatch(&mut phase, &out_tx, &env) {
                            Outcome::Continue => {}
                            Outcome::Close(code) => {
                                app.metrics().init_rejections.inc(&[("code", code.as_str())]);
                                let _ = ws_tx.send(Message::Close(Some(CloseFrame {
                                    code: code.as_u16(),
                                    reason: code.as_str().into(),
                                }))).await;
                                break;
                            }
                        }
                        if counted_role.is_none() {
                            if let Some(conn) = phase.connection() {
                                counted_role = Some(conn.role());
                                app.metrics()
                                    .connections_active
                                    .inc(&[("role", conn.role().as_str())]);
                            }
                        }
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Ok(Inbound::Pong) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        app.metrics().decode_errors.inc(&[]);
                        tracing::debug!(%e, "dropped undecodable frame");
                    }
                }
            }

            // heartbeat
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle sweep
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::debug!("idle timeout");
                    break;
                }
            }
        }
    }

    if let Some(role) = counted_role {
        app.metrics().connections_active.dec(&[("role", role.as_str())]);
    }
    dispatcher.handle_close(&mut phase);
}
