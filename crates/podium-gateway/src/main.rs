//! Podium gateway binary.
//!
//! - WebSocket endpoint: /v1/ws
//! - Presentation protocol: init -> role handlers -> broadcast/unicast
//! - Heartbeat ping + idle timeout

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use podium_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_file("podium.yaml").expect("config load failed");
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .expect("gateway.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("app state build failed");
    let app = router::build_router(state);

    tracing::info!(%listen, "podium-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
