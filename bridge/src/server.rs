use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use futures_util::sink::SinkExt;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{
    net::TcpListener,
    sync::{mpsc, Mutex},
};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use greenhouse_common::{BridgeConfig, SensorSnapshot};

use crate::{
    link::{DeviceLink, LinkRegistry},
    relay::CommandRelay,
};

#[derive(Clone)]
struct AppState {
    relay: Arc<CommandRelay>,
    links: Arc<LinkRegistry>,
}

#[derive(Debug, Serialize)]
struct RelayToggleResponse {
    #[serde(rename = "relayState")]
    relay_state: bool,
}

#[derive(Debug, Serialize)]
struct FanToggleResponse {
    #[serde(rename = "fanState")]
    fan_state: bool,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BridgeConfig::from_env();

    let snapshot = Arc::new(Mutex::new(SensorSnapshot::default()));
    let links = Arc::new(LinkRegistry::new());
    let app_state = AppState {
        relay: Arc::new(CommandRelay::new(snapshot, links.clone())),
        links,
    };

    let web_root = format!("{}/web", env!("CARGO_MANIFEST_DIR"));
    let app = Router::new()
        .route("/sensorData", get(handle_sensor_data))
        .route("/toggleRelay", post(handle_toggle_relay))
        .route("/toggleFan", post(handle_toggle_fan))
        .route("/ws/device", get(handle_device_socket))
        .fallback_service(ServeDir::new(web_root))
        .with_state(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind bridge server at {addr}"))?;

    info!("bridge listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn handle_sensor_data(State(state): State<AppState>) -> Json<SensorSnapshot> {
    Json(state.relay.snapshot().await)
}

async fn handle_toggle_relay(State(state): State<AppState>) -> Json<RelayToggleResponse> {
    Json(RelayToggleResponse {
        relay_state: state.relay.toggle_relay().await,
    })
}

async fn handle_toggle_fan(State(state): State<AppState>) -> Json<FanToggleResponse> {
    Json(FanToggleResponse {
        fan_state: state.relay.toggle_fan().await,
    })
}

async fn handle_device_socket(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| device_socket_loop(state, socket))
}

async fn device_socket_loop(state: AppState, mut socket: WebSocket) {
    let (tx, mut outbound) = mpsc::unbounded_channel();
    let link = DeviceLink::new(tx);
    let link_id = link.id();

    state.links.set_active(link.clone()).await;
    info!(link = link_id, "device connected");

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        // Node telemetry is logged as-is; no inbound frame
                        // format is defined yet.
                        info!(link = link_id, report = %text.as_str(), "device report");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        warn!(link = link_id, "device socket error: {err}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.links.clear_if_current(&link).await;
    let _ = socket.close().await;
    info!(link = link_id, "device disconnected");
}
