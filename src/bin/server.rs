use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use star_rush_server::config::ServerConfig;
use star_rush_server::constants::TICK_MS;
use star_rush_server::engine::GameEngine;
use star_rush_server::gateway::{OutboundMessage, SessionGateway};
use star_rush_server::logging::init_tracing;
use star_rush_server::map_loader::load_zone_index_or_default;
use star_rush_server::server_utils::parse_scoreboard_limit;
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

const OUTBOUND_QUEUE_CAPACITY: usize = 256;

type SharedState = Arc<Mutex<SessionGateway>>;

#[derive(Debug, Deserialize)]
struct ScoreboardQuery {
    limit: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let config = ServerConfig::parse();

    let zones = load_zone_index_or_default(config.map_path.as_deref());
    let seed = config.seed.unwrap_or_else(|| rand::rng().random::<u32>());
    let engine = GameEngine::new(zones, seed, config.engine_options());
    tracing::info!(
        seed,
        total_rounds = engine.options().total_rounds,
        round_seconds = engine.options().round_duration_secs,
        zones = engine.zones().len(),
        "engine ready"
    );

    let state = Arc::new(Mutex::new(SessionGateway::new(engine)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/scoreboard", get(scoreboard_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = match resolve_static_dir(config.static_dir.as_deref()) {
        Some(static_dir) => {
            tracing::info!(root = %static_dir.display(), "serving static files");
            let index_file = static_dir.join("index.html");
            app.fallback_service(
                ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
            )
        }
        None => app,
    };

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app).await
}

fn resolve_static_dir(configured: Option<&Path>) -> Option<PathBuf> {
    let path = configured?;
    if path.join("index.html").is_file() {
        return Some(path.to_path_buf());
    }
    tracing::warn!(root = %path.display(), "static dir has no index.html, not serving it");
    None
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn scoreboard_handler(
    State(state): State<SharedState>,
    Query(query): Query<ScoreboardQuery>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.scoreboard(parse_scoreboard_limit(query.limit.as_deref())))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_CAPACITY);
    let session_id = {
        let mut guard = state.lock().await;
        guard.connect(tx)
    };

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                let mut guard = state.lock().await;
                guard.handle_raw(&session_id, raw.as_str());
            }
            Message::Binary(raw) => {
                let mut guard = state.lock().await;
                match std::str::from_utf8(&raw) {
                    Ok(text) => guard.handle_raw(&session_id, text),
                    Err(_) => guard.handle_raw(&session_id, ""),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.on_disconnect(&session_id);
    }
    let _ = writer.await;
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            let report = guard.tick(TICK_MS);
            if let Some(number) = report.round_started {
                tracing::debug!(round = number, "tick rolled round");
            }
        }
    });
}
