//! Chessroom relay server
//!
//! Pairs two players per room over WebSocket and forwards their moves.
//! The relay keeps no board: each client runs chessroom-core and validates
//! moves itself.
//!
//! Routes:
//! - `GET /ws` upgrades to a WebSocket speaking the JSON events in
//!   `chessroom_core::protocol`
//! - `GET /health` reports liveness

mod rooms;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use clap::{arg, command};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

use chessroom_core::{ClientEvent, ServerEvent};

use crate::rooms::{ConnId, Rooms};

// =============================================================================
// Shared State
// =============================================================================

struct AppStateInner {
    rooms: Mutex<Rooms>,
    next_conn: AtomicU64,
}

impl AppStateInner {
    /// Lock the room table, recovering from poisoning.
    fn rooms(&self) -> MutexGuard<'_, Rooms> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type AppState = Arc<AppStateInner>;

// =============================================================================
// WebSocket
// =============================================================================

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let conn = state.next_conn.fetch_add(1, Ordering::Relaxed);
    ws.on_upgrade(move |socket| handle_socket(socket, state, conn))
}

#[instrument(skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: AppState, conn: ConnId) {
    info!("client connected");
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Outbound: everything the room table queues for this connection
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(conn, error = %e, "failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "socket error");
                break;
            }
        };

        let event: ClientEvent = match serde_json::from_str(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "ignoring malformed frame");
                continue;
            }
        };

        if let Err(e) = state.rooms().dispatch(conn, &tx, event) {
            warn!(error = %e, "request rejected");
        }
    }

    state.rooms().disconnect(conn);
    writer.abort();
    info!("client disconnected");
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthModel {
    status: &'static str,
    rooms: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok",
        rooms: state.rooms().len(),
    })
}

// =============================================================================
// Main
// =============================================================================

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = command!()
        .arg(
            arg!(-b --bind <ADDR> "Address to listen on")
                .default_value("0.0.0.0:3001")
                .value_parser(clap::value_parser!(SocketAddr)),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = matches
        .get_one::<SocketAddr>("bind")
        .copied()
        .ok_or("missing --bind address")?;

    let state: AppState = Arc::new(AppStateInner {
        rooms: Mutex::new(Rooms::new()),
        next_conn: AtomicU64::new(1),
    });

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "chessroom relay listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
