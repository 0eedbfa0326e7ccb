use std::sync::Arc;

use anyhow::Result;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::gateway::admission::ConnectParams;
use crate::gateway::events::Frame;
use crate::gateway::rooms::ConnectionHandle;
use crate::gateway::router::EventRouter;
use crate::gateway::session::SessionGateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<SessionGateway>,
    pub router: Arc<EventRouter>,
    pub socket_buffer: usize,
}

pub fn app(state: AppState) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening for boats and observers on {}", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Runs one connection from admission to disconnect.
async fn handle_socket(socket: WebSocket, params: ConnectParams, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Frame>(state.socket_buffer.max(1));
    let handle = ConnectionHandle::new(tx);

    let session = match state.gateway.on_connect(&handle, &params).await {
        Ok(session) => session,
        Err(rejection) => {
            let close = CloseFrame {
                code: close_code::POLICY,
                reason: rejection.to_string().into(),
            };
            if let Err(e) = sink.send(Message::Close(Some(close))).await {
                debug!("Could not deliver rejection to {}: {}", handle.id, e);
            }
            return;
        }
    };
    debug!(
        "Session {} open as {} of {}",
        session.connection_id, session.role, session.boat_emblem
    );

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode '{}' frame: {}", frame.event, e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match Frame::parse(&text) {
                Ok(frame) => {
                    state.router.route(session.connection_id, frame);
                }
                Err(e) => warn!("Malformed frame from {}: {}", session.connection_id, e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Socket error on {}: {}", session.connection_id, e);
                break;
            }
        }
    }

    state.gateway.on_disconnect(session.connection_id);
    writer.abort();
}
