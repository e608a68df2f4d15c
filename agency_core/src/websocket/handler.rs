use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::auth::authenticate_token;
use crate::websocket::messages::{ClientMessage, ServerMessage};
use crate::websocket::registry::{AdminConnection, ConnectionRegistry, ConnectionState};
use crate::AppState;

#[derive(serde::Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WebSocketQuery>,
    State(state): State<AppState>,
) -> Result<Response> {
    let registry = state
        .websocket_registry
        .clone()
        .ok_or_else(|| AppError::ServiceUnavailable("Notification channel not initialised".to_string()))?;

    let user_id = if state.config.websocket.require_auth {
        let token = params
            .token
            .ok_or_else(|| AppError::Authentication("Missing token".to_string()))?;
        let user = authenticate_token(&state, &token).await?;
        debug!(user_id = user.user_id, "WebSocket upgrade authenticated");
        Some(user.user_id)
    } else {
        None
    };

    let handshake = state.config.websocket.handshake_message.clone();

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, registry, user_id, handshake)))
}

async fn handle_socket(
    socket: WebSocket,
    registry: ConnectionRegistry,
    user_id: Option<i64>,
    handshake: String,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection = AdminConnection::new(user_id, tx);
    let connection_id = connection.id;
    registry.register(connection).await;

    if let Err(e) = registry.open(&connection_id, &handshake).await {
        warn!(%connection_id, "Failed to open WebSocket connection: {}", e);
        registry.unregister(&connection_id).await;
        return;
    }

    info!(%connection_id, ?user_id, "WebSocket connection established");

    let mut outgoing_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize WebSocket message: {}", e);
                    continue;
                }
            };

            if sink.send(Message::Text(json)).await.is_err() {
                debug!("WebSocket sink closed, stopping outgoing message handler");
                break;
            }
        }
    });

    let incoming_registry = registry.clone();
    let mut incoming_task = tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    handle_client_text(&incoming_registry, &connection_id, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    debug!("Received binary WebSocket message (not supported)");
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket connection closed by client");
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut outgoing_task => {
            debug!("Outgoing message handler completed");
            incoming_task.abort();
        }
        _ = &mut incoming_task => {
            debug!("Incoming message handler completed");
            outgoing_task.abort();
        }
    }

    registry.set_state(&connection_id, ConnectionState::Closing).await;
    registry.unregister(&connection_id).await;
    info!(%connection_id, "WebSocket connection closed");
}

async fn handle_client_text(registry: &ConnectionRegistry, connection_id: &Uuid, text: &str) {
    match ClientMessage::from_json(text) {
        Ok(ClientMessage::Ping) => {
            registry.send_to(connection_id, ServerMessage::Pong).await;
        }
        Err(e) => {
            debug!(%connection_id, "Ignoring unrecognised client frame: {}", e);
        }
    }
}
