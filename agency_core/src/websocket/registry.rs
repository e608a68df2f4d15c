use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock as StateLock;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::websocket::messages::{NotificationEvent, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// One live admin browser session.
#[derive(Debug)]
pub struct AdminConnection {
    pub id: Uuid,
    pub user_id: Option<i64>,
    pub connected_at: DateTime<Utc>,
    state: StateLock<ConnectionState>,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl AdminConnection {
    pub fn new(user_id: Option<i64>, sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            connected_at: Utc::now(),
            state: StateLock::new(ConnectionState::Connecting),
            sender,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    pub fn send(&self, message: ServerMessage) -> Result<()> {
        self.sender.send(message)
            .map_err(|_| AppError::WebSocket(format!("Connection {} is no longer receiving", self.id)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Live connection set shared by the socket handler and everything that emits events.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<Uuid, AdminConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: AdminConnection) {
        let connection_id = connection.id;
        self.connections.write().await.insert(connection_id, connection);
        info!(%connection_id, "WebSocket connection registered");
    }

    pub async fn unregister(&self, connection_id: &Uuid) -> bool {
        let removed = self.connections.write().await.remove(connection_id);
        match removed {
            Some(connection) => {
                connection.set_state(ConnectionState::Closed);
                info!(%connection_id, "WebSocket connection unregistered");
                true
            }
            None => false,
        }
    }

    /// Queues the handshake frame, then moves the connection to `Open`.
    ///
    /// Broadcasts only target open connections, so the handshake is always
    /// the first frame a client receives.
    pub async fn open(&self, connection_id: &Uuid, handshake_message: &str) -> Result<()> {
        let connections = self.connections.read().await;
        let connection = connections
            .get(connection_id)
            .ok_or_else(|| AppError::WebSocket(format!("Unknown connection {}", connection_id)))?;

        connection.send(ServerMessage::Connected {
            message: handshake_message.to_string(),
        })?;
        connection.set_state(ConnectionState::Open);
        Ok(())
    }

    pub async fn set_state(&self, connection_id: &Uuid, state: ConnectionState) -> bool {
        match self.connections.read().await.get(connection_id) {
            Some(connection) => {
                connection.set_state(state);
                true
            }
            None => false,
        }
    }

    pub async fn state_of(&self, connection_id: &Uuid) -> Option<ConnectionState> {
        self.connections.read().await.get(connection_id).map(|c| c.state())
    }

    pub async fn send_to(&self, connection_id: &Uuid, message: ServerMessage) -> bool {
        match self.connections.read().await.get(connection_id) {
            Some(connection) if connection.state() == ConnectionState::Open => {
                connection.send(message).is_ok()
            }
            _ => false,
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn open_count(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.state() == ConnectionState::Open)
            .count()
    }

    /// Fire-and-forget fan-out to every open connection.
    ///
    /// A failed send never stops the loop; the failing connection is counted
    /// and dropped from the registry afterwards.
    pub async fn broadcast(&self, event: NotificationEvent) -> BroadcastReport {
        let event_type = event.event_type.clone();
        let message = ServerMessage::from(event);
        let mut report = BroadcastReport::default();
        let mut failed_connections = Vec::new();

        {
            let connections = self.connections.read().await;
            for (connection_id, connection) in connections.iter() {
                if connection.state() != ConnectionState::Open {
                    report.skipped += 1;
                    continue;
                }

                match connection.send(message.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        warn!(%connection_id, "Failed to deliver {} event: {}", event_type, e);
                        report.failed += 1;
                        failed_connections.push(*connection_id);
                    }
                }
            }
        }

        for connection_id in &failed_connections {
            self.unregister(connection_id).await;
        }

        debug!(
            event = %event_type,
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            "Broadcast complete"
        );

        report
    }
}

/// Seam for anything that publishes admin notifications.
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    async fn publish(&self, event: NotificationEvent) -> BroadcastReport;
}

#[async_trait]
impl EventBroadcaster for ConnectionRegistry {
    async fn publish(&self, event: NotificationEvent) -> BroadcastReport {
        self.broadcast(event).await
    }
}

/// Optional broadcaster handle; publishing without one logs and does nothing.
#[derive(Clone, Default)]
pub struct Notifier {
    broadcaster: Option<Arc<dyn EventBroadcaster>>,
}

impl Notifier {
    pub fn new(broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        Self {
            broadcaster: Some(broadcaster),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.broadcaster.is_some()
    }

    pub async fn notify(&self, event: NotificationEvent) -> Option<BroadcastReport> {
        match &self.broadcaster {
            Some(broadcaster) => Some(broadcaster.publish(event).await),
            None => {
                warn!(event = %event.event_type, "Notification channel not initialised, dropping event");
                None
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
