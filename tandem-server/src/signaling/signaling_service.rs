use crate::config::ServerConfig;
use crate::room::RoomManager;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{ConnectionId, IceServerConfig, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Write halves of every open client socket.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

impl ConnectionRegistry {
    pub fn add(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.connections.insert(connection_id, tx);
    }

    pub fn remove(&self, connection_id: &ConnectionId) {
        self.connections.remove(connection_id);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn send_text(&self, connection_id: ConnectionId, text: String) {
        if let Some(conn) = self.connections.get(&connection_id) {
            if let Err(e) = conn.send(Message::Text(text.into())) {
                error!("Failed to send WS message to {}: {:?}", connection_id, e);
            }
        } else {
            warn!(
                "Attempted to send signal to disconnected connection {}",
                connection_id
            );
        }
    }
}

#[async_trait]
impl SignalingOutput for ConnectionRegistry {
    async fn send_signal(&self, connection_id: ConnectionId, msg: SignalMessage) {
        match serde_json::to_string(&msg) {
            Ok(json) => self.send_text(connection_id, json),
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }

    async fn forward_frame(&self, connection_id: ConnectionId, frame: String) {
        self.send_text(connection_id, frame);
    }

    fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }
}

struct SignalingInner {
    connections: Arc<ConnectionRegistry>,
    ice_servers: Vec<IceServerConfig>,
}

/// Shared state of the relay: open sockets, rooms, and the ICE servers handed to
/// every client on connect.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    rooms: RoomManager,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>, room_queue: usize) -> Self {
        let connections = Arc::new(ConnectionRegistry::default());
        let rooms = RoomManager::new(connections.clone(), room_queue);

        Self {
            inner: Arc::new(SignalingInner {
                connections,
                ice_servers,
            }),
            rooms,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.ice_servers(), config.room_queue)
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Registers a freshly accepted socket and sends it the ICE server list.
    pub async fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.add(connection_id, tx);
        let msg = SignalMessage::IceServers {
            ice_servers: self.get_ice_servers(),
        };
        self.inner.connections.send_signal(connection_id, msg).await;
    }

    /// Unregisters the socket and releases whatever room slot it held.
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        // Unregister first: a join still queued in a room is then refused instead
        // of admitting a connection nobody will ever clean up.
        self.inner.connections.remove(&connection_id);
        self.rooms.disconnect(connection_id).await;
    }

    pub async fn send_signal(&self, connection_id: ConnectionId, msg: SignalMessage) {
        self.inner.connections.send_signal(connection_id, msg).await;
    }

    /// Handles one text frame received from `connection_id`.
    ///
    /// Offers, answers and candidates are relayed as the original text so their
    /// payload reaches the peer byte for byte.
    pub async fn dispatch(&self, connection_id: ConnectionId, text: &str) {
        let signal = match serde_json::from_str::<SignalMessage>(text) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("Invalid SignalMessage from {}: {:?}", connection_id, e);
                return;
            }
        };
        debug!(connection = %connection_id, kind = signal.kind(), "Signal received");

        match signal {
            SignalMessage::Join { room_id } => {
                let outcome = self.rooms.join(connection_id, room_id.clone()).await;
                self.send_signal(connection_id, outcome.into_message(room_id))
                    .await;
            }
            SignalMessage::Leave { room_id } => {
                self.rooms.leave(connection_id, &room_id).await;
            }
            SignalMessage::Offer { room_id, .. }
            | SignalMessage::Answer { room_id, .. }
            | SignalMessage::Candidate { room_id, .. } => {
                self.rooms
                    .relay(&room_id, connection_id, text.to_owned())
                    .await;
            }
            other => {
                warn!(
                    "Unexpected '{}' message from client {}, ignoring",
                    other.kind(),
                    connection_id
                );
            }
        }
    }
}
