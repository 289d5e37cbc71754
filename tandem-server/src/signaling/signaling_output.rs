use async_trait::async_trait;
use tandem_core::{ConnectionId, SignalMessage};

/// Outbound side of the relay, implemented by whatever owns the client sockets.
/// Rooms use it to notify and forward without knowing about WebSockets.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Serialize and send a relay-originated message.
    async fn send_signal(&self, connection_id: ConnectionId, msg: SignalMessage);

    /// Send a frame exactly as it was received from another member.
    async fn forward_frame(&self, connection_id: ConnectionId, frame: String);

    /// Whether the connection's transport is still open.
    fn is_connected(&self, _connection_id: &ConnectionId) -> bool {
        true
    }
}
