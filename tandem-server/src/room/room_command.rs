use tandem_core::{ConnectionId, JoinOutcome};
use tokio::sync::oneshot;

/// Commands delivered to a room actor by the [`RoomManager`](crate::RoomManager).
#[derive(Debug)]
pub enum RoomCommand {
    /// Admission request. The outcome is reported through `reply`.
    Join {
        connection_id: ConnectionId,
        reply: oneshot::Sender<JoinOutcome>,
    },

    /// Explicit departure, or an implicit one caused by the transport closing.
    Leave { connection_id: ConnectionId },

    /// Raw signaling frame to hand to every other member untouched.
    Relay { sender: ConnectionId, frame: String },

    /// Snapshot of the current members, in arrival order.
    Members {
        reply: oneshot::Sender<Vec<ConnectionId>>,
    },
}
