mod connection;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use room::{JoinOutcome, RoomId};
pub use signaling::{IceCandidate, IceServerConfig, SignalMessage};
