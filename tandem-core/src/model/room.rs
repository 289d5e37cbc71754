use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::signaling::SignalMessage;

/// Client-supplied room code. Opaque to the relay.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an admission attempt.
///
/// The first member of a room becomes the answering party (`Created`), the second
/// one the offering party (`Joined`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Created,
    Joined,
    Full,
}

impl JoinOutcome {
    pub fn is_admitted(self) -> bool {
        !matches!(self, JoinOutcome::Full)
    }

    /// The relay reply announcing this outcome.
    pub fn into_message(self, room_id: RoomId) -> SignalMessage {
        match self {
            JoinOutcome::Created => SignalMessage::RoomCreated { room_id },
            JoinOutcome::Joined => SignalMessage::RoomJoined { room_id },
            JoinOutcome::Full => SignalMessage::RoomFull { room_id },
        }
    }
}
