use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Connectivity candidate as produced by the peer connection, plus its media line hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

/// Every frame exchanged over the signaling WebSocket, in either direction.
///
/// Encoded as JSON with a `type` discriminator, so `Offer` reads
/// `{"type":"offer","sdp":"...","roomId":"..."}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    Join {
        room_id: RoomId,
    },
    RoomCreated {
        room_id: RoomId,
    },
    RoomJoined {
        room_id: RoomId,
    },
    RoomFull {
        room_id: RoomId,
    },
    Offer {
        sdp: String,
        room_id: RoomId,
    },
    Answer {
        sdp: String,
        room_id: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },
    Candidate {
        #[serde(flatten)]
        candidate: IceCandidate,
        room_id: RoomId,
    },
    Leave {
        room_id: RoomId,
    },
    PeerLeft,
    IceServers {
        ice_servers: Vec<IceServerConfig>,
    },
}

impl SignalMessage {
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            SignalMessage::Join { room_id }
            | SignalMessage::RoomCreated { room_id }
            | SignalMessage::RoomJoined { room_id }
            | SignalMessage::RoomFull { room_id }
            | SignalMessage::Offer { room_id, .. }
            | SignalMessage::Answer { room_id, .. }
            | SignalMessage::Candidate { room_id, .. }
            | SignalMessage::Leave { room_id } => Some(room_id),
            SignalMessage::PeerLeft | SignalMessage::IceServers { .. } => None,
        }
    }

    /// Messages the relay forwards between room members without looking inside.
    pub fn is_peer_signal(&self) -> bool {
        matches!(
            self,
            SignalMessage::Offer { .. }
                | SignalMessage::Answer { .. }
                | SignalMessage::Candidate { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::Join { .. } => "join",
            SignalMessage::RoomCreated { .. } => "room-created",
            SignalMessage::RoomJoined { .. } => "room-joined",
            SignalMessage::RoomFull { .. } => "room-full",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::Candidate { .. } => "candidate",
            SignalMessage::Leave { .. } => "leave",
            SignalMessage::PeerLeft => "peer-left",
            SignalMessage::IceServers { .. } => "ice-servers",
        }
    }
}
