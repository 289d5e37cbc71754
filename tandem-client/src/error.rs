use std::fmt;
use std::time::Duration;
use tandem_core::RoomId;
use thiserror::Error;

/// Step of the negotiation that talks to the peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    CreatePeerConnection,
    CreateOffer,
    CreateAnswer,
    SetLocalDescription,
    SetRemoteDescription,
    AddCandidate,
    Connection,
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationStep::CreatePeerConnection => "creating the peer connection",
            NegotiationStep::CreateOffer => "creating the offer",
            NegotiationStep::CreateAnswer => "creating the answer",
            NegotiationStep::SetLocalDescription => "installing the local description",
            NegotiationStep::SetRemoteDescription => "installing the remote description",
            NegotiationStep::AddCandidate => "applying a remote candidate",
            NegotiationStep::Connection => "connecting to the peer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NegotiationError {
    #[error("local media unavailable: {0}")]
    Capture(#[from] CaptureError),

    #[error("a call is already in progress in room {room_id}")]
    Busy { room_id: RoomId },

    #[error("failed {step}: {reason}")]
    Transport {
        step: NegotiationStep,
        reason: String,
    },

    #[error("negotiation in room {room_id} did not complete within {timeout:?}")]
    Timeout { room_id: RoomId, timeout: Duration },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl NegotiationError {
    pub(crate) fn transport(step: NegotiationStep, err: anyhow::Error) -> Self {
        NegotiationError::Transport {
            step,
            reason: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission to use the camera or microphone was denied")]
    PermissionDenied,
    #[error("no capture device: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location lookup timed out")]
    Timeout,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("failed to reach the signaling relay: {0}")]
    Connect(String),
    #[error("signaling channel is closed")]
    Closed,
}
