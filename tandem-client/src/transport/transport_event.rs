use std::fmt;
use tandem_core::IceCandidate;

use crate::collaborators::RemoteMedia;

/// Identifies one peer connection. Events from a closed connection carry a
/// stale id and are dropped by the negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

/// Callbacks of the peer connection, funneled into the call driver loop.
#[derive(Debug)]
pub enum TransportEvent {
    CandidateGenerated(CallId, IceCandidate),
    RemoteTrack(CallId, RemoteMedia),
    PeerConnected(CallId),
    ConnectionFailed(CallId, String),
}

impl TransportEvent {
    pub fn call_id(&self) -> CallId {
        match self {
            TransportEvent::CandidateGenerated(id, _)
            | TransportEvent::RemoteTrack(id, _)
            | TransportEvent::PeerConnected(id)
            | TransportEvent::ConnectionFailed(id, _) => *id,
        }
    }
}
