mod admission_impl;
mod handle_signal_impl;
mod handle_transport_impl;
mod hang_up_impl;

use std::sync::Arc;
use tandem_core::{IceServerConfig, RoomId, SignalMessage};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::candidate_buffer::CandidateBuffer;
use crate::channel::SignalingSender;
use crate::collaborators::{CallObserver, CaptureSource, LocalMedia, LocationProvider, RemoteMedia};
use crate::config::ClientConfig;
use crate::transport::{CallId, PeerTransport, PeerTransportFactory, TransportEvent};

/// Where the local peer stands in the current call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    /// No call requested yet
    Idle,
    /// Join sent, waiting for the relay's verdict
    AwaitingAdmission { room_id: RoomId },
    /// Second into the room; offer sent, waiting for the answer
    Offering { room_id: RoomId },
    /// First into the room; waiting for the offer
    Answering { room_id: RoomId },
    /// Remote media is flowing
    Connected { room_id: RoomId },
    /// Call torn down; a new join may be requested
    Closed,
}

impl NegotiationState {
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            NegotiationState::AwaitingAdmission { room_id }
            | NegotiationState::Offering { room_id }
            | NegotiationState::Answering { room_id }
            | NegotiationState::Connected { room_id } => Some(room_id),
            NegotiationState::Idle | NegotiationState::Closed => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.room_id().is_some()
    }

    pub fn is_negotiating(&self) -> bool {
        matches!(
            self,
            NegotiationState::Offering { .. } | NegotiationState::Answering { .. }
        )
    }

    pub fn can_transition_to(&self, next: &NegotiationState) -> bool {
        use NegotiationState::*;
        match (self, next) {
            (_, Closed) => true,
            (Idle | Closed, AwaitingAdmission { .. }) => true,
            (AwaitingAdmission { .. }, Offering { .. } | Answering { .. } | Idle) => true,
            (Offering { .. } | Answering { .. }, Connected { .. }) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NegotiationState::Idle => "idle",
            NegotiationState::AwaitingAdmission { .. } => "awaiting-admission",
            NegotiationState::Offering { .. } => "offering",
            NegotiationState::Answering { .. } => "answering",
            NegotiationState::Connected { .. } => "connected",
            NegotiationState::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unassigned,
    /// Joined second; creates the offer
    Offerer,
    /// Created the room; answers
    Answerer,
}

/// External capabilities the negotiator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub transports: Arc<dyn PeerTransportFactory>,
    pub capture: Arc<dyn CaptureSource>,
    pub location: Option<Arc<dyn LocationProvider>>,
    pub observer: Arc<dyn CallObserver>,
}

struct NegotiationSession {
    call_id: CallId,
    role: Role,
    transport: Box<dyn PeerTransport>,
    /// Set while the offer/answer exchange is in flight.
    deadline: Option<Instant>,
}

/// Client side of one call: admission, offer/answer, candidate exchange and teardown.
///
/// All methods run on the call driver task; inbound signals, transport events
/// and UI commands are handled one at a time.
pub struct SessionNegotiator {
    config: ClientConfig,
    state: NegotiationState,
    state_tx: watch::Sender<NegotiationState>,
    session: Option<NegotiationSession>,
    candidates: CandidateBuffer,
    ice_servers: Vec<IceServerConfig>,
    local_media: Option<LocalMedia>,
    remote_media: Option<RemoteMedia>,
    outbound: SignalingSender,
    event_tx: mpsc::Sender<TransportEvent>,
    collaborators: Collaborators,
    next_call: u64,
}

impl SessionNegotiator {
    pub fn new(
        config: ClientConfig,
        outbound: SignalingSender,
        event_tx: mpsc::Sender<TransportEvent>,
        collaborators: Collaborators,
    ) -> Self {
        let (state_tx, _) = watch::channel(NegotiationState::Idle);
        Self {
            ice_servers: config.ice_servers.clone(),
            config,
            state: NegotiationState::Idle,
            state_tx,
            session: None,
            candidates: CandidateBuffer::new(),
            local_media: None,
            remote_media: None,
            outbound,
            event_tx,
            collaborators,
            next_call: 0,
        }
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<NegotiationState> {
        self.state_tx.subscribe()
    }

    pub fn role(&self) -> Role {
        self.session
            .as_ref()
            .map(|s| s.role)
            .unwrap_or(Role::Unassigned)
    }

    pub fn current_call(&self) -> Option<CallId> {
        self.session.as_ref().map(|s| s.call_id)
    }

    pub fn remote_description_applied(&self) -> bool {
        self.candidates.is_ready()
    }

    pub fn pending_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn has_local_media(&self) -> bool {
        self.local_media.is_some()
    }

    pub fn remote_media(&self) -> Option<&RemoteMedia> {
        self.remote_media.as_ref()
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    /// When the in-flight offer/answer exchange times out, if one is running.
    pub fn negotiation_deadline(&self) -> Option<Instant> {
        if !self.state.is_negotiating() {
            return None;
        }
        self.session.as_ref().and_then(|s| s.deadline)
    }

    fn transition(&mut self, next: NegotiationState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "{} -> {}",
            self.state.name(),
            next.name()
        );
        debug!("Negotiation {} -> {}", self.state.name(), next.name());
        self.state = next.clone();
        self.state_tx.send_replace(next);
    }

    fn send(&self, msg: SignalMessage) {
        let kind = msg.kind();
        if let Err(e) = self.outbound.send(msg) {
            error!("Failed to send {}: {}", kind, e);
        }
    }

    fn arm_deadline(&mut self) {
        let timeout = self.config.negotiation_timeout;
        if let Some(session) = self.session.as_mut() {
            session.deadline = Some(Instant::now() + timeout);
        }
    }

    fn disarm_deadline(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.deadline = None;
        }
    }

    fn allocate_call_id(&mut self) -> CallId {
        self.next_call += 1;
        CallId(self.next_call)
    }

    /// The active room, if `room_id` is it.
    fn is_current_room(&self, room_id: &RoomId) -> bool {
        self.state.room_id() == Some(room_id)
    }
}
