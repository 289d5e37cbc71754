use tandem_core::SignalMessage;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{NegotiationState, SessionNegotiator};
use crate::error::{NegotiationError, NegotiationStep};
use crate::transport::TransportEvent;

impl SessionNegotiator {
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.current_call() != Some(event.call_id()) {
            debug!("Dropping event from closed {}", event.call_id());
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(_, candidate) => {
                // Local candidates go out as soon as they exist.
                if let Some(room_id) = self.state.room_id().cloned() {
                    self.send(SignalMessage::Candidate { candidate, room_id });
                }
            }
            TransportEvent::RemoteTrack(_, media) => {
                info!("Remote {} track available", media.kind);
                self.remote_media = Some(media.clone());
                if self.state.is_negotiating() && self.candidates.is_ready() {
                    if let Some(room_id) = self.state.room_id().cloned() {
                        self.transition(NegotiationState::Connected { room_id });
                    }
                }
                self.collaborators
                    .observer
                    .on_remote_media_available(media)
                    .await;
            }
            TransportEvent::PeerConnected(_) => {
                // Receive-only calls may never see a remote track.
                if self.state.is_negotiating() && self.candidates.is_ready() {
                    if let Some(room_id) = self.state.room_id().cloned() {
                        info!("Peer connection established for {}", room_id);
                        self.transition(NegotiationState::Connected { room_id });
                    }
                }
            }
            TransportEvent::ConnectionFailed(_, reason) => {
                self.fail(NegotiationError::Transport {
                    step: NegotiationStep::Connection,
                    reason,
                })
                .await;
            }
        }
    }

    /// Fails the call if the offer/answer exchange outlived its deadline.
    pub async fn check_timeout(&mut self) {
        let Some(deadline) = self.negotiation_deadline() else {
            return;
        };
        if Instant::now() < deadline {
            return;
        }
        if let Some(room_id) = self.state.room_id().cloned() {
            self.fail(NegotiationError::Timeout {
                room_id,
                timeout: self.config.negotiation_timeout,
            })
            .await;
        }
    }
}
