use tandem_core::SignalMessage;
use tracing::{info, warn};

use super::{NegotiationState, SessionNegotiator};
use crate::error::NegotiationError;

impl SessionNegotiator {
    /// Ends the call from any state. Also stops local capture.
    pub async fn hang_up(&mut self) {
        info!("Hanging up ({})", self.state.name());
        self.teardown(true).await;
        if let Some(media) = self.local_media.take() {
            self.collaborators.capture.release_local_media(media).await;
        }
    }

    /// The other member left. Local capture is kept for the next join.
    pub(super) async fn on_peer_left(&mut self) {
        if !self.state.is_active() {
            return;
        }
        info!("Peer left room");
        self.teardown(false).await;
        self.collaborators.observer.on_peer_left().await;
    }

    /// The relay connection is gone; nothing can be sent any more.
    pub async fn on_channel_closed(&mut self) {
        if self.state.is_active() {
            warn!("Signaling channel closed during {}", self.state.name());
        }
        self.teardown(false).await;
    }

    pub(super) async fn fail(&mut self, err: NegotiationError) {
        warn!("Call failed: {}", err);
        self.teardown(true).await;
        self.collaborators.observer.on_call_failed(&err).await;
    }

    /// Closes the peer connection and leaves the room, landing in `Closed`.
    async fn teardown(&mut self, send_leave: bool) {
        let room_id = self.state.room_id().cloned();

        if let Some(session) = self.session.take() {
            if let Err(e) = session.transport.close().await {
                warn!("Failed to close {}: {:#}", session.call_id, e);
            }
        }
        if send_leave {
            if let Some(room_id) = room_id {
                self.send(SignalMessage::Leave { room_id });
            }
        }
        self.candidates.reset();
        if self.remote_media.take().is_some() {
            self.collaborators.observer.on_remote_media_cleared().await;
        }
        self.transition(NegotiationState::Closed);
    }
}
