use tandem_core::{IceCandidate, RoomId, SignalMessage};
use tracing::{debug, info, warn};

use super::{NegotiationState, Role, SessionNegotiator};
use crate::candidate_buffer::Admission;
use crate::error::{NegotiationError, NegotiationStep};
use crate::transport::SdpKind;

impl SessionNegotiator {
    /// Routes one message from the relay.
    pub async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::IceServers { ice_servers } => {
                info!("Relay announced {} ICE server(s)", ice_servers.len());
                self.ice_servers = ice_servers;
            }
            SignalMessage::RoomCreated { room_id } => self.on_admitted(room_id, Role::Answerer).await,
            SignalMessage::RoomJoined { room_id } => self.on_admitted(room_id, Role::Offerer).await,
            SignalMessage::RoomFull { room_id } => self.on_room_full(room_id).await,
            SignalMessage::Offer { sdp, room_id } => self.on_remote_offer(room_id, sdp).await,
            SignalMessage::Answer {
                sdp,
                room_id,
                location,
            } => self.on_remote_answer(room_id, sdp, location).await,
            SignalMessage::Candidate { candidate, room_id } => {
                self.on_remote_candidate(room_id, candidate).await
            }
            SignalMessage::PeerLeft => self.on_peer_left().await,
            other @ (SignalMessage::Join { .. } | SignalMessage::Leave { .. }) => {
                warn!("Unexpected {} from relay", other.kind());
            }
        }
    }

    async fn on_remote_offer(&mut self, room_id: RoomId, sdp: String) {
        let expected = matches!(&self.state, NegotiationState::Answering { room_id: r } if *r == room_id);
        if !expected || self.candidates.is_ready() {
            warn!("Ignoring offer for {} while {}", room_id, self.state.name());
            return;
        }

        self.arm_deadline();
        if let Err(err) = self.answer_offer(room_id, sdp).await {
            self.fail(err).await;
        }
    }

    async fn answer_offer(&mut self, room_id: RoomId, sdp: String) -> Result<(), NegotiationError> {
        self.install_remote_description(SdpKind::Offer, sdp).await?;

        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let answer = session
            .transport
            .create_answer()
            .await
            .map_err(|e| NegotiationError::transport(NegotiationStep::CreateAnswer, e))?;
        session
            .transport
            .set_local_description(SdpKind::Answer, answer.clone())
            .await
            .map_err(|e| NegotiationError::transport(NegotiationStep::SetLocalDescription, e))?;

        let location = self.lookup_location().await;
        self.send(SignalMessage::Answer {
            sdp: answer,
            room_id,
            location,
        });
        self.disarm_deadline();
        Ok(())
    }

    async fn on_remote_answer(&mut self, room_id: RoomId, sdp: String, location: Option<String>) {
        let expected = matches!(&self.state, NegotiationState::Offering { room_id: r } if *r == room_id);
        if !expected || self.candidates.is_ready() {
            warn!("Ignoring answer for {} while {}", room_id, self.state.name());
            return;
        }

        if let Err(err) = self.install_remote_description(SdpKind::Answer, sdp).await {
            self.fail(err).await;
            return;
        }
        self.disarm_deadline();
        if let Some(location) = location {
            info!("Peer shared location: {}", location);
            self.collaborators
                .observer
                .on_location_received(location)
                .await;
        }
    }

    async fn on_remote_candidate(&mut self, room_id: RoomId, candidate: IceCandidate) {
        if !self.is_current_room(&room_id) {
            debug!("Dropping stale candidate for {}", room_id);
            return;
        }

        match self.candidates.enqueue(candidate) {
            Admission::Buffered => {
                debug!(
                    "Buffered remote candidate ({} pending)",
                    self.candidates.len()
                );
            }
            Admission::Apply(candidate) => {
                if let Err(err) = self.apply_candidate(candidate).await {
                    self.fail(err).await;
                }
            }
        }
    }

    /// Installs the remote description, then applies every buffered candidate in arrival order.
    async fn install_remote_description(
        &mut self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), NegotiationError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        session
            .transport
            .set_remote_description(kind, sdp)
            .await
            .map_err(|e| NegotiationError::transport(NegotiationStep::SetRemoteDescription, e))?;

        let buffered = self.candidates.flush();
        if !buffered.is_empty() {
            debug!("Applying {} buffered candidate(s)", buffered.len());
        }
        for candidate in buffered {
            self.apply_candidate(candidate).await?;
        }
        Ok(())
    }

    async fn apply_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        session
            .transport
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| NegotiationError::transport(NegotiationStep::AddCandidate, e))
    }

    /// Best effort; a failed lookup only means the answer carries no location.
    async fn lookup_location(&self) -> Option<String> {
        let provider = self.collaborators.location.as_ref()?;
        let lookup = provider.lookup_once(self.config.location_timeout, self.config.location_max_age);
        match tokio::time::timeout(self.config.location_timeout, lookup).await {
            Ok(Ok(coordinates)) => Some(coordinates.to_string()),
            Ok(Err(e)) => {
                info!("Answering without location: {}", e);
                None
            }
            Err(_) => {
                info!("Answering without location: lookup timed out");
                None
            }
        }
    }
}
