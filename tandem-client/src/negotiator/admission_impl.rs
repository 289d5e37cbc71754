use tandem_core::{RoomId, SignalMessage};
use tracing::{info, warn};

use super::{NegotiationSession, NegotiationState, Role, SessionNegotiator};
use crate::collaborators::LocalMedia;
use crate::error::{NegotiationError, NegotiationStep};
use crate::transport::SdpKind;

impl SessionNegotiator {
    /// Asks the relay to admit this peer into `room_id`.
    ///
    /// Local media is acquired first; if that fails no join is sent.
    pub async fn request_join(&mut self, room_id: RoomId) -> Result<(), NegotiationError> {
        if let Some(current) = self.state.room_id() {
            return Err(NegotiationError::Busy {
                room_id: current.clone(),
            });
        }

        if self.local_media.is_none() {
            match self.collaborators.capture.acquire_local_media().await {
                Ok(media) => {
                    info!("Acquired local media {}", media.id);
                    self.local_media = Some(media);
                }
                Err(e) => {
                    let err = NegotiationError::from(e);
                    warn!("Cannot join {}: {}", room_id, err);
                    self.collaborators.observer.on_call_failed(&err).await;
                    return Err(err);
                }
            }
        }

        self.candidates.reset();
        self.remote_media = None;
        self.outbound.send(SignalMessage::Join {
            room_id: room_id.clone(),
        })?;
        info!("Requested to join room {}", room_id);
        self.transition(NegotiationState::AwaitingAdmission { room_id });
        Ok(())
    }

    /// Relay admitted us. The room creator answers, the second peer offers.
    pub(super) async fn on_admitted(&mut self, room_id: RoomId, role: Role) {
        if !matches!(&self.state, NegotiationState::AwaitingAdmission { room_id: r } if *r == room_id)
        {
            warn!(
                "Ignoring admission to {} while {}",
                room_id,
                self.state.name()
            );
            return;
        }

        if let Err(err) = self.open_session(&room_id, role).await {
            self.fail(err).await;
            return;
        }

        match role {
            Role::Answerer => {
                info!("Created room {}, waiting for an offer", room_id);
                self.transition(NegotiationState::Answering { room_id });
            }
            Role::Offerer => {
                info!("Joined room {}, sending offer", room_id);
                self.transition(NegotiationState::Offering {
                    room_id: room_id.clone(),
                });
                if let Err(err) = self.send_offer(room_id).await {
                    self.fail(err).await;
                }
            }
            Role::Unassigned => {}
        }
    }

    pub(super) async fn on_room_full(&mut self, room_id: RoomId) {
        if !matches!(&self.state, NegotiationState::AwaitingAdmission { room_id: r } if *r == room_id)
        {
            warn!("Ignoring room-full for {} while {}", room_id, self.state.name());
            return;
        }
        info!("Room {} is full", room_id);
        self.transition(NegotiationState::Idle);
        self.collaborators.observer.on_room_full(room_id).await;
    }

    async fn open_session(&mut self, room_id: &RoomId, role: Role) -> Result<(), NegotiationError> {
        let call_id = self.allocate_call_id();
        let local_media = self
            .local_media
            .clone()
            .unwrap_or_else(LocalMedia::receive_only);
        let transport = self
            .collaborators
            .transports
            .create(call_id, &self.ice_servers, &local_media, self.event_tx.clone())
            .await
            .map_err(|e| NegotiationError::transport(NegotiationStep::CreatePeerConnection, e))?;

        info!("Opened {} for room {} as {:?}", call_id, room_id, role);
        self.session = Some(NegotiationSession {
            call_id,
            role,
            transport,
            deadline: None,
        });
        Ok(())
    }

    async fn send_offer(&mut self, room_id: RoomId) -> Result<(), NegotiationError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let sdp = session
            .transport
            .create_offer()
            .await
            .map_err(|e| NegotiationError::transport(NegotiationStep::CreateOffer, e))?;
        session
            .transport
            .set_local_description(SdpKind::Offer, sdp.clone())
            .await
            .map_err(|e| NegotiationError::transport(NegotiationStep::SetLocalDescription, e))?;
        self.send(SignalMessage::Offer { sdp, room_id });
        self.arm_deadline();
        Ok(())
    }
}
