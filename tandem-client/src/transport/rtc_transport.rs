use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{IceCandidate, IceServerConfig};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_remote::TrackRemote;

use crate::collaborators::{LocalMedia, RemoteMedia};
use crate::transport::peer_transport::{PeerTransport, PeerTransportFactory, SdpKind};
use crate::transport::transport_event::{CallId, TransportEvent};

/// `PeerTransport` backed by a `webrtc` peer connection.
pub struct RtcTransport {
    pub call_id: CallId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl RtcTransport {
    /// Builds the peer connection, attaches local tracks and wires its callbacks
    /// into `event_tx`.
    pub async fn new(
        call_id: CallId,
        ice_servers: &[IceServerConfig],
        local_media: &LocalMedia,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        for track in &local_media.tracks {
            peer_connection
                .add_track(Arc::clone(track))
                .await
                .context("Failed to attach local track")?;
        }
        if local_media.tracks.is_empty() {
            // Without local tracks the offer would carry no media sections.
            for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
                peer_connection
                    .add_transceiver_from_kind(
                        kind,
                        Some(RTCRtpTransceiverInit {
                            direction: RTCRtpTransceiverDirection::Recvonly,
                            send_encodings: vec![],
                        }),
                    )
                    .await?;
            }
        }

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed for {}: {:?}", call_id, s);
                    let event = match s {
                        RTCPeerConnectionState::Connected => TransportEvent::PeerConnected(call_id),
                        RTCPeerConnectionState::Failed => TransportEvent::ConnectionFailed(
                            call_id,
                            "peer connection failed".to_string(),
                        ),
                        _ => return,
                    };
                    let _ = tx.send(event).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let json = match candidate.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize local candidate for {}: {}", call_id, e);
                        return;
                    }
                };
                let candidate = IceCandidate {
                    candidate: json.candidate,
                    sdp_mid: json.sdp_mid,
                    sdp_m_line_index: json.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(call_id, candidate))
                    .await;
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let media = RemoteMedia {
                        stream_id: track.stream_id(),
                        track_id: track.id(),
                        kind: track.kind().to_string(),
                        track: Some(track),
                    };
                    debug!("Remote {} track arrived for {}", media.kind, call_id);
                    let _ = tx.send(TransportEvent::RemoteTrack(call_id, media)).await;
                })
            },
        ));

        Ok(Self {
            call_id,
            peer_connection,
        })
    }

    fn description(kind: SdpKind, sdp: String) -> Result<RTCSessionDescription> {
        let desc = match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
        };
        Ok(desc)
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(answer.sdp)
    }

    async fn set_local_description(&self, kind: SdpKind, sdp: String) -> Result<()> {
        let desc = Self::description(kind, sdp)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()> {
        let desc = Self::description(kind, sdp)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add remote ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates an [`RtcTransport`] per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RtcTransportFactory;

#[async_trait]
impl PeerTransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        call_id: CallId,
        ice_servers: &[IceServerConfig],
        local_media: &LocalMedia,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>> {
        let transport = RtcTransport::new(call_id, ice_servers, local_media, event_tx).await?;
        Ok(Box::new(transport))
    }
}
