use anyhow::Result;
use async_trait::async_trait;
use tandem_core::{IceCandidate, IceServerConfig};
use tokio::sync::mpsc;

use crate::collaborators::LocalMedia;
use crate::transport::transport_event::{CallId, TransportEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// One media peer connection, as seen by the negotiator.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<String>;

    async fn create_answer(&self) -> Result<String>;

    async fn set_local_description(&self, kind: SdpKind, sdp: String) -> Result<()>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds a fresh transport for every call. Transports are never reused.
#[async_trait]
pub trait PeerTransportFactory: Send + Sync {
    async fn create(
        &self,
        call_id: CallId,
        ice_servers: &[IceServerConfig],
        local_media: &LocalMedia,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>>;
}
