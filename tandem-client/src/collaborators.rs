use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tandem_core::RoomId;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::error::{CaptureError, LocationError, NegotiationError};

/// Captured camera/microphone tracks attached to every new peer connection.
#[derive(Clone)]
pub struct LocalMedia {
    pub id: String,
    pub tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl LocalMedia {
    /// No outgoing tracks; the peer connection only receives.
    pub fn receive_only() -> Self {
        Self {
            id: "receive-only".to_string(),
            tracks: Vec::new(),
        }
    }
}

impl fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMedia")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

/// Inbound track surfaced to the UI.
#[derive(Clone)]
pub struct RemoteMedia {
    pub stream_id: String,
    pub track_id: String,
    pub kind: String,
    pub track: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMedia")
            .field("stream_id", &self.stream_id)
            .field("track_id", &self.track_id)
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat: {}, Lng: {}", self.latitude, self.longitude)
    }
}

#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn acquire_local_media(&self) -> Result<LocalMedia, CaptureError>;

    /// Stops the tracks of a stream returned by `acquire_local_media`.
    async fn release_local_media(&self, _media: LocalMedia) {}
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn lookup_once(
        &self,
        timeout: Duration,
        max_age: Duration,
    ) -> Result<Coordinates, LocationError>;
}

/// UI-facing notifications. Invoked from the call driver task.
#[async_trait]
pub trait CallObserver: Send + Sync {
    async fn on_remote_media_available(&self, media: RemoteMedia);

    async fn on_remote_media_cleared(&self) {}

    async fn on_location_received(&self, location: String);

    async fn on_peer_left(&self);

    async fn on_room_full(&self, room_id: RoomId);

    async fn on_call_failed(&self, error: &NegotiationError);
}

/// Capture source for peers that only watch.
pub struct NoCapture;

#[async_trait]
impl CaptureSource for NoCapture {
    async fn acquire_local_media(&self) -> Result<LocalMedia, CaptureError> {
        Ok(LocalMedia::receive_only())
    }
}

/// Location provider backed by a fixed fix, e.g. from a command-line flag.
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn lookup_once(
        &self,
        _timeout: Duration,
        _max_age: Duration,
    ) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}
