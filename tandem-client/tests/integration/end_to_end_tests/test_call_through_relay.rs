use std::sync::Arc;
use std::time::Duration;
use tandem_client::{
    CallClient, CallHandle, ClientConfig, Collaborators, LocationProvider, NegotiationState,
    SdpKind, SignalingChannel,
};
use tandem_core::IceServerConfig;
use tandem_core::utils::{DEFAULT_STUN_ADDR, SIGNALING_PATH};
use tandem_server::{DEFAULT_ROOM_QUEUE, SignalingService, router};

use crate::integration::init_tracing;
use crate::utils::{
    MockCapture, MockLocation, MockTransportFactory, Observed, RecordingObserver, TransportCall,
};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn_relay() -> String {
    let ice_servers = vec![IceServerConfig {
        urls: vec![DEFAULT_STUN_ADDR.to_owned()],
        username: None,
        credential: None,
    }];
    let app = router(SignalingService::new(ice_servers, DEFAULT_ROOM_QUEUE));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("ws://{}{}", addr, SIGNALING_PATH)
}

struct Peer {
    handle: CallHandle,
    transports: MockTransportFactory,
    observer: RecordingObserver,
}

async fn spawn_peer(url: &str, label: &str, location: Option<MockLocation>) -> Peer {
    let channel = SignalingChannel::connect(url).await.expect("connect");
    let transports = MockTransportFactory::new(label)
        .with_auto_track()
        .with_auto_candidates(2);
    let observer = RecordingObserver::default();
    let collaborators = Collaborators {
        transports: Arc::new(transports.clone()),
        capture: Arc::new(MockCapture::default()),
        location: location.map(|l| Arc::new(l) as Arc<dyn LocationProvider>),
        observer: Arc::new(observer.clone()),
    };
    let (client, handle) = CallClient::new(ClientConfig::default(), channel, collaborators);
    tokio::spawn(client.run());
    Peer {
        handle,
        transports,
        observer,
    }
}

async fn wait_state(peer: &Peer, f: impl FnMut(&NegotiationState) -> bool) -> NegotiationState {
    tokio::time::timeout(STEP_TIMEOUT, peer.handle.wait_for_state(f))
        .await
        .expect("Timeout waiting for state")
        .expect("Call client stopped")
}

async fn wait_observed(peer: &Peer, event: Observed) {
    let deadline = tokio::time::Instant::now() + STEP_TIMEOUT;
    while !peer.observer.contains(&event) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Timeout waiting for {event:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_two_peers_connect_and_hang_up() {
    init_tracing();

    let url = spawn_relay().await;
    let alice = spawn_peer(&url, "alice", Some(MockLocation::at(1.0, 2.0))).await;
    let bob = spawn_peer(&url, "bob", None).await;

    alice.handle.request_join("call-1").await.unwrap();
    wait_state(&alice, |s| matches!(s, NegotiationState::Answering { .. })).await;

    bob.handle.request_join("call-1").await.unwrap();
    wait_state(&bob, |s| matches!(s, NegotiationState::Connected { .. })).await;
    wait_state(&alice, |s| matches!(s, NegotiationState::Connected { .. })).await;

    let a = alice.transports.last();
    let b = bob.transports.last();

    // Descriptions arrive exactly as produced.
    assert_eq!(a.remote_sdp(), b.local_sdp());
    assert_eq!(b.remote_sdp(), a.local_sdp());
    assert!(matches!(
        a.calls().first(),
        Some(TransportCall::SetRemote(SdpKind::Offer, _))
    ));

    wait_observed(&bob, Observed::Location("Lat: 1, Lng: 2".into())).await;
    assert!(alice.observer.events().iter().all(|e| !matches!(e, Observed::Location(_))));

    // Each side applies both of the other's candidates.
    let deadline = tokio::time::Instant::now() + STEP_TIMEOUT;
    while a.applied_candidates().len() < 2 || b.applied_candidates().len() < 2 {
        assert!(tokio::time::Instant::now() < deadline, "candidates not applied");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    alice.handle.hang_up().await;
    assert_eq!(alice.handle.state(), NegotiationState::Closed);
    assert!(a.is_closed());

    wait_observed(&bob, Observed::PeerLeft).await;
    assert!(b.is_closed());
    assert_eq!(bob.handle.state(), NegotiationState::Closed);
}

#[tokio::test]
async fn test_third_peer_is_told_the_room_is_full() {
    init_tracing();

    let url = spawn_relay().await;
    let alice = spawn_peer(&url, "alice", None).await;
    let bob = spawn_peer(&url, "bob", None).await;
    let carol = spawn_peer(&url, "carol", None).await;

    alice.handle.request_join("call-1").await.unwrap();
    wait_state(&alice, |s| matches!(s, NegotiationState::Answering { .. })).await;
    bob.handle.request_join("call-1").await.unwrap();
    wait_state(&bob, |s| matches!(s, NegotiationState::Connected { .. })).await;

    carol.handle.request_join("call-1").await.unwrap();
    wait_observed(&carol, Observed::RoomFull("call-1".into())).await;

    assert_eq!(carol.handle.state(), NegotiationState::Idle);
    assert!(carol.transports.created().is_empty());
}
