use std::time::Duration;
use tandem_client::{ClientConfig, LocationError, NegotiationState, Role, SdpKind};
use tandem_core::{RoomId, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{Harness, MockLocation, TransportCall};

const REMOTE_OFFER: &str = "v=0\r\no=remote 7 0 IN IP4 10.0.0.9\r\ns=offer\r\n";

fn offer(room: &str) -> SignalMessage {
    SignalMessage::Offer {
        sdp: REMOTE_OFFER.into(),
        room_id: RoomId::from(room),
    }
}

fn answer_location(sent: &[SignalMessage]) -> Option<Option<String>> {
    sent.iter().find_map(|m| match m {
        SignalMessage::Answer { location, .. } => Some(location.clone()),
        _ => None,
    })
}

#[tokio::test]
async fn test_room_creator_waits_then_answers_with_location() {
    init_tracing();

    let mut h = Harness::new();
    let room = RoomId::from("call-1");

    h.negotiator.request_join(room.clone()).await.unwrap();
    assert_eq!(
        h.sent(),
        vec![SignalMessage::Join {
            room_id: room.clone()
        }]
    );
    assert_eq!(
        h.negotiator.state(),
        &NegotiationState::AwaitingAdmission {
            room_id: room.clone()
        }
    );
    assert_eq!(h.negotiator.role(), Role::Unassigned);
    assert!(h.transports.created().is_empty());

    h.deliver(SignalMessage::RoomCreated {
        room_id: room.clone(),
    })
    .await;
    assert_eq!(
        h.negotiator.state(),
        &NegotiationState::Answering {
            room_id: room.clone()
        }
    );
    assert_eq!(h.negotiator.role(), Role::Answerer);
    assert!(h.sent().is_empty(), "answerer must not offer");

    h.deliver(offer("call-1")).await;

    let transport = h.transports.last();
    let answer_sdp = transport.local_sdp().unwrap();
    assert_eq!(
        transport.calls(),
        vec![
            TransportCall::SetRemote(SdpKind::Offer, REMOTE_OFFER.into()),
            TransportCall::CreateAnswer,
            TransportCall::SetLocal(SdpKind::Answer, answer_sdp.clone()),
        ]
    );
    assert_eq!(
        h.sent(),
        vec![SignalMessage::Answer {
            sdp: answer_sdp,
            room_id: room,
            location: Some("Lat: 1, Lng: 2".into()),
        }]
    );
    assert!(h.negotiator.remote_description_applied());
}

#[tokio::test]
async fn test_answer_sent_without_location_when_lookup_fails() {
    init_tracing();

    let mut h = Harness::builder()
        .location(MockLocation::failing(LocationError::PermissionDenied))
        .build();
    h.join_as_answerer("call-1").await;
    h.deliver(offer("call-1")).await;

    assert_eq!(answer_location(&h.sent()), Some(None));
    assert!(h.observer.failures().is_empty());
}

#[tokio::test]
async fn test_answer_sent_without_location_provider() {
    init_tracing();

    let mut h = Harness::builder().without_location().build();
    h.join_as_answerer("call-1").await;
    h.deliver(offer("call-1")).await;

    assert_eq!(answer_location(&h.sent()), Some(None));
}

#[tokio::test(start_paused = true)]
async fn test_slow_location_lookup_is_bounded() {
    init_tracing();

    let config = ClientConfig {
        location_timeout: Duration::from_secs(15),
        ..Default::default()
    };
    let mut h = Harness::builder()
        .config(config)
        .location(MockLocation::hanging())
        .build();
    h.join_as_answerer("call-1").await;

    let started = tokio::time::Instant::now();
    h.deliver(offer("call-1")).await;

    assert_eq!(answer_location(&h.sent()), Some(None));
    assert!(started.elapsed() < Duration::from_secs(16));
}

#[tokio::test]
async fn test_second_offer_is_ignored() {
    init_tracing();

    let mut h = Harness::new();
    h.join_as_answerer("call-1").await;
    h.deliver(offer("call-1")).await;
    h.sent();
    let calls = h.transports.last().calls().len();

    h.deliver(offer("call-1")).await;

    assert!(h.sent().is_empty());
    assert_eq!(h.transports.last().calls().len(), calls);
}

#[tokio::test]
async fn test_offer_for_another_room_is_ignored() {
    init_tracing();

    let mut h = Harness::new();
    h.join_as_answerer("call-1").await;
    h.deliver(offer("elsewhere")).await;

    assert!(h.sent().is_empty());
    assert!(h.transports.last().calls().is_empty());
    assert!(!h.negotiator.remote_description_applied());
}

#[tokio::test]
async fn test_relay_ice_servers_used_for_peer_connection() {
    init_tracing();

    let mut h = Harness::new();
    let announced = vec![tandem_core::IceServerConfig {
        urls: vec!["turn:turn.example.org:3478".into()],
        username: Some("u".into()),
        credential: Some("p".into()),
    }];
    h.deliver(SignalMessage::IceServers {
        ice_servers: announced.clone(),
    })
    .await;
    h.join_as_answerer("call-1").await;

    assert_eq!(h.transports.ice_servers_seen(), vec![announced]);
}
