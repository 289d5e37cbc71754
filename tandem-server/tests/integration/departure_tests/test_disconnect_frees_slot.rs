use tandem_core::{RoomId, SignalMessage};

use crate::integration::{init_tracing, spawn_test_server};
use crate::utils::{TestClient, wait_until};

#[tokio::test]
async fn test_dropped_transport_triggers_peer_left() {
    init_tracing();

    let (url, service) = spawn_test_server().await;

    let mut a = TestClient::connect(&url).await.expect("A connect");
    let mut b = TestClient::connect(&url).await.expect("B connect");

    assert!(matches!(a.join("call-1").await.unwrap(), SignalMessage::RoomCreated { .. }));
    assert!(matches!(b.join("call-1").await.unwrap(), SignalMessage::RoomJoined { .. }));

    // A vanishes without sending leave.
    a.abort();

    assert_eq!(b.recv_signal().await.unwrap(), SignalMessage::PeerLeft);

    let room = RoomId::from("call-1");
    assert!(
        wait_until(|| async { service.rooms().members(&room).await.len() == 1 }).await,
        "A's slot should be released"
    );

    // The slot A held is available to a newcomer.
    let mut c = TestClient::connect(&url).await.expect("C connect");
    assert_eq!(
        c.join("call-1").await.unwrap(),
        SignalMessage::RoomJoined { room_id: room }
    );
}

#[tokio::test]
async fn test_survivor_can_join_a_new_room_on_same_connection() {
    init_tracing();

    let (url, service) = spawn_test_server().await;

    let mut a = TestClient::connect(&url).await.expect("A connect");
    let mut b = TestClient::connect(&url).await.expect("B connect");
    a.join("call-1").await.unwrap();
    b.join("call-1").await.unwrap();

    a.close().await.expect("close");
    assert_eq!(b.recv_signal().await.unwrap(), SignalMessage::PeerLeft);

    assert_eq!(
        b.join("call-2").await.unwrap(),
        SignalMessage::RoomCreated {
            room_id: RoomId::from("call-2")
        }
    );
    assert!(
        wait_until(|| async { service.rooms().members(&RoomId::from("call-1")).await.is_empty() })
            .await
    );
    assert!(wait_until(|| async { service.connection_count() == 1 }).await);
}
