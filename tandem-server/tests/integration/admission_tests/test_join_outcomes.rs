use tandem_core::{ConnectionId, JoinOutcome, RoomId};

use crate::integration::{create_test_manager, init_tracing};

#[tokio::test]
async fn test_join_outcomes_follow_arrival_order() {
    init_tracing();

    let (manager, _signaling, _rx) = create_test_manager();
    let room = RoomId::from("call-1");

    let a = ConnectionId::new();
    let b = ConnectionId::new();
    let c = ConnectionId::new();

    assert_eq!(manager.join(a, room.clone()).await, JoinOutcome::Created);
    assert_eq!(manager.join(b, room.clone()).await, JoinOutcome::Joined);
    assert_eq!(manager.join(c, room.clone()).await, JoinOutcome::Full);

    assert_eq!(manager.members(&room).await, vec![a, b]);
    assert_eq!(manager.room_of(&a), Some(room.clone()));
    assert_eq!(manager.room_of(&b), Some(room.clone()));
    assert_eq!(manager.room_of(&c), None);
}

#[tokio::test]
async fn test_full_room_rejects_repeatedly_without_mutation() {
    init_tracing();

    let (manager, signaling, _rx) = create_test_manager();
    let room = RoomId::from("busy");

    let a = ConnectionId::new();
    let b = ConnectionId::new();
    manager.join(a, room.clone()).await;
    manager.join(b, room.clone()).await;

    for _ in 0..3 {
        let intruder = ConnectionId::new();
        assert_eq!(manager.join(intruder, room.clone()).await, JoinOutcome::Full);
    }

    assert_eq!(manager.members(&room).await, vec![a, b]);
    assert_eq!(signaling.peer_left_count(&a).await, 0);
    assert_eq!(signaling.peer_left_count(&b).await, 0);
}

#[tokio::test]
async fn test_unknown_room_has_no_members() {
    let (manager, _signaling, _rx) = create_test_manager();

    assert!(manager.members(&RoomId::from("nobody-here")).await.is_empty());
    assert_eq!(manager.room_count(), 0);
}
