use tandem_core::{ConnectionId, JoinOutcome, RoomId};

use crate::integration::{create_test_manager, init_tracing};
use crate::utils::wait_until;

#[tokio::test]
async fn test_room_is_destroyed_when_last_member_leaves() {
    init_tracing();

    let (manager, signaling, _rx) = create_test_manager();
    let room = RoomId::from("ephemeral");

    let a = ConnectionId::new();
    let b = ConnectionId::new();
    manager.join(a, room.clone()).await;
    manager.join(b, room.clone()).await;
    assert_eq!(manager.room_count(), 1);

    manager.leave(a, &room).await;
    manager.disconnect(b).await;

    assert!(
        wait_until(|| async { manager.room_count() == 0 }).await,
        "empty room should unregister itself"
    );
    assert_eq!(signaling.peer_left_count(&b).await, 1);

    // The id is free again: the next arrival creates a fresh room.
    let c = ConnectionId::new();
    assert_eq!(manager.join(c, room.clone()).await, JoinOutcome::Created);
    assert_eq!(manager.members(&room).await, vec![c]);
}

#[tokio::test]
async fn test_join_racing_room_teardown_lands_in_fresh_room() {
    init_tracing();

    let (manager, _signaling, _rx) = create_test_manager();
    let room = RoomId::from("churn");

    for _ in 0..50 {
        let a = ConnectionId::new();
        assert_eq!(manager.join(a, room.clone()).await, JoinOutcome::Created);

        let leaving = {
            let manager = manager.clone();
            let room = room.clone();
            tokio::spawn(async move { manager.leave(a, &room).await })
        };
        let b = ConnectionId::new();
        let outcome = manager.join(b, room.clone()).await;
        leaving.await.expect("leave task panicked");

        assert!(
            matches!(outcome, JoinOutcome::Created | JoinOutcome::Joined),
            "unexpected {outcome:?}"
        );
        manager.leave(b, &room).await;
        assert!(wait_until(|| async { manager.room_count() == 0 }).await);
    }
}
