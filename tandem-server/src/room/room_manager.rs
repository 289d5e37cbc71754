use crate::room::{Room, RoomCommand, RoomHandle};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tandem_core::{ConnectionId, JoinOutcome, RoomId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

pub const DEFAULT_ROOM_QUEUE: usize = 100;

/// Authority over room membership.
///
/// Rooms are created on the first join and destroyed once their last member is
/// gone. Each room runs as its own actor; this type only routes to them.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    memberships: Arc<DashMap<ConnectionId, RoomId>>,
    signaling: Arc<dyn SignalingOutput>,
    next_generation: Arc<AtomicU64>,
    queue_depth: usize,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>, queue_depth: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            signaling,
            next_generation: Arc::new(AtomicU64::new(0)),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Admits `connection_id` into `room_id`.
    ///
    /// A connection belongs to at most one room, so joining while already a member
    /// somewhere first leaves that room.
    pub async fn join(&self, connection_id: ConnectionId, room_id: RoomId) -> JoinOutcome {
        if let Some(current) = self.room_of(&connection_id) {
            info!(
                connection = %connection_id,
                from = %current,
                to = %room_id,
                "Connection switching rooms"
            );
            self.leave(connection_id, &current).await;
        }

        loop {
            let sender = self.get_room_sender(&room_id);
            let (reply_tx, reply_rx) = oneshot::channel();
            let cmd = RoomCommand::Join {
                connection_id,
                reply: reply_tx,
            };

            // Both failures mean the actor retired between lookup and delivery; it
            // has already unregistered itself, so the next lookup spawns a fresh room.
            if sender.send(cmd).await.is_err() {
                continue;
            }
            match reply_rx.await {
                Ok(outcome) => return outcome,
                Err(_) => continue,
            }
        }
    }

    /// Removes `connection_id` from `room_id` and tells the remaining member.
    /// A no-op for connections that are not members.
    pub async fn leave(&self, connection_id: ConnectionId, room_id: &RoomId) {
        let Some(sender) = self.existing_room_sender(room_id) else {
            debug!(room = %room_id, connection = %connection_id, "Leave for unknown room ignored");
            return;
        };
        let _ = sender.send(RoomCommand::Leave { connection_id }).await;
    }

    /// Transport closed without an explicit leave.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let Some(room_id) = self.room_of(&connection_id) else {
            return;
        };
        info!(connection = %connection_id, room = %room_id, "Disconnected member leaves room");
        self.leave(connection_id, &room_id).await;
    }

    /// Hands `frame` verbatim to every other member of `room_id`.
    pub async fn relay(&self, room_id: &RoomId, sender: ConnectionId, frame: String) {
        let Some(tx) = self.existing_room_sender(room_id) else {
            debug!(room = %room_id, connection = %sender, "Relay to unknown room dropped");
            return;
        };
        let _ = tx.send(RoomCommand::Relay { sender, frame }).await;
    }

    /// Current members of `room_id` in arrival order; empty if the room does not exist.
    pub async fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let Some(tx) = self.existing_room_sender(room_id) else {
            return Vec::new();
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        if tx.send(RoomCommand::Members { reply: reply_tx }).await.is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.memberships
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn existing_room_sender(&self, room_id: &RoomId) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(room_id).map(|handle| handle.tx.clone())
    }

    fn get_room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(entry) => entry.get().tx.clone(),
            Entry::Vacant(entry) => {
                info!(room = %room_id, "Creating new room");
                let (tx, rx) = mpsc::channel(self.queue_depth);
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

                let room = Room::new(
                    room_id.clone(),
                    generation,
                    rx,
                    self.signaling.clone(),
                    self.rooms.clone(),
                    self.memberships.clone(),
                );
                tokio::spawn(room.run());

                entry.insert(RoomHandle {
                    generation,
                    tx: tx.clone(),
                });
                tx
            }
        }
    }
}
