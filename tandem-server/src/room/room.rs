use crate::room::room_command::RoomCommand;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::utils::ROOM_CAPACITY;
use tandem_core::{ConnectionId, JoinOutcome, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Registry entry pointing at a live room actor.
///
/// `generation` tells apart two actors that served the same room id one after
/// another, so a retiring actor never unregisters its successor.
#[derive(Clone)]
pub struct RoomHandle {
    pub(crate) generation: u64,
    pub(crate) tx: mpsc::Sender<RoomCommand>,
}

/// Actor owning the membership of one room.
///
/// Every mutation of the room goes through its command queue, so unrelated rooms
/// never wait on each other.
pub struct Room {
    room_id: RoomId,
    generation: u64,
    /// Members in arrival order. Never longer than [`ROOM_CAPACITY`].
    members: Vec<ConnectionId>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    registry: Arc<DashMap<RoomId, RoomHandle>>,
    memberships: Arc<DashMap<ConnectionId, RoomId>>,
}

impl Room {
    pub(crate) fn new(
        room_id: RoomId,
        generation: u64,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
        registry: Arc<DashMap<RoomId, RoomHandle>>,
        memberships: Arc<DashMap<ConnectionId, RoomId>>,
    ) -> Self {
        Self {
            room_id,
            generation,
            members: Vec::with_capacity(ROOM_CAPACITY),
            command_rx,
            signaling,
            registry,
            memberships,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.room_id, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;

            if self.members.is_empty() {
                self.retire();
                break;
            }
        }

        info!(room = %self.room_id, "Room event loop finished");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                connection_id,
                reply,
            } => {
                let outcome = self.admit(connection_id);
                let _ = reply.send(outcome);
            }

            RoomCommand::Leave { connection_id } => {
                self.remove_member(connection_id).await;
            }

            RoomCommand::Relay { sender, frame } => {
                if !self.members.contains(&sender) {
                    warn!(
                        room = %self.room_id,
                        connection = %sender,
                        "Dropping frame from a connection that is not a member"
                    );
                    return;
                }
                for recipient in self.members.iter().filter(|m| **m != sender) {
                    debug!(room = %self.room_id, from = %sender, to = %recipient, "Relaying frame");
                    self.signaling
                        .forward_frame(*recipient, frame.clone())
                        .await;
                }
            }

            RoomCommand::Members { reply } => {
                let _ = reply.send(self.members.clone());
            }
        }
    }

    fn admit(&mut self, connection_id: ConnectionId) -> JoinOutcome {
        let outcome = match self.members.len() {
            0 => JoinOutcome::Created,
            n if n < ROOM_CAPACITY => JoinOutcome::Joined,
            _ => {
                info!(
                    room = %self.room_id,
                    connection = %connection_id,
                    members = self.members.len(),
                    "Room is full, refusing join"
                );
                return JoinOutcome::Full;
            }
        };

        self.members.push(connection_id);
        self.memberships.insert(connection_id, self.room_id.clone());

        // Checked after the membership is recorded: socket cleanup unregisters
        // before it looks up the membership, so either it sees this slot or we
        // see the closed socket here.
        if !self.signaling.is_connected(&connection_id) {
            warn!(
                room = %self.room_id,
                connection = %connection_id,
                "Refusing join from a closed connection"
            );
            self.members.pop();
            self.memberships
                .remove_if(&connection_id, |_, room| *room == self.room_id);
            return JoinOutcome::Full;
        }

        info!(room = %self.room_id, connection = %connection_id, ?outcome, "Connection admitted");
        outcome
    }

    async fn remove_member(&mut self, connection_id: ConnectionId) {
        let Some(pos) = self.members.iter().position(|m| *m == connection_id) else {
            debug!(room = %self.room_id, connection = %connection_id, "Leave from non-member ignored");
            return;
        };
        self.members.remove(pos);
        self.memberships
            .remove_if(&connection_id, |_, room| *room == self.room_id);
        info!(room = %self.room_id, connection = %connection_id, "Connection left room");

        for remaining in &self.members {
            self.signaling
                .send_signal(*remaining, SignalMessage::PeerLeft)
                .await;
        }
    }

    /// Unregisters the room and answers whatever was still queued behind the last
    /// departure. Dropped join replies make the manager retry against a fresh room.
    fn retire(&mut self) {
        self.registry
            .remove_if(&self.room_id, |_, handle| handle.generation == self.generation);
        self.command_rx.close();

        while let Ok(cmd) = self.command_rx.try_recv() {
            match cmd {
                RoomCommand::Join { reply, .. } => drop(reply),
                RoomCommand::Members { reply } => {
                    let _ = reply.send(Vec::new());
                }
                RoomCommand::Leave { .. } | RoomCommand::Relay { .. } => {}
            }
        }

        info!(room = %self.room_id, "Room is empty, destroyed");
    }
}
