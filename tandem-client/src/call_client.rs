use tandem_core::RoomId;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::channel::SignalingChannel;
use crate::config::ClientConfig;
use crate::error::{ChannelError, NegotiationError};
use crate::negotiator::{Collaborators, NegotiationState, SessionNegotiator};
use crate::transport::TransportEvent;

#[derive(Debug)]
pub enum CallCommand {
    Join {
        room_id: RoomId,
        reply: oneshot::Sender<Result<(), NegotiationError>>,
    },
    HangUp {
        reply: oneshot::Sender<()>,
    },
}

/// UI-side handle to a running [`CallClient`].
#[derive(Debug, Clone)]
pub struct CallHandle {
    command_tx: mpsc::Sender<CallCommand>,
    state_rx: watch::Receiver<NegotiationState>,
}

impl CallHandle {
    pub async fn request_join(&self, room_id: impl Into<RoomId>) -> Result<(), NegotiationError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(CallCommand::Join {
                room_id: room_id.into(),
                reply,
            })
            .await
            .map_err(|_| ChannelError::Closed)?;
        rx.await.map_err(|_| ChannelError::Closed)?
    }

    /// Returns once the call is torn down.
    pub async fn hang_up(&self) {
        let (reply, rx) = oneshot::channel();
        if self
            .command_tx
            .send(CallCommand::HangUp { reply })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state_rx.borrow().clone()
    }

    /// Waits until the negotiation state satisfies `f`.
    pub async fn wait_for_state(
        &self,
        f: impl FnMut(&NegotiationState) -> bool,
    ) -> Option<NegotiationState> {
        let mut rx = self.state_rx.clone();
        let state = rx.wait_for(f).await.ok().map(|s| s.clone());
        state
    }
}

/// Drives one [`SessionNegotiator`] from relay messages, transport callbacks,
/// UI commands and the negotiation deadline.
pub struct CallClient {
    negotiator: SessionNegotiator,
    channel: SignalingChannel,
    event_rx: mpsc::Receiver<TransportEvent>,
    command_rx: mpsc::Receiver<CallCommand>,
}

impl CallClient {
    pub fn new(
        config: ClientConfig,
        channel: SignalingChannel,
        collaborators: Collaborators,
    ) -> (Self, CallHandle) {
        let (event_tx, event_rx) = mpsc::channel(config.transport_event_queue);
        let (command_tx, command_rx) = mpsc::channel(16);
        let negotiator = SessionNegotiator::new(config, channel.sender(), event_tx, collaborators);
        let handle = CallHandle {
            command_tx,
            state_rx: negotiator.subscribe(),
        };

        (
            Self {
                negotiator,
                channel,
                event_rx,
                command_rx,
            },
            handle,
        )
    }

    /// Runs until the relay connection closes or every handle is dropped.
    pub async fn run(mut self) {
        loop {
            let deadline = self.negotiator.negotiation_deadline();

            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(command) = command else {
                        debug!("All call handles dropped");
                        self.negotiator.hang_up().await;
                        break;
                    };
                    self.handle_command(command).await;
                }
                signal = self.channel.recv() => {
                    let Some(signal) = signal else {
                        self.negotiator.on_channel_closed().await;
                        break;
                    };
                    self.negotiator.handle_signal(signal).await;
                }
                Some(event) = self.event_rx.recv() => {
                    self.negotiator.handle_transport_event(event).await;
                }
                _ = wait_deadline(deadline) => {
                    self.negotiator.check_timeout().await;
                }
            }
        }
        info!("Call client stopped");
    }

    async fn handle_command(&mut self, command: CallCommand) {
        match command {
            CallCommand::Join { room_id, reply } => {
                let result = self.negotiator.request_join(room_id).await;
                let _ = reply.send(result);
            }
            CallCommand::HangUp { reply } => {
                self.negotiator.hang_up().await;
                let _ = reply.send(());
            }
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
