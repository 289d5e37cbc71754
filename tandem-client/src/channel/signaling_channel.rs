use futures::{SinkExt, StreamExt};
use tandem_core::SignalMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::ChannelError;

/// Cloneable handle for pushing messages to the relay.
#[derive(Debug, Clone)]
pub struct SignalingSender {
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl SignalingSender {
    pub fn new(tx: mpsc::UnboundedSender<SignalMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&self, msg: SignalMessage) -> Result<(), ChannelError> {
        self.tx.send(msg).map_err(|_| ChannelError::Closed)
    }
}

/// Bidirectional message channel to the relay.
///
/// Outbound messages are delivered in send order. `recv` returns `None` once
/// the relay connection is gone.
#[derive(Debug)]
pub struct SignalingChannel {
    sender: SignalingSender,
    inbound: mpsc::UnboundedReceiver<SignalMessage>,
}

impl SignalingChannel {
    pub fn from_parts(
        sender: SignalingSender,
        inbound: mpsc::UnboundedReceiver<SignalMessage>,
    ) -> Self {
        Self { sender, inbound }
    }

    /// Opens a WebSocket to `url` and pumps JSON frames in both directions.
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!("Connected to signaling relay at {}", url);

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<SignalMessage>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to encode {}: {}", msg.kind(), e);
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(Ok(frame)) = stream.next().await {
                match frame {
                    Message::Text(text) => {
                        match serde_json::from_str::<SignalMessage>(text.as_str()) {
                            Ok(msg) => {
                                debug!("Received {}", msg.kind());
                                if in_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Ignoring malformed frame from relay: {}", e),
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Signaling relay connection closed");
        });

        Ok(Self::from_parts(SignalingSender::new(out_tx), in_rx))
    }

    /// In-memory channel. Returns the channel plus the relay-side ends: what the
    /// client sends arrives on the receiver, what is pushed into the sender
    /// arrives at the client.
    pub fn in_memory() -> (
        Self,
        mpsc::UnboundedReceiver<SignalMessage>,
        mpsc::UnboundedSender<SignalMessage>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        (
            Self::from_parts(SignalingSender::new(out_tx), in_rx),
            out_rx,
            in_tx,
        )
    }

    pub fn sender(&self) -> SignalingSender {
        self.sender.clone()
    }

    pub fn send(&self, msg: SignalMessage) -> Result<(), ChannelError> {
        self.sender.send(msg)
    }

    pub async fn recv(&mut self) -> Option<SignalMessage> {
        self.inbound.recv().await
    }

    pub fn into_parts(self) -> (SignalingSender, mpsc::UnboundedReceiver<SignalMessage>) {
        (self.sender, self.inbound)
    }
}
