use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tandem_core::{IceServerConfig, RoomId, SignalMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::signal_helpers::SIGNAL_TIMEOUT_MS;

/// Raw WebSocket client speaking the signaling protocol to a running relay.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// ICE servers announced by the relay right after the upgrade.
    pub ice_servers: Vec<IceServerConfig>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .context("Failed to connect to relay")?;
        let mut client = Self {
            ws,
            ice_servers: Vec::new(),
        };

        match client.recv_signal().await? {
            SignalMessage::IceServers { ice_servers } => client.ice_servers = ice_servers,
            other => anyhow::bail!("Expected ice-servers first, got {}", other.kind()),
        }
        Ok(client)
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send frame")
    }

    pub async fn join(&mut self, room: &str) -> Result<SignalMessage> {
        self.send(&SignalMessage::Join {
            room_id: RoomId::from(room),
        })
        .await?;
        self.recv_signal().await
    }

    /// Next text frame, exactly as received.
    pub async fn recv_text(&mut self) -> Result<String> {
        let deadline = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let next = tokio::time::timeout(deadline, self.ws.next())
                .await
                .context("Timeout waiting for frame")?;
            match next {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(_))) | None => anyhow::bail!("Connection closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("WebSocket error"),
            }
        }
    }

    pub async fn recv_signal(&mut self) -> Result<SignalMessage> {
        let text = self.recv_text().await?;
        serde_json::from_str(&text).with_context(|| format!("Invalid frame: {text}"))
    }

    /// Asserts nothing arrives within `millis`.
    pub async fn expect_silence(&mut self, millis: u64) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(millis), self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => anyhow::bail!("Unexpected frame: {}", text.as_str()),
            Ok(_) => Ok(()),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close")?;
        Ok(())
    }

    /// Drops the TCP stream without a close handshake.
    pub fn abort(self) {
        drop(self.ws);
    }
}
