use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use std::sync::Arc;
use tandem_client::{
    CallClient, CallObserver, ClientConfig, Collaborators, Coordinates, FixedLocation,
    LocationProvider, NegotiationError, NegotiationState, NoCapture, RemoteMedia,
    RtcTransportFactory, SignalingChannel,
};
use tandem_core::RoomId;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tandem", version, about = "Two-party call client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room and wait for the other peer
    Join {
        /// Room code; prompted for when omitted
        room: Option<String>,

        #[arg(long, env = "TANDEM_SERVER", default_value = "ws://127.0.0.1:3000/ws")]
        server: String,

        /// Shared with the peer when answering, as "lat,lng"
        #[arg(long, value_parser = parse_coordinates)]
        location: Option<Coordinates>,
    },
}

fn parse_coordinates(s: &str) -> Result<Coordinates, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| "expected \"lat,lng\"".to_string())?;
    let latitude = lat.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let longitude = lng.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

/// Terminal outcomes the main task waits on.
enum CallEnd {
    RoomFull,
    Failed,
}

struct ConsoleObserver {
    end_tx: mpsc::UnboundedSender<CallEnd>,
}

#[async_trait]
impl CallObserver for ConsoleObserver {
    async fn on_remote_media_available(&self, media: RemoteMedia) {
        println!(
            "{} {} track {} (stream {})",
            "▶".green().bold(),
            media.kind,
            media.track_id,
            media.stream_id
        );
    }

    async fn on_remote_media_cleared(&self) {
        println!("{}", "Remote media stopped".dimmed());
    }

    async fn on_location_received(&self, location: String) {
        println!("{} {}", "📍 Peer location:".cyan(), location);
    }

    async fn on_peer_left(&self) {
        println!("{}", "Peer left the room. Press Ctrl-C to exit.".yellow());
    }

    async fn on_room_full(&self, room_id: RoomId) {
        println!("{}", format!("Room {room_id} is full").red().bold());
        let _ = self.end_tx.send(CallEnd::RoomFull);
    }

    async fn on_call_failed(&self, error: &NegotiationError) {
        println!("{} {}", "Call failed:".red().bold(), error);
        let _ = self.end_tx.send(CallEnd::Failed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Commands::Join {
        room,
        server,
        location,
    } = Cli::parse().command;

    let room = match room {
        Some(room) => room,
        None => Input::<String>::new()
            .with_prompt("Room code")
            .interact_text()
            .context("Failed to read room code")?,
    };

    println!("{} {}", "Connecting to".cyan(), server);
    let channel = SignalingChannel::connect(&server)
        .await
        .context("Failed to connect to relay")?;

    let (end_tx, mut end_rx) = mpsc::unbounded_channel();
    let collaborators = Collaborators {
        transports: Arc::new(RtcTransportFactory),
        capture: Arc::new(NoCapture),
        location: location.map(|c| Arc::new(FixedLocation(c)) as Arc<dyn LocationProvider>),
        observer: Arc::new(ConsoleObserver { end_tx }),
    };
    let (client, handle) = CallClient::new(ClientConfig::default(), channel, collaborators);
    let driver = tokio::spawn(client.run());

    handle
        .request_join(room.as_str())
        .await
        .context("Failed to request join")?;
    println!("{} {}", "Joining room".green().bold(), room.bold());

    let watcher = handle.clone();
    tokio::spawn(async move {
        let reached = watcher
            .wait_for_state(|s| {
                matches!(s, NegotiationState::Connected { .. } | NegotiationState::Closed)
            })
            .await;
        if let Some(NegotiationState::Connected { room_id }) = reached {
            println!("{} {}", "Connected in".green().bold(), room_id);
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Hanging up".yellow());
            handle.hang_up().await;
        }
        end = end_rx.recv() => {
            if let Some(CallEnd::Failed) = end {
                handle.hang_up().await;
            }
        }
    }

    drop(handle);
    driver.await.context("Call driver panicked")?;
    Ok(())
}
