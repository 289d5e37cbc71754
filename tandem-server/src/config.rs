use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tandem_core::IceServerConfig;
use tandem_core::utils::DEFAULT_STUN_ADDR;

use crate::room::DEFAULT_ROOM_QUEUE;

/// Two-party room signaling relay.
#[derive(Debug, Clone, Parser)]
#[command(name = "tandem-server", version)]
pub struct ServerConfig {
    /// Address to bind the HTTP/WebSocket listener to.
    #[arg(long, env = "TANDEM_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// STUN/TURN url handed to clients on connect. Repeatable.
    #[arg(long = "ice-server", default_values_t = [DEFAULT_STUN_ADDR.to_owned()])]
    pub ice_urls: Vec<String>,

    #[arg(long, env = "TANDEM_ICE_USERNAME")]
    pub ice_username: Option<String>,

    #[arg(long, env = "TANDEM_ICE_CREDENTIAL")]
    pub ice_credential: Option<String>,

    /// Depth of each room's command queue.
    #[arg(long, default_value_t = DEFAULT_ROOM_QUEUE)]
    pub room_queue: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        if self.ice_urls.is_empty() {
            return Vec::new();
        }
        vec![IceServerConfig {
            urls: self.ice_urls.clone(),
            username: self.ice_username.clone(),
            credential: self.ice_credential.clone(),
        }]
    }
}
