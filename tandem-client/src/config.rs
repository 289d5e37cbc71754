use std::time::Duration;
use tandem_core::IceServerConfig;
use tandem_core::utils::DEFAULT_STUN_ADDR;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Offer/answer must reach `Connected` within this window or the call is failed.
    pub negotiation_timeout: Duration,
    pub location_timeout: Duration,
    /// Oldest cached fix the location provider may return.
    pub location_max_age: Duration,
    /// Used until the relay announces its own list.
    pub ice_servers: Vec<IceServerConfig>,
    pub transport_event_queue: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout: Duration::from_secs(30),
            location_timeout: Duration::from_secs(15),
            location_max_age: Duration::from_secs(10),
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_string()],
                username: None,
                credential: None,
            }],
            transport_event_queue: 64,
        }
    }
}
