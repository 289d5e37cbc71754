mod call_client;
mod candidate_buffer;
mod channel;
mod collaborators;
mod config;
mod error;
mod negotiator;
mod transport;

pub use call_client::*;
pub use candidate_buffer::*;
pub use channel::*;
pub use collaborators::*;
pub use config::*;
pub use error::*;
pub use negotiator::*;
pub use transport::*;
