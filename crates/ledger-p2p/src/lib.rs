//! Framed-TCP peer networking: connection bootstrap, head sync, and
//! transaction gossip relay (§4.6).

pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod network;
pub mod seen;
pub mod state;

pub use config::P2pConfig;
pub use connection::Connection;
pub use error::P2pError;
pub use message::MessageType;
pub use network::Network;
