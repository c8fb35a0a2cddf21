//! Gossip transport for the chain engine: wire message types plus the
//! libp2p swarm that carries them between peers.

pub mod behaviour;
pub mod error;
pub mod handle;
pub mod message;

pub use error::NetworkError;
pub use handle::{spawn, NetworkCommand, NetworkEvent, NetworkHandle};
pub use message::{BootstrapPayload, GossipMessage, PeerHello, Topic};
