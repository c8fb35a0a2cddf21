//! The libp2p `NetworkBehaviour` this node runs: gossipsub for transaction
//! and block propagation plus identify/kad for peer discovery.
//!
//! Generalised from `TNBehavior` in the Telcoin Network consensus network
//! crate, trimmed to the two behaviours this node actually needs.

use libp2p::{gossipsub, identify, kad, swarm::NetworkBehaviour};

#[derive(NetworkBehaviour)]
pub struct ObscuraBehaviour {
    pub(crate) gossipsub: gossipsub::Behaviour,
    pub(crate) identify: identify::Behaviour,
    pub(crate) kad: kad::Behaviour<kad::store::MemoryStore>,
}

impl ObscuraBehaviour {
    pub fn new(
        gossipsub: gossipsub::Behaviour,
        identify: identify::Behaviour,
        kad: kad::Behaviour<kad::store::MemoryStore>,
    ) -> Self {
        Self { gossipsub, identify, kad }
    }
}
