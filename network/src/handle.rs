//! The swarm-driving event loop and the handle used to talk to it.
//!
//! Generalised from the actor pattern in Telcoin Network's
//! `network-libp2p/src/consensus.rs`: a `tokio::spawn`ed task owns the
//! `Swarm` exclusively and communicates with the rest of the node over two
//! `mpsc` channels, so no lock is ever needed around the swarm itself.

use std::time::Duration;

use futures::StreamExt;
use libp2p::{gossipsub, identify, kad, swarm::SwarmEvent, Multiaddr, PeerId, SwarmBuilder};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    behaviour::{ObscuraBehaviour, ObscuraBehaviourEvent},
    error::NetworkError,
    message::{GossipMessage, Topic},
};

/// A request issued to the swarm event loop.
pub enum NetworkCommand {
    Publish(GossipMessage),
    Dial(Multiaddr),
    Shutdown,
}

/// Something the swarm event loop observed, forwarded out to the node.
#[derive(Debug)]
pub enum NetworkEvent {
    MessageReceived(GossipMessage),
    PeerConnected(PeerId),
    PeerDisconnected(PeerId),
}

/// A cheap, cloneable handle for issuing commands to a running network task.
#[derive(Clone)]
pub struct NetworkHandle {
    commands: mpsc::Sender<NetworkCommand>,
}

impl NetworkHandle {
    pub async fn publish(&self, message: GossipMessage) -> Result<(), NetworkError> {
        self.commands.send(NetworkCommand::Publish(message)).await.map_err(|_| NetworkError::HandleClosed)
    }

    pub async fn dial(&self, addr: Multiaddr) -> Result<(), NetworkError> {
        self.commands.send(NetworkCommand::Dial(addr)).await.map_err(|_| NetworkError::HandleClosed)
    }

    pub async fn shutdown(&self) -> Result<(), NetworkError> {
        self.commands.send(NetworkCommand::Shutdown).await.map_err(|_| NetworkError::HandleClosed)
    }
}

/// Builds the swarm for `network_name`, subscribes to both gossip topics,
/// and spawns the event loop. Returns a handle for sending commands, a
/// receiver for inbound events, and the loop's `JoinHandle`.
pub fn spawn(
    network_name: &str,
) -> Result<(NetworkHandle, mpsc::Receiver<NetworkEvent>, JoinHandle<()>), NetworkError> {
    let keypair = libp2p::identity::Keypair::generate_ed25519();
    let local_peer_id = PeerId::from(keypair.public());

    let gossipsub_config = gossipsub::ConfigBuilder::default()
        .heartbeat_interval(Duration::from_secs(1))
        .validation_mode(gossipsub::ValidationMode::Strict)
        .build()
        .map_err(|e| NetworkError::Config(e.to_string()))?;
    let mut gossipsub =
        gossipsub::Behaviour::new(gossipsub::MessageAuthenticity::Signed(keypair.clone()), gossipsub_config)
            .map_err(|e| NetworkError::Config(e.to_string()))?;

    let tx_topic = gossipsub::IdentTopic::new(Topic::Transaction.as_str());
    let block_topic = gossipsub::IdentTopic::new(Topic::Block.as_str());
    gossipsub.subscribe(&tx_topic).map_err(|e| NetworkError::Config(e.to_string()))?;
    gossipsub.subscribe(&block_topic).map_err(|e| NetworkError::Config(e.to_string()))?;

    let identify =
        identify::Behaviour::new(identify::Config::new(format!("obscura/{network_name}/1"), keypair.public()));
    let kad = kad::Behaviour::new(local_peer_id, kad::store::MemoryStore::new(local_peer_id));

    let behaviour = ObscuraBehaviour::new(gossipsub, identify, kad);

    let mut swarm = SwarmBuilder::with_existing_identity(keypair)
        .with_tokio()
        .with_tcp(libp2p::tcp::Config::default(), libp2p::noise::Config::new, libp2p::yamux::Config::default)
        .map_err(|e| NetworkError::Config(e.to_string()))?
        .with_dns()
        .map_err(|e| NetworkError::Config(e.to_string()))?
        .with_behaviour(|_| behaviour)
        .map_err(|e| NetworkError::Config(e.to_string()))?
        .with_swarm_config(|c| c.with_idle_connection_timeout(Duration::from_secs(60)))
        .build();

    let (cmd_tx, mut cmd_rx) = mpsc::channel(128);
    let (evt_tx, evt_rx) = mpsc::channel(128);

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                command = cmd_rx.recv() => {
                    match command {
                        Some(NetworkCommand::Publish(message)) => {
                            let topic = match message.topic {
                                Topic::Transaction => tx_topic.clone(),
                                Topic::Block => block_topic.clone(),
                            };
                            match bincode::serialize(&message) {
                                Ok(bytes) => {
                                    if let Err(e) = swarm.behaviour_mut().gossipsub.publish(topic, bytes) {
                                        tracing::warn!(target: "obscura::network", error = %e, "gossip publish failed");
                                    }
                                }
                                Err(e) => tracing::warn!(target: "obscura::network", error = %e, "message encode failed"),
                            }
                        }
                        Some(NetworkCommand::Dial(addr)) => {
                            if let Err(e) = swarm.dial(addr) {
                                tracing::warn!(target: "obscura::network", error = %e, "dial failed");
                            }
                        }
                        Some(NetworkCommand::Shutdown) | None => break,
                    }
                }
                event = swarm.select_next_some() => {
                    handle_swarm_event(event, &evt_tx).await;
                }
            }
        }
    });

    Ok((NetworkHandle { commands: cmd_tx }, evt_rx, task))
}

async fn handle_swarm_event(event: SwarmEvent<ObscuraBehaviourEvent>, evt_tx: &mpsc::Sender<NetworkEvent>) {
    match event {
        SwarmEvent::ConnectionEstablished { peer_id, .. } => {
            let _ = evt_tx.send(NetworkEvent::PeerConnected(peer_id)).await;
        }
        SwarmEvent::ConnectionClosed { peer_id, .. } => {
            let _ = evt_tx.send(NetworkEvent::PeerDisconnected(peer_id)).await;
        }
        SwarmEvent::Behaviour(ObscuraBehaviourEvent::Gossipsub(gossipsub::Event::Message { message, .. })) => {
            if let Ok(decoded) = bincode::deserialize::<GossipMessage>(&message.data) {
                let _ = evt_tx.send(NetworkEvent::MessageReceived(decoded)).await;
            }
        }
        _ => {}
    }
}
