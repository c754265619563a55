//! Node actor - one task per identity, fed through bounded mailboxes

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use kscope_core::{Advertisement, NodeId, ReachSchedule, Source};
use kscope_diffusion::{NodeState, UntrustPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::inflight::InFlight;
use crate::registry::{Registry, RegistryInner};
use crate::ScopeConfig;

/// Point-in-time copy of a node's state, produced by the node's own actor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub trusted: Vec<NodeId>,
    pub routes: HashMap<Source, Vec<NodeId>>,
}

/// Address of a running node actor. Cloning is cheap; every clone feeds
/// the same mailboxes.
#[derive(Clone, Debug)]
pub struct NodeHandle {
    id: NodeId,
    trust_tx: mpsc::Sender<NodeId>,
    untrust_tx: mpsc::Sender<NodeId>,
    reset_tx: mpsc::Sender<()>,
    ad_tx: mpsc::Sender<Advertisement>,
    query_tx: mpsc::Sender<oneshot::Sender<NodeSnapshot>>,
    inflight: Arc<InFlight>,
}

impl NodeHandle {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Enqueue "trust `peer`". Waits only while the trust mailbox is full.
    pub async fn add_trust(&self, peer: NodeId) {
        self.enqueue(&self.trust_tx, peer).await;
    }

    /// Enqueue "stop trusting `peer`"
    pub async fn remove_trust(&self, peer: NodeId) {
        self.enqueue(&self.untrust_tx, peer).await;
    }

    /// Enqueue "forget all cached routes"
    pub async fn reset_routes(&self) {
        self.enqueue(&self.reset_tx, ()).await;
    }

    /// Hand an advertisement to this node, as if relayed by its forwarder
    pub async fn receive(&self, ad: Advertisement) {
        self.enqueue(&self.ad_tx, ad).await;
    }

    /// Ask the actor for a copy of its state. `None` if the actor is gone.
    pub async fn snapshot(&self) -> Option<NodeSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.query_tx.send(reply_tx).await.ok()?;
        reply_rx.await.ok()
    }

    async fn enqueue<T>(&self, tx: &mpsc::Sender<T>, command: T) {
        self.inflight.begin();
        if tx.send(command).await.is_err() {
            // Actor has exited; nothing will ever process this
            self.inflight.finish();
        }
    }
}

struct Mailboxes {
    trust_rx: mpsc::Receiver<NodeId>,
    untrust_rx: mpsc::Receiver<NodeId>,
    reset_rx: mpsc::Receiver<()>,
    ad_rx: mpsc::Receiver<Advertisement>,
    query_rx: mpsc::Receiver<oneshot::Sender<NodeSnapshot>>,
}

struct NodeActor {
    state: NodeState,
    reach: ReachSchedule,
    untrust_policy: UntrustPolicy,
    rng: StdRng,
    registry: Weak<RegistryInner>,
    inflight: Arc<InFlight>,
}

/// Create the mailboxes for `id` and start its actor on the current Tokio runtime
pub(crate) fn spawn(
    id: NodeId,
    config: &ScopeConfig,
    registry: Weak<RegistryInner>,
    inflight: Arc<InFlight>,
) -> NodeHandle {
    let depth = config.mailbox_depth.max(1);
    let (trust_tx, trust_rx) = mpsc::channel(depth);
    let (untrust_tx, untrust_rx) = mpsc::channel(depth);
    let (reset_tx, reset_rx) = mpsc::channel(depth);
    let (ad_tx, ad_rx) = mpsc::channel(depth);
    let (query_tx, query_rx) = mpsc::channel(depth);

    let actor = NodeActor {
        state: NodeState::new(id.clone()),
        reach: config.reach.clone(),
        untrust_policy: config.untrust_policy,
        rng: rng_for(&id, config.seed),
        registry,
        inflight: Arc::clone(&inflight),
    };

    debug!(node = %id, "spawning node actor");
    tokio::spawn(actor.run(Mailboxes {
        trust_rx,
        untrust_rx,
        reset_rx,
        ad_rx,
        query_rx,
    }));

    NodeHandle {
        id,
        trust_tx,
        untrust_tx,
        reset_tx,
        ad_tx,
        query_tx,
        inflight,
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the identity bytes; fixed across toolchains
fn identity_hash(id: &NodeId) -> u64 {
    id.as_str()
        .bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME))
}

fn rng_for(id: &NodeId, seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ identity_hash(id)),
        None => StdRng::from_entropy(),
    }
}

impl NodeActor {
    async fn run(mut self, mut mailboxes: Mailboxes) {
        loop {
            tokio::select! {
                Some(peer) = mailboxes.trust_rx.recv() => {
                    debug!(node = %self.state.id(), peer = %peer, "trust");
                    self.state.add_trust(peer);
                    self.inflight.finish();
                }
                Some(peer) = mailboxes.untrust_rx.recv() => {
                    debug!(node = %self.state.id(), peer = %peer, "untrust");
                    self.state.remove_trust(&peer, self.untrust_policy);
                    self.inflight.finish();
                }
                Some(()) = mailboxes.reset_rx.recv() => {
                    debug!(node = %self.state.id(), "resetting routes");
                    self.state.reset_routes();
                    self.inflight.finish();
                }
                Some(ad) = mailboxes.ad_rx.recv() => {
                    self.handle_ad(ad).await;
                    self.inflight.finish();
                }
                Some(reply) = mailboxes.query_rx.recv() => {
                    let _ = reply.send(self.snapshot());
                }
                else => break,
            }
        }
        debug!(node = %self.state.id(), "node actor stopped");
    }

    async fn handle_ad(&mut self, ad: Advertisement) {
        let verdict = self.state.receive(&ad, &self.reach, &mut self.rng);
        if verdict.is_dropped() {
            return;
        }

        let Some(registry) = Registry::upgrade(&self.registry) else {
            return;
        };

        if verdict.deliver {
            trace!(node = %self.state.id(), source = %ad.source, degree = ad.degree, "delivering");
            registry.deliver(self.state.id(), &ad.payload);
        }

        if let Some(forward) = verdict.forward {
            trace!(
                node = %self.state.id(),
                source = %ad.source,
                degree = ad.degree,
                fanout = forward.destinations.len(),
                "forwarding"
            );
            for destination in &forward.destinations {
                registry
                    .resolve(destination)
                    .receive(forward.advertisement.clone())
                    .await;
            }
        }
    }

    fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.state.id().clone(),
            trusted: self.state.trusted().to_vec(),
            routes: self
                .state
                .routes()
                .iter()
                .map(|(source, destinations)| (source.clone(), destinations.to_vec()))
                .collect(),
        }
    }
}
