//! Registry - the address space of node actors
//!
//! The identity -> actor map is the only state shared between tasks and the
//! only lock in the system. Lookup-or-create happens under that lock, so an
//! identity maps to exactly one actor for the registry's lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use kscope_core::{Advertisement, NodeId};
use parking_lot::Mutex;
use tracing::debug;

use crate::inflight::InFlight;
use crate::node::{self, NodeHandle, NodeSnapshot};
use crate::{DeliverySink, ScopeConfig};

pub(crate) struct RegistryInner {
    config: ScopeConfig,
    sink: Option<Arc<dyn DeliverySink>>,
    nodes: Mutex<HashMap<NodeId, NodeHandle>>,
    inflight: Arc<InFlight>,
}

/// Entry point for trust edits, advertisements and route resets.
///
/// Cheap to clone. Must be used from within a Tokio runtime: actors are
/// spawned onto the current runtime the first time an identity is seen.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Registry without a delivery sink; deliveries are discarded
    pub fn start(config: ScopeConfig) -> Self {
        Self::build(config, None)
    }

    /// Registry that hands every delivery to `sink`
    pub fn with_sink(config: ScopeConfig, sink: impl DeliverySink + 'static) -> Self {
        Self::build(config, Some(Arc::new(sink)))
    }

    fn build(config: ScopeConfig, sink: Option<Arc<dyn DeliverySink>>) -> Self {
        debug!(reach = ?config.reach.as_slice(), policy = ?config.untrust_policy, "starting registry");
        Registry {
            inner: Arc::new(RegistryInner {
                config,
                sink,
                nodes: Mutex::new(HashMap::new()),
                inflight: Arc::new(InFlight::default()),
            }),
        }
    }

    pub(crate) fn upgrade(inner: &Weak<RegistryInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Registry { inner })
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.inner.config
    }

    /// `truster` starts accepting relays from, and forwarding to, `trustee`
    pub async fn trust(&self, truster: &NodeId, trustee: &NodeId) {
        self.resolve(truster).add_trust(trustee.clone()).await;
    }

    /// Remove one `truster -> trustee` edge
    pub async fn untrust(&self, truster: &NodeId, trustee: &NodeId) {
        self.resolve(truster).remove_trust(trustee.clone()).await;
    }

    /// Inject a new advertisement at `origin`
    pub async fn advertise(&self, origin: &NodeId, payload: impl Into<Bytes>) {
        let ad = Advertisement::originate(origin.clone(), payload);
        self.resolve(origin).receive(ad).await;
    }

    /// Clear one node's route cache
    pub async fn reset_routes(&self, id: &NodeId) {
        self.resolve(id).reset_routes().await;
    }

    /// Clear every known node's route cache
    pub async fn reset_all_routes(&self) {
        for node in self.nodes() {
            node.reset_routes().await;
        }
    }

    /// The actor for `id`, spawned if this is the first reference to it
    pub fn resolve(&self, id: &NodeId) -> NodeHandle {
        let mut nodes = self.inner.nodes.lock();
        if let Some(node) = nodes.get(id) {
            return node.clone();
        }

        let node = node::spawn(
            id.clone(),
            &self.inner.config,
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.inflight),
        );
        nodes.insert(id.clone(), node.clone());
        node
    }

    /// Hand a payload to the delivery sink, if one is installed.
    /// Called concurrently by any number of actors.
    pub fn deliver(&self, destination: &NodeId, payload: &Bytes) {
        if let Some(sink) = &self.inner.sink {
            sink.deliver(destination, payload);
        }
    }

    /// Copy of a node's state as seen by its actor. `None` for identities
    /// that were never referenced.
    pub async fn snapshot(&self, id: &NodeId) -> Option<NodeSnapshot> {
        let node = self.inner.nodes.lock().get(id).cloned()?;
        node.snapshot().await
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.lock().len()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.inner.nodes.lock().keys().cloned().collect()
    }

    /// Resolves once every enqueued command, including relays enqueued while
    /// processing them, has been handled. Never resolves while an actor is
    /// stalled on a full mailbox.
    pub async fn settled(&self) {
        self.inner.inflight.wait_idle().await;
    }

    fn nodes(&self) -> Vec<NodeHandle> {
        self.inner.nodes.lock().values().cloned().collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.inner.config)
            .field("nodes", &self.node_count())
            .field("has_sink", &self.inner.sink.is_some())
            .finish()
    }
}
