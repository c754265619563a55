//! Routes - sticky forwarding decisions per propagation path

use std::collections::HashMap;

use kscope_core::{NodeId, Source};

/// What happens to cached routes when a peer is untrusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UntrustPolicy {
    /// Leave cached routes alone. Routes keyed by the untrusted forwarder go
    /// dead because its relays are no longer admitted.
    #[default]
    RetainRoutes,
    /// Drop routes keyed by the untrusted forwarder and strip it from every
    /// cached destination list.
    PurgeRoutes,
}

/// Route cache: Source -> destinations chosen so far
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<Source, Vec<NodeId>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached destinations for a path (empty if never forwarded)
    pub fn get(&self, source: &Source) -> &[NodeId] {
        self.routes.get(source).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn store(&mut self, source: Source, destinations: Vec<NodeId>) {
        self.routes.insert(source, destinations);
    }

    pub fn contains(&self, source: &Source) -> bool {
        self.routes.contains_key(source)
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Forget everything that mentions `peer`
    pub fn purge_peer(&mut self, peer: &NodeId) {
        self.routes.retain(|source, _| source.forwarder() != peer);
        for destinations in self.routes.values_mut() {
            destinations.retain(|d| d != peer);
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Source, &[NodeId])> {
        self.routes.iter().map(|(s, d)| (s, d.as_slice()))
    }
}
