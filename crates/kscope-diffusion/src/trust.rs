//! Trust - the peers a node accepts advertisements from

use kscope_core::NodeId;

/// Ordered trusted-peer list. Insertion order is kept and duplicates are
/// not collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustSet {
    peers: Vec<NodeId>,
}

impl TrustSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a peer
    pub fn add(&mut self, peer: NodeId) {
        self.peers.push(peer);
    }

    /// Remove the first occurrence of a peer
    pub fn remove(&mut self, peer: &NodeId) -> bool {
        match self.peers.iter().position(|p| p == peer) {
            Some(pos) => {
                self.peers.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, peer: &NodeId) -> bool {
        self.peers.contains(peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.peers.clone()
    }
}
