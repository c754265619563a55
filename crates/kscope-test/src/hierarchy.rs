//! Layered trust hierarchies
//!
//! A hierarchy hangs off a root node. Level `n` holds one child per index in
//! `levels[n]` under every node of level `n - 1`; a node's name is its index
//! path joined by `-` (level 1 node `4`, its child `4-2`, ...).
//!
//! Edges:
//! - root trusts every level 1 node; only even level 1 nodes trust root back
//! - below level 1, parent and child trust each other

use std::ops::Range;

use kscope_core::NodeId;
use kscope_runtime::Registry;

/// A directed trust edge. `downward` edges point away from the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustEdge {
    pub truster: NodeId,
    pub trustee: NodeId,
    pub downward: bool,
}

#[derive(Clone, Debug)]
pub struct TrustHierarchy {
    root: NodeId,
    levels: Vec<Range<usize>>,
}

impl TrustHierarchy {
    pub fn new(root: NodeId, levels: Vec<Range<usize>>) -> Self {
        Self { root, levels }
    }

    pub fn root(&self) -> &NodeId {
        &self.root
    }

    /// Level 1 nodes that trust the root back
    pub fn root_trusting_children(&self) -> Vec<NodeId> {
        self.levels
            .first()
            .map(|range| {
                range
                    .clone()
                    .filter(|i| i % 2 == 0)
                    .map(|i| node(&i.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn edges(&self) -> Vec<TrustEdge> {
        let mut edges = Vec::new();
        self.walk(0, &self.root, None, &mut edges);
        edges
    }

    /// Every node named by the hierarchy, root excluded
    pub fn members(&self) -> Vec<NodeId> {
        self.edges()
            .into_iter()
            .filter(|e| e.downward)
            .map(|e| e.trustee)
            .collect()
    }

    /// Enqueue every edge
    pub async fn build(&self, registry: &Registry) {
        for edge in self.edges() {
            registry.trust(&edge.truster, &edge.trustee).await;
        }
    }

    /// Remove the downward edges only; children keep trusting their parents
    pub async fn tear_down(&self, registry: &Registry) {
        for edge in self.edges().into_iter().filter(|e| e.downward) {
            registry.untrust(&edge.truster, &edge.trustee).await;
        }
    }

    fn walk(&self, depth: usize, parent: &NodeId, prefix: Option<&str>, edges: &mut Vec<TrustEdge>) {
        let Some(range) = self.levels.get(depth) else {
            return;
        };

        for i in range.clone() {
            let name = match prefix {
                Some(prefix) => format!("{prefix}-{i}"),
                None => i.to_string(),
            };
            let child = node(&name);

            edges.push(TrustEdge {
                truster: parent.clone(),
                trustee: child.clone(),
                downward: true,
            });
            if depth > 0 || i % 2 == 0 {
                edges.push(TrustEdge {
                    truster: child.clone(),
                    trustee: parent.clone(),
                    downward: false,
                });
            }

            self.walk(depth + 1, &child, Some(&name), edges);
        }
    }
}

fn node(name: &str) -> NodeId {
    NodeId::new(name).expect("hierarchy names are digits and dashes")
}
