//! Node state - trust list, route cache and the propagation decision
//!
//! For each incoming advertisement a node:
//! 1. Admits it only if the forwarder is trusted (or is the node itself)
//! 2. Delivers it unless the node is its origin or forwarder
//! 3. Forwards a relayed copy to a sticky, reach-sized subset of trusted
//!    peers, until the schedule's hop cap is reached

use kscope_core::{Advertisement, NodeId, ReachSchedule};
use rand::Rng;
use tracing::trace;

use crate::{RouteTable, TrustSet, UntrustPolicy};

/// Relayed copy plus the peers it goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forward {
    pub advertisement: Advertisement,
    pub destinations: Vec<NodeId>,
}

/// Outcome of handing one advertisement to a node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    /// Should the delivery sink see this payload for this node?
    pub deliver: bool,
    /// Relay to perform, `None` if the ad was dropped or hit the hop cap
    pub forward: Option<Forward>,
}

impl Verdict {
    /// Not admitted: no delivery, no relay
    pub fn dropped() -> Self {
        Self::default()
    }

    pub fn is_dropped(&self) -> bool {
        !self.deliver && self.forward.is_none()
    }
}

/// Everything one node knows
#[derive(Debug, Clone)]
pub struct NodeState {
    id: NodeId,
    trusted: TrustSet,
    routes: RouteTable,
}

impl NodeState {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            trusted: TrustSet::new(),
            routes: RouteTable::new(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn trusted(&self) -> &TrustSet {
        &self.trusted
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn add_trust(&mut self, peer: NodeId) {
        self.trusted.add(peer);
    }

    pub fn remove_trust(&mut self, peer: &NodeId, policy: UntrustPolicy) {
        self.trusted.remove(peer);
        if policy == UntrustPolicy::PurgeRoutes {
            self.routes.purge_peer(peer);
        }
    }

    pub fn reset_routes(&mut self) {
        self.routes.clear();
    }

    /// A node always trusts itself
    pub fn trusts(&self, peer: &NodeId) -> bool {
        *peer == self.id || self.trusted.contains(peer)
    }

    /// Decide what to do with an incoming advertisement
    pub fn receive<R: Rng + ?Sized>(
        &mut self,
        ad: &Advertisement,
        schedule: &ReachSchedule,
        rng: &mut R,
    ) -> Verdict {
        if !self.trusts(ad.forwarder()) {
            trace!(node = %self.id, source = %ad.source, "dropping ad from untrusted forwarder");
            return Verdict::dropped();
        }

        let deliver = self.id != *ad.origin() && self.id != *ad.forwarder();

        let Some(reach) = schedule.reach_at(ad.degree) else {
            trace!(node = %self.id, source = %ad.source, degree = ad.degree, "hop cap reached");
            return Verdict {
                deliver,
                forward: None,
            };
        };

        let destinations = self.destinations_for(ad, reach, rng);
        Verdict {
            deliver,
            forward: Some(Forward {
                advertisement: ad.relay(self.id.clone()),
                destinations,
            }),
        }
    }

    /// Pick (and remember) where an advertisement goes next
    fn destinations_for<R: Rng + ?Sized>(
        &mut self,
        ad: &Advertisement,
        reach: f64,
        rng: &mut R,
    ) -> Vec<NodeId> {
        // Never back to the forwarder, never to the origin
        let eligible: Vec<NodeId> = self
            .trusted
            .iter()
            .filter(|peer| *peer != ad.forwarder() && *peer != ad.origin())
            .cloned()
            .collect();

        let destinations = if reach >= 1.0 {
            eligible
        } else {
            let target = (reach * eligible.len() as f64).ceil() as usize;
            let mut destinations = self.routes.get(&ad.source).to_vec();

            if destinations.len() < target {
                let mut candidates: Vec<NodeId> = eligible
                    .into_iter()
                    .filter(|peer| !destinations.contains(peer))
                    .collect();

                while destinations.len() < target && !candidates.is_empty() {
                    let pick = rng.gen_range(0..candidates.len());
                    destinations.push(candidates.swap_remove(pick));
                }
            }
            destinations
        };

        self.routes.store(ad.source.clone(), destinations.clone());
        destinations
    }
}
