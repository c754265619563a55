//! Runtime configuration

use kscope_core::ReachSchedule;
use kscope_diffusion::UntrustPolicy;

/// Capacity of each per-command-kind mailbox
pub const MAILBOX_DEPTH: usize = 100;

/// Registry configuration
#[derive(Clone, Debug)]
pub struct ScopeConfig {
    /// Per-hop fan-out fractions; its length is the hop cap
    pub reach: ReachSchedule,
    /// Pending commands per mailbox before senders wait
    pub mailbox_depth: usize,
    /// Route cache handling on untrust
    pub untrust_policy: UntrustPolicy,
    /// Fixed seed for destination sampling (mixed with each node's identity).
    /// `None` seeds every actor from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        ScopeConfig {
            reach: ReachSchedule::default(),
            mailbox_depth: MAILBOX_DEPTH,
            untrust_policy: UntrustPolicy::default(),
            seed: None,
        }
    }
}

impl ScopeConfig {
    pub fn with_reach(mut self, reach: ReachSchedule) -> Self {
        self.reach = reach;
        self
    }

    pub fn with_mailbox_depth(mut self, depth: usize) -> Self {
        self.mailbox_depth = depth;
        self
    }

    pub fn with_untrust_policy(mut self, policy: UntrustPolicy) -> Self {
        self.untrust_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
