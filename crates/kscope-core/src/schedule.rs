//! Reach schedule - per-hop fan-out fractions
//!
//! Entry `n` is the fraction of eligible peers a node forwards to when it
//! holds an advertisement of degree `n`. The schedule length is the hop cap.

use crate::{KscopeError, KscopeResult};

/// Default schedule: full fan-out at the origin, then shrinking
pub const DEFAULT_REACH: [f64; 4] = [1.0, 0.25, 0.1, 0.05];

/// Validated, non-empty reach schedule
#[derive(Clone, Debug, PartialEq)]
pub struct ReachSchedule {
    hops: Vec<f64>,
}

impl ReachSchedule {
    /// Build a schedule, rejecting empty lists and fractions outside [0, 1]
    pub fn new(hops: impl Into<Vec<f64>>) -> KscopeResult<Self> {
        let hops = hops.into();
        if hops.is_empty() {
            return Err(KscopeError::EmptySchedule);
        }
        for (hop, &value) in hops.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(KscopeError::InvalidReach { hop, value });
            }
        }
        Ok(ReachSchedule { hops })
    }

    /// Maximum degree at which an advertisement is still forwarded, plus one
    #[inline]
    pub fn hop_cap(&self) -> usize {
        self.hops.len()
    }

    /// Fan-out fraction for an advertisement of the given degree,
    /// or `None` once the hop cap is reached
    #[inline]
    pub fn reach_at(&self, degree: usize) -> Option<f64> {
        self.hops.get(degree).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.hops
    }
}

impl Default for ReachSchedule {
    fn default() -> Self {
        ReachSchedule {
            hops: DEFAULT_REACH.to_vec(),
        }
    }
}
