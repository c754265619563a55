//! kscope Diffusion
//!
//! Trust-scoped propagation logic for a single node. Nothing in this crate
//! is concurrent: a [`NodeState`] is owned by exactly one actor, which feeds
//! it commands one at a time.
//!
//! Key concepts:
//! - Trust: the ordered peers a node accepts relays from and may forward to
//! - Routes: sticky destination lists keyed by propagation [`Source`]
//! - Verdict: what a node does with one incoming advertisement
//!
//! [`Source`]: kscope_core::Source

pub mod trust;
pub mod routes;
pub mod state;

pub use trust::*;
pub use routes::*;
pub use state::*;
