//! kscope Test Harness - end-to-end propagation testing
//!
//! This crate provides:
//! - A delivery sink that records every delivery
//! - A builder for layered trust hierarchies
//! - Propagation scenarios run against live node actors

pub mod recorder;
pub mod hierarchy;

#[cfg(test)]
mod integration;

pub use recorder::*;
pub use hierarchy::*;

/// Install a `tracing` subscriber for tests, honouring `RUST_LOG`.
/// Safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
