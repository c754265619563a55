//! kscope Runtime - node actors and their registry
//!
//! Every node identity is served by one Tokio task that exclusively owns
//! that node's trust list and route cache. Nodes talk only through bounded
//! mailboxes:
//! 1. Callers go through a [`Registry`], which creates actors on first use
//! 2. Trust edits, route resets and advertisements are enqueued, never applied in place
//! 3. A full mailbox makes the sender wait
//! 4. Deliveries are handed to an injected [`DeliverySink`]

pub mod config;
pub mod sink;
mod inflight;
pub mod node;
pub mod registry;

pub use config::*;
pub use sink::*;
pub use node::*;
pub use registry::*;
