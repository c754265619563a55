//! kscope Core - Fundamental types
//!
//! This crate defines the types shared by every kscope layer:
//! - Identifiers (NodeId, Source)
//! - Advertisements (payload plus provenance and hop count)
//! - The per-hop reach schedule
//! - The error type used at validation boundaries

pub mod id;
pub mod ad;
pub mod schedule;
pub mod error;

pub use id::*;
pub use ad::*;
pub use schedule::*;
pub use error::*;
