//! Error types for kscope
//!
//! Errors only surface where values are constructed or validated. The
//! propagation path itself never fails: rejected advertisements are dropped.

use thiserror::Error;

/// Core kscope errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KscopeError {
    // Identity errors
    #[error("Node identity must not be empty")]
    EmptyNodeId,

    #[error("Node identity {0:?} contains the reserved separator '|'")]
    ReservedSeparator(String),

    #[error("Malformed source key: {0:?}")]
    MalformedSource(String),

    // Schedule errors
    #[error("Reach schedule must contain at least one hop")]
    EmptySchedule,

    #[error("Invalid reach at hop {hop}: {value} (expected a fraction in [0, 1])")]
    InvalidReach { hop: usize, value: f64 },
}

/// Result type for kscope operations
pub type KscopeResult<T> = Result<T, KscopeError>;
