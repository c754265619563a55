//! Delivery sink - where payloads leave the overlay

use bytes::Bytes;
use kscope_core::NodeId;

/// Receives every delivery. Called synchronously from the delivering
/// node's actor, possibly from many actors at once.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, destination: &NodeId, payload: &Bytes);
}

impl<F> DeliverySink for F
where
    F: Fn(&NodeId, &Bytes) + Send + Sync,
{
    fn deliver(&self, destination: &NodeId, payload: &Bytes) {
        self(destination, payload)
    }
}
