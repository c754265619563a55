//! Delivery recorder sink

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use kscope_core::NodeId;
use kscope_runtime::DeliverySink;
use parking_lot::Mutex;

/// One delivery as seen by the sink
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub destination: NodeId,
    pub payload: Bytes,
}

/// Sink that keeps every delivery in arrival order. Clones share the log.
#[derive(Clone, Debug, Default)]
pub struct DeliveryRecorder {
    log: Arc<Mutex<Vec<Delivery>>>,
}

impl DeliveryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Distinct nodes that received anything
    pub fn recipients(&self) -> BTreeSet<NodeId> {
        self.log.lock().iter().map(|d| d.destination.clone()).collect()
    }

    /// Distinct nodes that received `payload`
    pub fn recipients_of(&self, payload: &[u8]) -> BTreeSet<NodeId> {
        self.log
            .lock()
            .iter()
            .filter(|d| d.payload == payload)
            .map(|d| d.destination.clone())
            .collect()
    }

    pub fn deliveries_to(&self, node: &NodeId) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|d| d.destination == *node)
            .count()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl DeliverySink for DeliveryRecorder {
    fn deliver(&self, destination: &NodeId, payload: &Bytes) {
        self.log.lock().push(Delivery {
            destination: destination.clone(),
            payload: payload.clone(),
        });
    }
}
