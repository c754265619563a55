//! Advertisements - payloads tagged with provenance and hop count

use bytes::Bytes;

use crate::{NodeId, Source};

/// An advertisement in flight. Each hop builds a new one via [`Advertisement::relay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advertisement {
    /// Origin and most recent relay
    pub source: Source,
    /// Hops travelled so far (0 at the origin)
    pub degree: usize,
    /// Opaque content, shared between hops
    pub payload: Bytes,
}

impl Advertisement {
    /// A fresh advertisement, treated as forwarded by its own origin
    pub fn originate(origin: NodeId, payload: impl Into<Bytes>) -> Self {
        Advertisement {
            source: Source::originated(origin),
            degree: 0,
            payload: payload.into(),
        }
    }

    /// The copy that `via` hands on to the next hop
    pub fn relay(&self, via: NodeId) -> Self {
        Advertisement {
            source: self.source.relayed_by(via),
            degree: self.degree + 1,
            payload: self.payload.clone(),
        }
    }

    #[inline]
    pub fn origin(&self) -> &NodeId {
        self.source.origin()
    }

    #[inline]
    pub fn forwarder(&self) -> &NodeId {
        self.source.forwarder()
    }
}
