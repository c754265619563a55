//! Identity types for kscope
//!
//! Node identities are opaque string tokens. A propagation path is keyed by
//! the pair (origin, forwarder), which has a textual encoding
//! `origin|forwarder` for logs and external tooling.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::{KscopeError, KscopeResult};

/// Separator used by the textual encoding of a [`Source`].
/// Node identities may never contain it.
pub const SOURCE_SEPARATOR: char = '|';

/// Node identity - an opaque, non-empty token naming a participant
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Validate and wrap an identity token
    pub fn new(id: impl AsRef<str>) -> KscopeResult<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(KscopeError::EmptyNodeId);
        }
        if id.contains(SOURCE_SEPARATOR) {
            return Err(KscopeError::ReservedSeparator(id.to_string()));
        }
        Ok(NodeId(Arc::from(id)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for NodeId {
    type Error = KscopeError;

    fn try_from(value: &str) -> KscopeResult<Self> {
        NodeId::new(value)
    }
}

impl TryFrom<String> for NodeId {
    type Error = KscopeError;

    fn try_from(value: String) -> KscopeResult<Self> {
        NodeId::new(value)
    }
}

impl FromStr for NodeId {
    type Err = KscopeError;

    fn from_str(s: &str) -> KscopeResult<Self> {
        NodeId::new(s)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Propagation path - the node that created an advertisement and the node
/// that most recently relayed it
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Source {
    origin: NodeId,
    forwarder: NodeId,
}

impl Source {
    #[inline]
    pub fn new(origin: NodeId, forwarder: NodeId) -> Self {
        Source { origin, forwarder }
    }

    /// Source of a freshly created advertisement (origin forwards to itself)
    #[inline]
    pub fn originated(origin: NodeId) -> Self {
        Source {
            forwarder: origin.clone(),
            origin,
        }
    }

    /// Same origin, relayed by `via`
    #[inline]
    pub fn relayed_by(&self, via: NodeId) -> Self {
        Source {
            origin: self.origin.clone(),
            forwarder: via,
        }
    }

    #[inline]
    pub fn origin(&self) -> &NodeId {
        &self.origin
    }

    #[inline]
    pub fn forwarder(&self) -> &NodeId {
        &self.forwarder
    }

    #[inline]
    pub fn is_self_originated(&self) -> bool {
        self.origin == self.forwarder
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({self})")
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.origin, SOURCE_SEPARATOR, self.forwarder)
    }
}

impl FromStr for Source {
    type Err = KscopeError;

    fn from_str(s: &str) -> KscopeResult<Self> {
        let malformed = || KscopeError::MalformedSource(s.to_string());

        let (origin, forwarder) = s.split_once(SOURCE_SEPARATOR).ok_or_else(malformed)?;
        if forwarder.contains(SOURCE_SEPARATOR) {
            return Err(malformed());
        }

        Ok(Source {
            origin: NodeId::new(origin).map_err(|_| malformed())?,
            forwarder: NodeId::new(forwarder).map_err(|_| malformed())?,
        })
    }
}
