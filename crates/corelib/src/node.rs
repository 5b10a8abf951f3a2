//! Node abstractions for the hash ring.
//!
//! Nodes are the cluster members that own actor addresses. The ring itself is
//! generic over the node type (see [`RingNode`]); the grid uses the
//! string-backed [`NodeId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Identifier for a member of the grid.
///
/// Opaque and immutable. `Display` renders the raw id, which is what point
/// keys are derived from, so two processes naming a node identically place
/// its points identically.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Bound for anything a ring can place points for.
///
/// Blanket-implemented; integers and strings qualify as well as [`NodeId`].
pub trait RingNode: Clone + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> RingNode for T where T: Clone + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}
