//! Ring shared between the membership feed and concurrent readers.
//!
//! Membership changes are rare and arrive on a single control path; lookups
//! happen on every routed message. A reader-writer lock lets any number of
//! lookups proceed together while a membership change waits for them to drain.

use super::HashRing;
use crate::node::RingNode;
use crate::point::HashedNodePoint;
use parking_lot::RwLock;
use std::fmt;
use tracing::info;

pub struct SharedRing<N: RingNode> {
    inner: RwLock<Box<dyn HashRing<N>>>,
}

impl<N: RingNode> SharedRing<N> {
    pub fn new(ring: Box<dyn HashRing<N>>) -> Self {
        Self {
            inner: RwLock::new(ring),
        }
    }

    pub fn from_ring(ring: impl HashRing<N> + 'static) -> Self {
        Self::new(Box::new(ring))
    }

    pub fn include_node(&self, node: N) {
        info!(node = %node, "including node in ring");
        self.inner.write().include_node(node);
    }

    pub fn exclude_node(&self, node: &N) {
        info!(node = %node, "excluding node from ring");
        self.inner.write().exclude_node(node);
    }

    pub fn node_of(&self, id: &[u8]) -> Option<N> {
        self.inner.read().node_of(id)
    }

    pub fn contains_node(&self, node: &N) -> bool {
        self.inner.read().contains_node(node)
    }

    pub fn nodes(&self) -> Vec<N> {
        self.inner.read().nodes()
    }

    pub fn points(&self) -> Vec<HashedNodePoint<N>> {
        self.inner.read().points()
    }

    pub fn point_count(&self) -> usize {
        self.inner.read().point_count()
    }

    /// Copy of the current ring; later membership changes do not affect it.
    pub fn snapshot(&self) -> Box<dyn HashRing<N>> {
        self.inner.read().copy()
    }

    /// Swap in a whole new ring, returning the previous one.
    pub fn replace(&self, ring: Box<dyn HashRing<N>>) -> Box<dyn HashRing<N>> {
        std::mem::replace(&mut *self.inner.write(), ring)
    }
}

impl<N: RingNode> fmt::Debug for SharedRing<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.inner.read();
        f.debug_struct("SharedRing")
            .field("hasher", &ring.hasher_name())
            .field("points", &ring.point_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::ArrayRing;

    #[test]
    fn test_snapshot_survives_membership_change() {
        let shared = SharedRing::from_ring(ArrayRing::murmur(10).with_node(1u32));
        let snapshot = shared.snapshot();

        shared.exclude_node(&1);
        assert_eq!(shared.node_of(b"key"), None);
        assert_eq!(snapshot.node_of(b"key"), Some(1));
    }

    #[test]
    fn test_replace() {
        let shared = SharedRing::from_ring(ArrayRing::murmur(10).with_node(1u32));
        let old = shared.replace(Box::new(ArrayRing::murmur(10).with_node(2u32)));

        assert_eq!(old.nodes(), vec![1]);
        assert_eq!(shared.nodes(), vec![2]);
    }
}
