//! Builder for hash rings.

use super::{ArrayRing, HashRing, ListRing, MapRing, RingKind, RingSettings, DEFAULT_POINTS_PER_NODE};
use crate::hasher::murmur3::DEFAULT_SEED;
use crate::hasher::{HashFunction, HashKind};
use crate::node::RingNode;
use crate::point::PointObserver;
use std::sync::Arc;

/// Builds any ring variant from one description.
///
/// # Example
///
/// ```rust
/// use corelib::ring::{HashRing, RingBuilder, RingKind};
///
/// let ring = RingBuilder::new()
///     .with_points_per_node(8)
///     .add_node("node-a".to_string())
///     .add_node("node-b".to_string())
///     .build(RingKind::Map);
///
/// assert_eq!(ring.point_count(), 16);
/// ```
pub struct RingBuilder<N: RingNode> {
    settings: RingSettings<N>,
    nodes: Vec<N>,
}

impl<N: RingNode> RingBuilder<N> {
    /// Murmur3 (seed 31) with 100 points per node.
    pub fn new() -> Self {
        Self {
            settings: RingSettings::new(
                DEFAULT_POINTS_PER_NODE,
                HashKind::Murmur3.build(DEFAULT_SEED),
            ),
            nodes: Vec::new(),
        }
    }

    pub fn with_points_per_node(mut self, points_per_node: usize) -> Self {
        self.settings.points_per_node = points_per_node;
        self
    }

    /// Use a built-in hash function with its default seed.
    pub fn with_hash(self, kind: HashKind) -> Self {
        self.with_hasher(kind.build(DEFAULT_SEED))
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn HashFunction>) -> Self {
        self.settings.hasher = hasher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PointObserver<N>>) -> Self {
        self.settings.observer = observer;
        self
    }

    pub fn add_node(mut self, node: N) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn add_nodes(mut self, nodes: impl IntoIterator<Item = N>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    pub fn build_array(self) -> ArrayRing<N> {
        let ring = ArrayRing::new(self.settings.clone());
        self.fill(ring)
    }

    pub fn build_list(self) -> ListRing<N> {
        let ring = ListRing::new(self.settings.clone());
        self.fill(ring)
    }

    pub fn build_map(self) -> MapRing<N> {
        let ring = MapRing::new(self.settings.clone());
        self.fill(ring)
    }

    pub fn build(self, kind: RingKind) -> Box<dyn HashRing<N>> {
        match kind {
            RingKind::Array => Box::new(self.build_array()),
            RingKind::List => Box::new(self.build_list()),
            RingKind::Map => Box::new(self.build_map()),
        }
    }

    fn fill<R: HashRing<N>>(self, mut ring: R) -> R {
        for node in self.nodes {
            ring.include_node(node);
        }
        ring
    }
}

impl<N: RingNode> Default for RingBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}
