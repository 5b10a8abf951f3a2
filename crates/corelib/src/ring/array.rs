//! Array-backed ring.
//!
//! Every mutation builds a fresh boxed slice and sorts it in full. Lookups are
//! a binary search over contiguous memory, which makes this the fastest
//! variant to read and the most expensive to change.

use super::{successor_index, HashRing, RingSettings, DEFAULT_POINTS_PER_NODE};
use crate::hasher::{HashFunction, Md5Hash, Murmur3Hash};
use crate::node::RingNode;
use crate::point::HashedNodePoint;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct ArrayRing<N: RingNode> {
    settings: RingSettings<N>,
    points: Box<[HashedNodePoint<N>]>,
}

impl<N: RingNode> ArrayRing<N> {
    pub fn new(settings: RingSettings<N>) -> Self {
        Self {
            settings,
            points: Box::new([]),
        }
    }

    pub fn with_hasher(points_per_node: usize, hasher: Arc<dyn HashFunction>) -> Self {
        Self::new(RingSettings::new(points_per_node, hasher))
    }

    /// Murmur3-placed ring (seed 31).
    pub fn murmur(points_per_node: usize) -> Self {
        Self::with_hasher(points_per_node, Arc::new(Murmur3Hash::default()))
    }

    /// MD5-placed ring.
    pub fn md5(points_per_node: usize) -> Self {
        Self::with_hasher(points_per_node, Arc::new(Md5Hash))
    }
}

impl<N: RingNode> Default for ArrayRing<N> {
    fn default() -> Self {
        Self::murmur(DEFAULT_POINTS_PER_NODE)
    }
}

impl<N: RingNode> HashRing<N> for ArrayRing<N> {
    /// # Performance
    /// - **Time**: O((n + p) log(n + p)) full re-sort
    /// - **Space**: O(n + p) fresh allocation
    fn include_node(&mut self, node: N) {
        let added = self.settings.generate(&node);

        let mut points = Vec::with_capacity(self.points.len() + added.len());
        points.extend_from_slice(&self.points);
        points.extend(added.iter().cloned());
        points.sort_unstable();
        self.points = points.into_boxed_slice();

        for point in &added {
            self.settings.observer.included(point);
        }
        debug!(node = %node, points = self.points.len(), "array ring included node");
    }

    fn exclude_node(&mut self, node: &N) {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.points)
            .into_vec()
            .into_iter()
            .partition(|point| &point.node == node);
        self.points = kept.into_boxed_slice();

        for point in &removed {
            self.settings.observer.excluded(point);
        }
        debug!(node = %node, removed = removed.len(), "array ring excluded node");
    }

    fn node_of(&self, id: &[u8]) -> Option<N> {
        let probe = self.settings.probe(id);
        successor_index(&self.points, probe).map(|index| self.points[index].node.clone())
    }

    fn points_per_node(&self) -> usize {
        self.settings.points_per_node
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn points(&self) -> Vec<HashedNodePoint<N>> {
        self.points.to_vec()
    }

    fn hasher_name(&self) -> &'static str {
        self.settings.hasher.name()
    }

    fn copy(&self) -> Box<dyn HashRing<N>> {
        Box::new(self.clone())
    }

    fn contains_node(&self, node: &N) -> bool {
        self.points.iter().any(|point| &point.node == node)
    }
}
