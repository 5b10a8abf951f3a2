//! Sorted-list ring.
//!
//! Points are inserted one at a time at their binary-searched position, so the
//! vector is sorted after every step and never re-sorted as a whole.

use super::{successor_index, HashRing, RingSettings, DEFAULT_POINTS_PER_NODE};
use crate::hasher::{HashFunction, Md5Hash, Murmur3Hash};
use crate::node::RingNode;
use crate::point::HashedNodePoint;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct ListRing<N: RingNode> {
    settings: RingSettings<N>,
    points: Vec<HashedNodePoint<N>>,
}

impl<N: RingNode> ListRing<N> {
    pub fn new(settings: RingSettings<N>) -> Self {
        Self {
            settings,
            points: Vec::new(),
        }
    }

    pub fn with_hasher(points_per_node: usize, hasher: Arc<dyn HashFunction>) -> Self {
        Self::new(RingSettings::new(points_per_node, hasher))
    }

    pub fn murmur(points_per_node: usize) -> Self {
        Self::with_hasher(points_per_node, Arc::new(Murmur3Hash::default()))
    }

    pub fn md5(points_per_node: usize) -> Self {
        Self::with_hasher(points_per_node, Arc::new(Md5Hash))
    }
}

impl<N: RingNode> Default for ListRing<N> {
    fn default() -> Self {
        Self::murmur(DEFAULT_POINTS_PER_NODE)
    }
}

impl<N: RingNode> HashRing<N> for ListRing<N> {
    /// # Performance
    /// - **Time**: O(p * n) worst case, one shifted insert per point
    fn include_node(&mut self, node: N) {
        self.points.reserve(self.settings.points_per_node);
        for point in self.settings.generate(&node) {
            let index = self.points.partition_point(|existing| existing <= &point);
            self.points.insert(index, point);
            self.settings.observer.included(&self.points[index]);
        }
        debug!(node = %node, points = self.points.len(), "list ring included node");
    }

    fn exclude_node(&mut self, node: &N) {
        let mut removed = Vec::new();
        self.points.retain(|point| {
            if &point.node == node {
                removed.push(point.clone());
                false
            } else {
                true
            }
        });

        for point in &removed {
            self.settings.observer.excluded(point);
        }
        debug!(node = %node, removed = removed.len(), "list ring excluded node");
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
        self.points.clone()
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
