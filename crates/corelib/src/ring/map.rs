//! Sorted-map ring.
//!
//! Points are indexed by hash in a `BTreeMap`. A hash shared by several
//! points keeps its nodes in an ascending bucket, so lookups resolve
//! collisions exactly like the slice-based variants do.

use super::{HashRing, RingSettings, DEFAULT_POINTS_PER_NODE};
use crate::hasher::{HashFunction, Md5Hash, Murmur3Hash};
use crate::node::RingNode;
use crate::point::HashedNodePoint;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct MapRing<N: RingNode> {
    settings: RingSettings<N>,
    buckets: BTreeMap<i32, Vec<N>>,
    len: usize,
}

impl<N: RingNode> MapRing<N> {
    pub fn new(settings: RingSettings<N>) -> Self {
        Self {
            settings,
            buckets: BTreeMap::new(),
            len: 0,
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

impl<N: RingNode> Default for MapRing<N> {
    fn default() -> Self {
        Self::murmur(DEFAULT_POINTS_PER_NODE)
    }
}

impl<N: RingNode> HashRing<N> for MapRing<N> {
    /// # Performance
    /// - **Time**: O(p log n) map inserts
    fn include_node(&mut self, node: N) {
        for point in self.settings.generate(&node) {
            let bucket = self.buckets.entry(point.hash).or_default();
            let index = bucket.partition_point(|existing| existing <= &point.node);
            bucket.insert(index, point.node.clone());
            self.len += 1;
            self.settings.observer.included(&point);
        }
        debug!(node = %node, points = self.len, "map ring included node");
    }

    fn exclude_node(&mut self, node: &N) {
        let mut removed = Vec::new();
        self.buckets.retain(|hash, bucket| {
            bucket.retain(|owner| {
                if owner == node {
                    removed.push(HashedNodePoint::new(*hash, owner.clone()));
                    false
                } else {
                    true
                }
            });
            !bucket.is_empty()
        });
        self.len -= removed.len();

        for point in &removed {
            self.settings.observer.excluded(point);
        }
        debug!(node = %node, removed = removed.len(), "map ring excluded node");
    }

    fn node_of(&self, id: &[u8]) -> Option<N> {
        let probe = self.settings.probe(id);
        self.buckets
            .range(probe.hash..)
            .next()
            .or_else(|| self.buckets.iter().next())
            .and_then(|(_, bucket)| bucket.first().cloned())
    }

    fn points_per_node(&self) -> usize {
        self.settings.points_per_node
    }

    fn point_count(&self) -> usize {
        self.len
    }

    fn points(&self) -> Vec<HashedNodePoint<N>> {
        self.buckets
            .iter()
            .flat_map(|(hash, bucket)| {
                bucket
                    .iter()
                    .map(move |node| HashedNodePoint::new(*hash, node.clone()))
            })
            .collect()
    }

    fn hasher_name(&self) -> &'static str {
        self.settings.hasher.name()
    }

    fn copy(&self) -> Box<dyn HashRing<N>> {
        Box::new(self.clone())
    }

    fn contains_node(&self, node: &N) -> bool {
        self.buckets.values().any(|bucket| bucket.contains(node))
    }
}
