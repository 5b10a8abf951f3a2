//! Consistent hash ring implementation.
//!
//! The ring manages hashed node points and resolves which node owns an
//! identifier: the owner is the first point clockwise of the identifier's
//! hash, wrapping past the highest point back to the lowest.
//!
//! Three structural variants are provided. They differ only in how mutations
//! are paid for and answer [`HashRing::node_of`] identically for identical
//! inclusion sequences:
//!
//! - [`ArrayRing`]: boxed slice, fully rebuilt and re-sorted on every mutation
//! - [`ListRing`]: vector kept sorted by binary-search insertion
//! - [`MapRing`]: ordered map keyed by hash

pub mod array;
pub mod builder;
pub mod list;
pub mod map;
pub mod shared;

pub use array::ArrayRing;
pub use builder::RingBuilder;
pub use list::ListRing;
pub use map::MapRing;
pub use shared::SharedRing;

use crate::error::Error;
use crate::hasher::HashFunction;
use crate::node::RingNode;
use crate::point::{HashedIdentity, HashedNodePoint, NoopObserver, PointObserver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Points generated for each node unless configured otherwise.
pub const DEFAULT_POINTS_PER_NODE: usize = 100;

/// Consistent hashing contract shared by all ring variants.
///
/// # Thread Safety
///
/// Mutations take `&mut self`; a ring shared between threads is wrapped in
/// [`SharedRing`], which serializes membership changes against lookups.
pub trait HashRing<N: RingNode>: Send + Sync {
    /// Add `points_per_node` points for `node`.
    ///
    /// Including a node twice duplicates its points; callers include each
    /// node at most once.
    fn include_node(&mut self, node: N);

    /// Remove every point owned by `node`.
    fn exclude_node(&mut self, node: &N);

    /// Resolve the node owning `id`, or `None` on an empty ring.
    fn node_of(&self, id: &[u8]) -> Option<N>;

    /// Number of points generated per included node.
    fn points_per_node(&self) -> usize;

    /// Total number of points on the ring.
    fn point_count(&self) -> usize;

    /// All points in ascending ring order.
    fn points(&self) -> Vec<HashedNodePoint<N>>;

    /// Name of the hash function placing points and identifiers.
    fn hasher_name(&self) -> &'static str;

    /// Independent copy of this ring, safe to read while the original mutates.
    fn copy(&self) -> Box<dyn HashRing<N>>;

    /// Distinct nodes with at least one point, ascending.
    fn nodes(&self) -> Vec<N> {
        self.points()
            .into_iter()
            .map(|point| point.node)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn contains_node(&self, node: &N) -> bool {
        self.points().iter().any(|point| &point.node == node)
    }

    fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    /// Builder-style inclusion.
    fn with_node(mut self, node: N) -> Self
    where
        Self: Sized,
    {
        self.include_node(node);
        self
    }
}

/// Selects a ring variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingKind {
    #[default]
    Array,
    List,
    Map,
}

impl RingKind {
    pub const ALL: [RingKind; 3] = [RingKind::Array, RingKind::List, RingKind::Map];

    pub fn name(self) -> &'static str {
        match self {
            RingKind::Array => "array",
            RingKind::List => "list",
            RingKind::Map => "map",
        }
    }
}

impl FromStr for RingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "array" => Ok(RingKind::Array),
            "list" => Ok(RingKind::List),
            "map" => Ok(RingKind::Map),
            other => Err(Error::UnknownRing(other.to_string())),
        }
    }
}

impl fmt::Display for RingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings every ring variant carries: how points are made and who hears
/// about them.
#[derive(Clone)]
pub struct RingSettings<N> {
    pub points_per_node: usize,
    pub hasher: Arc<dyn HashFunction>,
    pub observer: Arc<dyn PointObserver<N>>,
}

impl<N: RingNode> RingSettings<N> {
    pub fn new(points_per_node: usize, hasher: Arc<dyn HashFunction>) -> Self {
        Self {
            points_per_node,
            hasher,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PointObserver<N>>) -> Self {
        self.observer = observer;
        self
    }

    pub(crate) fn generate(&self, node: &N) -> Vec<HashedNodePoint<N>> {
        HashedNodePoint::generate(self.hasher.as_ref(), node, self.points_per_node)
    }

    pub(crate) fn probe(&self, id: &[u8]) -> HashedIdentity {
        HashedIdentity::of(self.hasher.as_ref(), id)
    }
}

impl<N> fmt::Debug for RingSettings<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingSettings")
            .field("points_per_node", &self.points_per_node)
            .field("hasher", &self.hasher.name())
            .finish()
    }
}

/// Index of the point owning `probe` in an ascending slice.
///
/// The first point whose hash is `>=` the probe owns it; an exact hit resolves
/// to that point. Past the last point the ring closes back to index 0.
///
/// # Performance
/// - **Time**: O(log n) binary search
pub(crate) fn successor_index<N>(points: &[HashedNodePoint<N>], probe: HashedIdentity) -> Option<usize> {
    if points.is_empty() {
        return None;
    }
    let index = points.partition_point(|point| point.hash < probe.hash);
    if index >= points.len() {
        Some(0)
    } else {
        Some(index)
    }
}
