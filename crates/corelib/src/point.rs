//! Hashed points on the ring.
//!
//! # Points Per Node
//!
//! Each node owns many points (100 by default) spread around the ring. This
//! provides:
//!
//! 1. **Better Load Distribution**: more points = smoother spread of addresses
//! 2. **Gradual Rebalancing**: when a node joins or leaves, only the addresses
//!    adjacent to its points move
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(p) per node where p = points per node
//! - **Lookup**: O(log n) where n = total points
//!
//! # Lifecycle Hooks
//!
//! Rings notify a [`PointObserver`] whenever a point joins (`included`) or
//! leaves (`excluded`) the ring. The default observer does nothing; layers
//! that key state by ring point (caches, migration trackers) plug in here.

use crate::hasher::HashFunction;
use crate::node::RingNode;
use std::cmp::Ordering;
use std::fmt;

/// A bare position on the ring.
///
/// Used as the probe when resolving an identifier: the identifier is hashed
/// into a `HashedIdentity` and compared against the ring's points.
///
/// Ordering is ascending by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashedIdentity {
    pub hash: i32,
}

impl HashedIdentity {
    #[inline]
    pub fn new(hash: i32) -> Self {
        Self { hash }
    }

    /// Hashes an identifier into a probe.
    pub fn of(hasher: &dyn HashFunction, id: &[u8]) -> Self {
        Self::new(hasher.hash(id))
    }
}

impl Ord for HashedIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl PartialOrd for HashedIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One of a node's replicated positions on the ring.
///
/// # Invariants
///
/// - Every point belongs to exactly one node
/// - Points order by `(hash, node)`, so two nodes whose points collide on the
///   same hash still sort deterministically
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashedNodePoint<N> {
    /// Position on the ring.
    pub hash: i32,

    /// The node that owns this point.
    pub node: N,
}

impl<N: RingNode> HashedNodePoint<N> {
    #[inline]
    pub fn new(hash: i32, node: N) -> Self {
        Self { hash, node }
    }

    /// Create the `element`-th point of `node`.
    ///
    /// The point key is the node's display form immediately followed by the
    /// element index (`"{node}{element}"`), hashed with `hasher`. Every node of
    /// the grid must derive keys identically.
    ///
    /// # Example
    /// ```rust
    /// use corelib::hasher::Murmur3Hash;
    /// use corelib::point::HashedNodePoint;
    ///
    /// let p0 = HashedNodePoint::from_element(&Murmur3Hash::default(), "node-a".to_string(), 0);
    /// let p1 = HashedNodePoint::from_element(&Murmur3Hash::default(), "node-a".to_string(), 1);
    /// assert_ne!(p0.hash, p1.hash);
    /// ```
    pub fn from_element(hasher: &dyn HashFunction, node: N, element: usize) -> Self {
        let key = format!("{}{}", node, element);
        Self::new(hasher.hash(key.as_bytes()), node)
    }

    /// Generate all `count` points for `node`, in element order.
    pub fn generate(hasher: &dyn HashFunction, node: &N, count: usize) -> Vec<Self> {
        (0..count)
            .map(|element| Self::from_element(hasher, node.clone(), element))
            .collect()
    }

    #[inline]
    pub fn identity(&self) -> HashedIdentity {
        HashedIdentity::new(self.hash)
    }
}

impl<N: RingNode> Ord for HashedNodePoint<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash
            .cmp(&other.hash)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl<N: RingNode> PartialOrd for HashedNodePoint<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N: RingNode> fmt::Display for HashedNodePoint<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point(hash={:08x}, node={})", self.hash, self.node)
    }
}

/// Receives ring membership changes for individual points.
pub trait PointObserver<N>: Send + Sync {
    /// Called after `point` was added to the ring.
    fn included(&self, _point: &HashedNodePoint<N>) {}

    /// Called after `point` was removed from the ring.
    fn excluded(&self, _point: &HashedNodePoint<N>) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl<N> PointObserver<N> for NoopObserver {}
