//! Comprehensive tests for the hash ring implementations.
//!
//! # Test Strategy
//!
//! 1. **Basic functionality**: Empty ring, include/lookup, exclude
//! 2. **Multiple nodes**: Distribution, consistency
//! 3. **Edge cases**: Wraparound, exact hits, single node, duplicate inclusion
//! 4. **Thread safety**: Concurrent lookups against a shared ring

use corelib::hasher::{HashFunction, Md5Hash, Murmur3Hash};
use corelib::node::NodeId;
use corelib::point::{HashedNodePoint, PointObserver};
use corelib::ring::{ArrayRing, HashRing, ListRing, MapRing, RingBuilder, RingKind, SharedRing};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn all_variants(points_per_node: usize) -> Vec<Box<dyn HashRing<NodeId>>> {
    RingKind::ALL
        .iter()
        .map(|kind| {
            RingBuilder::new()
                .with_points_per_node(points_per_node)
                .build(*kind)
        })
        .collect()
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[test]
fn test_empty_ring_lookup() {
    // An empty ring has no owner for anything
    for ring in all_variants(100) {
        assert_eq!(ring.node_of(b"key1"), None);
        assert_eq!(ring.node_of(b""), None);
        assert_eq!(ring.point_count(), 0);
        assert!(ring.nodes().is_empty());
        assert!(ring.is_empty());
    }
}

#[test]
fn test_include_node_and_lookup() {
    for mut ring in all_variants(4) {
        ring.include_node(NodeId::from("node1"));

        assert_eq!(ring.point_count(), 4);
        assert_eq!(ring.nodes(), vec![NodeId::from("node1")]);
        assert!(ring.contains_node(&NodeId::from("node1")));

        let result = ring.node_of(b"test-key");
        assert_eq!(result, Some(NodeId::from("node1")), "Should return the only node");
    }
}

#[test]
fn test_exclude_node() {
    for mut ring in all_variants(4) {
        ring.include_node(NodeId::from("node1"));
        ring.include_node(NodeId::from("node2"));
        assert_eq!(ring.point_count(), 8);

        ring.exclude_node(&NodeId::from("node1"));

        assert_eq!(ring.point_count(), 4, "Only node2's points remain");
        assert!(!ring.contains_node(&NodeId::from("node1")));
        assert_eq!(ring.node_of(b"some-key"), Some(NodeId::from("node2")));

        // Excluding an unknown node changes nothing
        ring.exclude_node(&NodeId::from("node999"));
        assert_eq!(ring.point_count(), 4);
    }
}

// ============================================================================
// Multiple Nodes Tests
// ============================================================================

#[test]
fn test_multiple_nodes() {
    let nodes = [NodeId::from("a"), NodeId::from("b"), NodeId::from("c")];
    for mut ring in all_variants(100) {
        for node in &nodes {
            ring.include_node(node.clone());
        }
        assert_eq!(ring.point_count(), 300);

        let mut owners = HashSet::new();
        for i in 0..1000 {
            let owner = ring.node_of(format!("actor-{i}").as_bytes());
            let owner = owner.expect("non-empty ring always has an owner");
            assert!(nodes.contains(&owner));
            owners.insert(owner);
        }
        // 1000 addresses over 300 points touch every node
        assert_eq!(owners.len(), 3);
    }
}

#[test]
fn test_consistent_lookup() {
    let ring = ArrayRing::murmur(100)
        .with_node(NodeId::from("node1"))
        .with_node(NodeId::from("node2"));

    let first = ring.node_of(b"consistent-key");
    for _ in 0..10 {
        assert_eq!(ring.node_of(b"consistent-key"), first, "Same key should map to same node");
    }
}

#[test]
fn test_independent_rings_agree() {
    // Two nodes of the grid build their rings separately
    let on_a = ListRing::murmur(100)
        .with_node(NodeId::from("node-a"))
        .with_node(NodeId::from("node-b"));
    let on_b = ListRing::murmur(100)
        .with_node(NodeId::from("node-a"))
        .with_node(NodeId::from("node-b"));

    assert_eq!(on_a.node_of(b"order-42"), on_b.node_of(b"order-42"));
}

#[test]
fn test_exclusion_only_moves_excluded_keys() {
    let mut ring = MapRing::murmur(100)
        .with_node(NodeId::from("a"))
        .with_node(NodeId::from("b"))
        .with_node(NodeId::from("c"));

    let before: Vec<_> = (0..500)
        .map(|i| ring.node_of(format!("k{i}").as_bytes()))
        .collect();

    ring.exclude_node(&NodeId::from("c"));

    for (i, owner) in before.into_iter().enumerate() {
        let after = ring.node_of(format!("k{i}").as_bytes());
        if owner != Some(NodeId::from("c")) {
            assert_eq!(after, owner, "keys not owned by the excluded node stay put");
        } else {
            assert_ne!(after, Some(NodeId::from("c")));
        }
    }
}

// ============================================================================
// Ring Builder Tests
// ============================================================================

#[test]
fn test_ring_builder_default() {
    let ring = RingBuilder::new()
        .add_node(NodeId::from("node1"))
        .add_node(NodeId::from("node2"))
        .build_array();

    assert!(ring.node_of(b"key").is_some());
    assert_eq!(ring.nodes().len(), 2);
    // Default is 100 points per node, Murmur3 placement
    assert_eq!(ring.point_count(), 200);
    assert_eq!(ring.points_per_node(), 100);
    assert_eq!(ring.hasher_name(), "Murmur3");
}

#[test]
fn test_ring_builder_custom() {
    let ring = RingBuilder::new()
        .with_points_per_node(8)
        .with_hash(corelib::HashKind::Md5)
        .add_nodes([NodeId::from("node1"), NodeId::from("node2")])
        .build(RingKind::List);

    assert_eq!(ring.point_count(), 16);
    assert_eq!(ring.hasher_name(), "Md5");
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_wraps_past_highest_point() {
    let hasher = Murmur3Hash::default();
    for mut ring in all_variants(100) {
        for node in ["A", "B", "C"] {
            ring.include_node(NodeId::from(node));
        }
        let points = ring.points();
        let lowest = points.first().unwrap().clone();
        let highest = points.last().unwrap().hash;

        let above: Vec<String> = (0..100_000)
            .map(|i| format!("probe-{i}"))
            .filter(|key| hasher.hash(key.as_bytes()) > highest)
            .collect();
        assert!(!above.is_empty(), "some probes must land past the last point");

        for key in above {
            assert_eq!(ring.node_of(key.as_bytes()), Some(lowest.node.clone()));
        }
    }
}

#[test]
fn test_exact_hash_resolves_to_that_point() {
    let hasher = Md5Hash;
    let ring = ArrayRing::md5(100)
        .with_node(NodeId::from("x"))
        .with_node(NodeId::from("y"));

    // The key of a point hashes exactly onto that point
    for element in [0, 17, 99] {
        let key = format!("y{element}");
        let point = HashedNodePoint::from_element(&hasher, NodeId::from("y"), element);
        assert_eq!(hasher.hash(key.as_bytes()), point.hash);
        assert_eq!(ring.node_of(key.as_bytes()), Some(NodeId::from("y")));
    }
}

#[test]
fn test_single_node() {
    let ring = ListRing::md5(4).with_node(NodeId::from("node1"));

    for key in [&b"key1"[..], b"key2", b"key3", b"very-long-key-name"] {
        assert_eq!(ring.node_of(key), Some(NodeId::from("node1")), "All keys map to single node");
    }
}

#[test]
fn test_include_exclude_include() {
    for mut ring in all_variants(4) {
        ring.include_node(NodeId::from("node1"));
        ring.exclude_node(&NodeId::from("node1"));
        assert!(ring.is_empty());

        ring.include_node(NodeId::from("node1"));
        assert_eq!(ring.point_count(), 4);
        assert!(ring.node_of(b"key").is_some());
    }
}

#[test]
fn test_duplicate_include_duplicates_points() {
    for mut ring in all_variants(4) {
        ring.include_node(NodeId::from("node1"));
        ring.include_node(NodeId::from("node1"));

        assert_eq!(ring.point_count(), 8, "Re-inclusion is not guarded");
        assert_eq!(ring.nodes().len(), 1);

        // Exclusion removes every copy
        ring.exclude_node(&NodeId::from("node1"));
        assert!(ring.is_empty());
    }
}

// ============================================================================
// Lifecycle Hooks
// ============================================================================

#[derive(Default)]
struct CountingObserver {
    included: AtomicUsize,
    excluded: AtomicUsize,
}

impl PointObserver<NodeId> for CountingObserver {
    fn included(&self, _point: &HashedNodePoint<NodeId>) {
        self.included.fetch_add(1, Ordering::SeqCst);
    }

    fn excluded(&self, point: &HashedNodePoint<NodeId>) {
        assert_eq!(point.node, NodeId::from("gone"));
        self.excluded.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_observer_sees_every_point() {
    for kind in RingKind::ALL {
        let observer = Arc::new(CountingObserver::default());
        let mut ring = RingBuilder::<NodeId>::new()
            .with_points_per_node(10)
            .with_observer(observer.clone())
            .add_node(NodeId::from("stays"))
            .add_node(NodeId::from("gone"))
            .build(kind);

        assert_eq!(observer.included.load(Ordering::SeqCst), 20);
        assert_eq!(observer.excluded.load(Ordering::SeqCst), 0);

        ring.exclude_node(&NodeId::from("gone"));
        assert_eq!(observer.excluded.load(Ordering::SeqCst), 10, "{kind}");
    }
}

// ============================================================================
// Thread Safety
// ============================================================================

#[test]
fn test_concurrent_lookups_agree() {
    let ring = Arc::new(SharedRing::new(
        RingBuilder::new()
            .add_nodes(["a", "b", "c", "d"].map(NodeId::from))
            .build(RingKind::Array),
    ));

    let results: Vec<Option<NodeId>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let ring = Arc::clone(&ring);
                scope.spawn(move || {
                    (0..10)
                        .map(|_| ring.node_of(b"contended-key"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(results.len(), 1000);
    let distinct: HashSet<_> = results.into_iter().collect();
    assert_eq!(distinct.len(), 1, "every concurrent lookup sees the same owner");
    assert!(distinct.iter().next().unwrap().is_some());
}
