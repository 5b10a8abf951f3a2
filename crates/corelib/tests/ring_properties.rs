//! Property tests: every ring variant answers identically.

use corelib::hasher::HashKind;
use corelib::node::NodeId;
use corelib::ring::{HashRing, RingBuilder, RingKind};
use proptest::prelude::*;

fn build(kind: RingKind, hash: HashKind, points: usize, nodes: &[String]) -> Box<dyn HashRing<NodeId>> {
    RingBuilder::new()
        .with_points_per_node(points)
        .with_hash(hash)
        .add_nodes(nodes.iter().map(|n| NodeId::new(n.as_str())))
        .build(kind)
}

fn hash_kind() -> impl Strategy<Value = HashKind> {
    prop_oneof![Just(HashKind::Murmur3), Just(HashKind::Md5), Just(HashKind::Xxh3)]
}

proptest! {
    #[test]
    fn prop_variants_agree_on_owner(
        nodes in prop::collection::vec("[a-z]{1,8}", 1..6),
        keys in prop::collection::vec(any::<Vec<u8>>(), 1..64),
        points in 1usize..64,
        hash in hash_kind(),
    ) {
        let array = build(RingKind::Array, hash, points, &nodes);
        let list = build(RingKind::List, hash, points, &nodes);
        let map = build(RingKind::Map, hash, points, &nodes);

        prop_assert_eq!(array.points(), list.points());
        prop_assert_eq!(array.points(), map.points());
        for key in &keys {
            let owner = array.node_of(key);
            prop_assert!(owner.is_some());
            prop_assert_eq!(&owner, &list.node_of(key));
            prop_assert_eq!(&owner, &map.node_of(key));
        }
    }

    #[test]
    fn prop_variants_agree_after_exclusion(
        nodes in prop::collection::vec("[a-z]{1,4}", 2..6),
        victim in any::<prop::sample::Index>(),
        keys in prop::collection::vec("[ -~]{0,24}", 1..32),
    ) {
        let victim = NodeId::new(victim.get(&nodes).as_str());
        let mut rings: Vec<_> = RingKind::ALL
            .iter()
            .map(|kind| build(*kind, HashKind::Murmur3, 16, &nodes))
            .collect();
        for ring in &mut rings {
            ring.exclude_node(&victim);
            prop_assert!(!ring.contains_node(&victim));
        }

        for key in &keys {
            let owner = rings[0].node_of(key.as_bytes());
            prop_assert_ne!(owner.as_ref(), Some(&victim));
            for ring in &rings[1..] {
                prop_assert_eq!(&owner, &ring.node_of(key.as_bytes()));
            }
        }
    }

    #[test]
    fn prop_owner_is_included_node(
        nodes in prop::collection::vec("[a-z0-9]{1,6}", 1..5),
        key in any::<Vec<u8>>(),
    ) {
        let ring = build(RingKind::Array, HashKind::Murmur3, 10, &nodes);
        let owner = ring.node_of(&key).unwrap();
        prop_assert!(nodes.iter().any(|n| n == owner.as_str()));
    }
}
