//! Core library for the grid's consistent hashing.
//!
//! This crate provides the fundamental abstractions for placing actor
//! addresses on cluster nodes:
//! - Node identifiers
//! - Hash functions (Murmur3, MD5, XXH3)
//! - Hashed node points and their lifecycle hooks
//! - Hash ring variants (array, sorted list, sorted map) and a shared,
//!   lock-guarded ring for concurrent readers

pub mod error;
pub mod hasher;
pub mod node;
pub mod point;
pub mod ring;

pub use error::{Error, Result};
pub use hasher::{HashFunction, HashKind};
pub use node::{NodeId, RingNode};
pub use point::{HashedIdentity, HashedNodePoint, NoopObserver, PointObserver};
pub use ring::{ArrayRing, HashRing, ListRing, MapRing, RingBuilder, RingKind, SharedRing};
