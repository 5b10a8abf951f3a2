//! Hash functions that place identifiers on the ring.
//!
//! Every node of the grid must compute the same hash for the same identifier,
//! otherwise nodes disagree on ownership. All implementations here are pure
//! functions of the input bytes.

pub mod md5;
pub mod murmur3;
pub mod traits;
pub mod xxh3;

pub use self::md5::Md5Hash;
pub use self::murmur3::Murmur3Hash;
pub use self::traits::{HashFunction, HashKind};
pub use self::xxh3::Xxh3Hash;
