//! Core hash function trait definitions.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

/// Maps an identifier to a 32-bit position on the ring.
///
/// Hash functions are stateless (beyond a seed) and thread-safe, allowing
/// concurrent lookups without synchronization overhead.
pub trait HashFunction: Send + Sync + Debug + 'static {
    /// Hashes the identifier bytes.
    ///
    /// # Arguments
    ///
    /// * `id` - The identifier, usually the UTF-8 bytes of an address
    ///
    /// # Returns
    ///
    /// The signed 32-bit ring position
    fn hash(&self, id: &[u8]) -> i32;

    /// Returns the name of this hash function.
    fn name(&self) -> &'static str;
}

/// Selects one of the built-in hash functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Md5,
    #[default]
    #[serde(alias = "murmur")]
    Murmur3,
    Xxh3,
}

impl HashKind {
    /// Instantiates the hash function. `seed` only applies to Murmur3.
    pub fn build(self, seed: u32) -> Arc<dyn HashFunction> {
        match self {
            HashKind::Md5 => Arc::new(super::Md5Hash),
            HashKind::Murmur3 => Arc::new(super::Murmur3Hash::new(seed)),
            HashKind::Xxh3 => Arc::new(super::Xxh3Hash),
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashKind::Md5 => "md5",
            HashKind::Murmur3 => "murmur3",
            HashKind::Xxh3 => "xxh3",
        })
    }
}

impl FromStr for HashKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(HashKind::Md5),
            "murmur" | "murmur3" => Ok(HashKind::Murmur3),
            "xxh3" | "xxhash" => Ok(HashKind::Xxh3),
            other => Err(Error::UnknownHash(other.to_string())),
        }
    }
}
