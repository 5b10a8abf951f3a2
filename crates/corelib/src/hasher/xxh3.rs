//! XXH3 hash, truncated to 32 bits.

use crate::hasher::traits::HashFunction;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hash;

impl HashFunction for Xxh3Hash {
    fn hash(&self, id: &[u8]) -> i32 {
        xxh3_64(id) as u32 as i32
    }

    fn name(&self) -> &'static str {
        "Xxh3"
    }
}
