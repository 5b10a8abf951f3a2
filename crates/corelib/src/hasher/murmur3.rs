//! MurmurHash3 (x86, 32-bit).
//!
//! The preferred ring hash: fast, well distributed, and byte-for-byte
//! reproducible on every node.

use crate::hasher::traits::HashFunction;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// Seed used by the grid unless configured otherwise.
pub const DEFAULT_SEED: u32 = 31;

/// Seeded Murmur3 hash function.
#[derive(Clone, Copy, Debug)]
pub struct Murmur3Hash {
    seed: u32,
}

impl Murmur3Hash {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for Murmur3Hash {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl HashFunction for Murmur3Hash {
    fn hash(&self, id: &[u8]) -> i32 {
        murmur3_32(id, self.seed) as i32
    }

    fn name(&self) -> &'static str {
        "Murmur3"
    }
}

#[inline]
fn mix_k1(k1: u32) -> u32 {
    k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Raw MurmurHash3_x86_32.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h1 = seed;
    let mut blocks = data.chunks_exact(4);

    for block in &mut blocks {
        let k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h1 ^= mix_k1(k1);
        h1 = h1.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    let mut k1 = 0u32;
    if tail.len() >= 3 {
        k1 ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        k1 ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        k1 ^= tail[0] as u32;
        h1 ^= mix_k1(k1);
    }

    h1 ^= data.len() as u32;
    fmix32(h1)
}
