//! MD5-derived hash, kept for compatibility with rings built by older nodes.

use crate::hasher::traits::HashFunction;
use ::md5::{Digest, Md5};

/// First four bytes of the MD5 digest, read little-endian.
#[derive(Clone, Copy, Debug, Default)]
pub struct Md5Hash;

impl HashFunction for Md5Hash {
    fn hash(&self, id: &[u8]) -> i32 {
        let digest = Md5::digest(id);
        i32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    fn name(&self) -> &'static str {
        "Md5"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_empty_input() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(
            Md5Hash.hash(b""),
            i32::from_le_bytes([0xd4, 0x1d, 0x8c, 0xd9])
        );
    }

    #[test]
    fn test_md5_known_digest() {
        // md5("abc") = 900150983cd24fb0d6963f7d28e17f72
        assert_eq!(
            Md5Hash.hash(b"abc"),
            i32::from_le_bytes([0x90, 0x01, 0x50, 0x98])
        );
    }
}
