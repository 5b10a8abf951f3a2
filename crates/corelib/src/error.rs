//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Unknown hash function name
    #[error("Unknown hash function: {0}")]
    UnknownHash(String),
    /// Unknown ring structure name
    #[error("Unknown ring kind: {0}")]
    UnknownRing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HashKind, RingKind};

    #[test]
    fn test_every_variant_comes_from_parsing() {
        let errors = [
            "crc32".parse::<HashKind>().unwrap_err(),
            "tree".parse::<RingKind>().unwrap_err(),
        ];
        for error in errors {
            // Exhaustive: a new variant needs a producer here
            match error {
                Error::UnknownHash(name) => assert_eq!(name, "crc32"),
                Error::UnknownRing(name) => assert_eq!(name, "tree"),
            }
        }
    }
}
