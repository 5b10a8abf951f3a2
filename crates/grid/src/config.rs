//! Grid configuration.
//!
//! Every field has a default, so a JSON file only needs the fields it
//! changes:
//!
//! ```json
//! { "points_per_node": 200, "hash": "md5", "ring": "map" }
//! ```

use crate::codec::CodecKind;
use crate::error::{GridError, Result};
use corelib::hasher::murmur3::DEFAULT_SEED;
use corelib::ring::DEFAULT_POINTS_PER_NODE;
use corelib::{HashFunction, HashKind, RingKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Ring points generated for each node.
    pub points_per_node: usize,

    /// Hash placing points and addresses on the ring.
    pub hash: HashKind,

    /// Seed for the Murmur3 hash; ignored by the others.
    pub murmur_seed: u32,

    /// Ring variant.
    pub ring: RingKind,

    /// Wire encoding of grid messages.
    pub codec: CodecKind,

    /// How long a request waits for its answer.
    pub answer_timeout_ms: u64,

    /// How long buffered work is kept alive.
    pub hold_timeout_ms: u64,

    /// How often expired buffered work is released.
    pub sweep_interval_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            points_per_node: DEFAULT_POINTS_PER_NODE,
            hash: HashKind::Murmur3,
            murmur_seed: DEFAULT_SEED,
            ring: RingKind::Array,
            codec: CodecKind::Json,
            answer_timeout_ms: 4000,
            hold_timeout_ms: 20_000,
            sweep_interval_ms: 1000,
        }
    }
}

impl GridConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| GridError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.points_per_node == 0 {
            return Err(GridError::Config("points_per_node must be positive".to_string()));
        }
        for (name, value) in [
            ("answer_timeout_ms", self.answer_timeout_ms),
            ("hold_timeout_ms", self.hold_timeout_ms),
            ("sweep_interval_ms", self.sweep_interval_ms),
        ] {
            if value == 0 {
                return Err(GridError::Config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    pub fn hasher(&self) -> Arc<dyn HashFunction> {
        self.hash.build(self.murmur_seed)
    }

    pub fn answer_timeout(&self) -> Duration {
        Duration::from_millis(self.answer_timeout_ms)
    }

    pub fn hold_timeout(&self) -> Duration {
        Duration::from_millis(self.hold_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GridConfig::default();
        assert_eq!(config.points_per_node, 100);
        assert_eq!(config.hash, HashKind::Murmur3);
        assert_eq!(config.murmur_seed, 31);
        assert_eq!(config.answer_timeout(), Duration::from_millis(4000));
        assert_eq!(config.hold_timeout(), Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            GridConfig::from_json_str(r#"{ "points_per_node": 8, "hash": "md5", "ring": "map" }"#)
                .unwrap();
        assert_eq!(config.points_per_node, 8);
        assert_eq!(config.hash, HashKind::Md5);
        assert_eq!(config.ring, RingKind::Map);
        assert_eq!(config.codec, CodecKind::Json);
        assert_eq!(config.sweep_interval_ms, 1000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            GridConfig::from_json_str(r#"{ "points_per_node": 0 }"#),
            Err(GridError::Config(_))
        ));
        assert!(matches!(
            GridConfig::from_json_str(r#"{ "answer_timeout_ms": 0 }"#),
            Err(GridError::Config(_))
        ));
        assert!(matches!(
            GridConfig::from_json_str(r#"{ "hash": "crc32" }"#),
            Err(GridError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            GridConfig::from_json_file("/definitely/not/here.json"),
            Err(GridError::Io(_))
        ));
    }
}
