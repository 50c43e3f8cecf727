//! Field configuration
//!
//! Every field has a default, so a partial JSON document only overrides what
//! it names:
//!
//! ```
//! use tetromerge_core::config::{FieldConfig, MaxLevelPolicy};
//!
//! let cfg = FieldConfig::from_json_str(r#"{ "seed_width": 7, "max_level_policy": "clamp" }"#).unwrap();
//! assert_eq!(cfg.seed_width, 7);
//! assert_eq!(cfg.seed_height, 5);
//! assert_eq!(cfg.max_level_policy, MaxLevelPolicy::Clamp);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{
    CELL_SIZE, GRID_SEPARATION, MAX_LEVEL, SEED_HEIGHT, SEED_WIDTH, TAP_THRESHOLD_MS,
};

/// What happens when two blocks already at the level cap touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxLevelPolicy {
    /// Blocks at the cap never merge
    #[default]
    Block,
    /// The absorbed block is destroyed, the survivor stays at the cap
    Clamp,
}

/// Which neighbours are searched for same-kind same-level blocks after a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjacencyScope {
    /// Only the four neighbours of the anchor cell
    #[default]
    Anchor,
    /// Neighbours of every footprint cell
    Footprint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub seed_width: u32,
    pub seed_height: u32,
    pub cell_size: f32,
    pub grid_separation: f32,
    pub max_level: u8,
    pub max_level_policy: MaxLevelPolicy,
    pub adjacency: AdjacencyScope,
    pub rng_seed: u32,
    pub tap_threshold_ms: u32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            seed_width: SEED_WIDTH,
            seed_height: SEED_HEIGHT,
            cell_size: CELL_SIZE,
            grid_separation: GRID_SEPARATION,
            max_level: MAX_LEVEL,
            max_level_policy: MaxLevelPolicy::default(),
            adjacency: AdjacencyScope::default(),
            rng_seed: 1,
            tap_threshold_ms: TAP_THRESHOLD_MS,
        }
    }
}

impl FieldConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = FieldConfig::default();
        assert_eq!(cfg.seed_width, 5);
        assert_eq!(cfg.max_level, 9);
        assert_eq!(cfg.max_level_policy, MaxLevelPolicy::Block);
        assert_eq!(cfg.adjacency, AdjacencyScope::Anchor);
        assert_eq!(cfg.tap_threshold_ms, 200);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(FieldConfig::from_json_str("{}").unwrap(), FieldConfig::default());
    }

    #[test]
    fn bad_policy_is_rejected() {
        let err = FieldConfig::from_json_str(r#"{ "adjacency": "diagonal" }"#).unwrap_err();
        assert_eq!(err.code(), "config_parse");
    }
}
