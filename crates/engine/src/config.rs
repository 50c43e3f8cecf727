//! Game configuration
//!
//! `GameConfig` bundles the field rules with the turn, wave and turret
//! tuning. It is loaded from JSON with every field optional, and can be
//! driven from the environment:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TETROMERGE_CONFIG` | path of a JSON config file |
//! | `TETROMERGE_SEED` | overrides `field.rng_seed` |
//! | `TETROMERGE_MAX_TURNS` | overrides `turn.max_turns` |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use tetromerge_core::error::ConfigError;
use tetromerge_core::FieldConfig;

use crate::types::{
    BASE_HEALTH, BLOCK_ITEM_CHANCE, ENEMY_SPAWN_INTERVAL_MS, ITEMS_PER_TURN, MAX_TURNS,
    TURN_POLL_INTERVAL_MS, WIN_REWARD,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    pub max_turns: u32,
    pub items_per_turn: usize,
    /// Chance that a tray item is a block rather than an expand token
    pub block_chance: f32,
    pub win_reward: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_turns: MAX_TURNS,
            items_per_turn: ITEMS_PER_TURN,
            block_chance: BLOCK_ITEM_CHANCE,
            win_reward: WIN_REWARD,
        }
    }
}

/// Per-turn enemy scaling; each stat is `base + (turn - 1) * per_turn`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub base_count: u32,
    pub count_per_turn: u32,
    pub base_health: f32,
    pub health_per_turn: f32,
    pub base_damage: f32,
    pub damage_per_turn: f32,
    /// Cells per second
    pub base_speed: f32,
    pub speed_per_turn: f32,
    pub spawn_interval_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_count: 3,
            count_per_turn: 2,
            base_health: 50.0,
            health_per_turn: 15.0,
            base_damage: 5.0,
            damage_per_turn: 1.0,
            base_speed: 1.5,
            speed_per_turn: 0.05,
            spawn_interval_ms: ENEMY_SPAWN_INTERVAL_MS,
            poll_interval_ms: TURN_POLL_INTERVAL_MS,
        }
    }
}

impl WaveConfig {
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Per-level turret scaling; each stat is `base + (level - 1) * per_level`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretConfig {
    pub base_damage: f32,
    pub damage_per_level: f32,
    pub base_range: f32,
    pub range_per_level: f32,
    /// Seconds between shots at level 1
    pub base_fire_interval: f32,
    pub fire_interval_per_level: f32,
    pub min_fire_interval: f32,
}

impl Default for TurretConfig {
    fn default() -> Self {
        Self {
            base_damage: 10.0,
            damage_per_level: 5.0,
            base_range: 5.0,
            range_per_level: 1.0,
            base_fire_interval: 1.0,
            fire_interval_per_level: 0.1,
            min_fire_interval: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub field: FieldConfig,
    pub turn: TurnConfig,
    pub wave: WaveConfig,
    pub turret: TurretConfig,
    pub base_health: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            turn: TurnConfig::default(),
            wave: WaveConfig::default(),
            turret: TurretConfig::default(),
            base_health: BASE_HEALTH,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Defaults, then the file in `TETROMERGE_CONFIG`, then scalar overrides
    pub fn from_env() -> Self {
        use std::env;

        let mut config = match env::var("TETROMERGE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()).unwrap_or_else(|e| {
                warn!(path = %path, code = e.code(), error = %e, "config unreadable, using defaults");
                Self::default()
            }),
            _ => Self::default(),
        };

        if let Some(seed) = env::var("TETROMERGE_SEED")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            config.field.rng_seed = seed;
        }
        if let Some(turns) = env::var("TETROMERGE_MAX_TURNS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            config.turn.max_turns = turns;
        }

        config
    }
}
