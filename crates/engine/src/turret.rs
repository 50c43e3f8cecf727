//! Turret attachments - one per placed block
//!
//! The registry follows the field's event stream: a turret appears when a
//! block is placed, moves with the block's centroid, takes the survivor's
//! level on a merge and disappears with its block. Shots are instant hits on
//! the closest enemy in range.

use std::collections::BTreeMap;

use tracing::debug;

use tetromerge_core::FieldEvent;

use crate::config::TurretConfig;
use crate::enemy::EnemyRoster;
use crate::types::{BlockId, WorldPos};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretStats {
    pub damage: f32,
    pub range: f32,
    /// Seconds between shots
    pub fire_interval: f32,
}

impl TurretStats {
    pub fn profile(config: &TurretConfig, level: u8) -> Self {
        let steps = level.saturating_sub(1) as f32;
        Self {
            damage: config.base_damage + steps * config.damage_per_level,
            range: config.base_range + steps * config.range_per_level,
            fire_interval: (config.base_fire_interval - steps * config.fire_interval_per_level)
                .max(config.min_fire_interval),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turret {
    pub block: BlockId,
    pub level: u8,
    pub position: WorldPos,
    pub stats: TurretStats,
    cooldown: f32,
}

#[derive(Debug, Clone, Default)]
pub struct TurretRegistry {
    config: TurretConfig,
    turrets: BTreeMap<BlockId, Turret>,
}

impl TurretRegistry {
    pub fn new(config: TurretConfig) -> Self {
        Self {
            config,
            turrets: BTreeMap::new(),
        }
    }

    pub fn get(&self, block: BlockId) -> Option<&Turret> {
        self.turrets.get(&block)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turret> {
        self.turrets.values()
    }

    pub fn len(&self) -> usize {
        self.turrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turrets.is_empty()
    }

    pub fn clear(&mut self) {
        self.turrets.clear();
    }

    fn spawn(&mut self, block: BlockId, level: u8, position: WorldPos) {
        let stats = TurretStats::profile(&self.config, level);
        // Replaces any previous turret for the block
        self.turrets.insert(
            block,
            Turret {
                block,
                level,
                position,
                stats,
                cooldown: 0.0,
            },
        );
    }

    /// Keep turrets in step with one field event
    pub fn apply(&mut self, event: &FieldEvent) {
        match *event {
            FieldEvent::Placed {
                block,
                centroid,
                level,
                ..
            } => self.spawn(block, level, centroid),
            FieldEvent::Moved { block, centroid } => {
                if let Some(t) = self.turrets.get_mut(&block) {
                    t.position = centroid;
                }
            }
            FieldEvent::Merged {
                survivor,
                absorbed,
                level,
                centroid,
            } => {
                self.turrets.remove(&absorbed);
                self.spawn(survivor, level, centroid);
                debug!(block = %survivor, level, "turret upgraded");
            }
            FieldEvent::Removed { block } => {
                self.turrets.remove(&block);
            }
            FieldEvent::GhostChanged { .. }
            | FieldEvent::Expanded { .. }
            | FieldEvent::DeleteZoneShown
            | FieldEvent::DeleteZoneHidden => {}
        }
    }

    /// Advance cooldowns by `dt` seconds and fire where possible
    ///
    /// Returns the number of enemies killed.
    pub fn fire(&mut self, dt: f32, roster: &mut EnemyRoster) -> u32 {
        let mut kills = 0;
        for t in self.turrets.values_mut() {
            t.cooldown = (t.cooldown - dt).max(0.0);
            if t.cooldown > 0.0 {
                continue;
            }
            let Some(target) = roster.closest_in_range(t.position, t.stats.range) else {
                continue;
            };
            if roster.hit(target, t.stats.damage) {
                kills += 1;
            }
            t.cooldown = t.stats.fire_interval;
        }
        kills
    }
}
