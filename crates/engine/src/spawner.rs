//! Tray items dealt at the start of each player phase

use tracing::debug;

use tetromerge_core::{Field, SimpleRng};

use crate::config::TurnConfig;
use crate::types::{BlockId, BlockKind, WorldPos, MIN_LEVEL};

/// Token that grows the grid cell it is dropped on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandToken {
    pub home: WorldPos,
    pub position: WorldPos,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrayItem {
    Block(BlockId),
    Expand(ExpandToken),
}

#[derive(Debug, Clone)]
pub struct ItemSpawner {
    slots: Vec<WorldPos>,
    block_chance: f32,
    rng: SimpleRng,
}

impl ItemSpawner {
    /// One item is dealt per slot
    pub fn new(slots: Vec<WorldPos>, block_chance: f32, seed: u32) -> Self {
        Self {
            slots,
            block_chance,
            rng: SimpleRng::new(seed),
        }
    }

    /// Evenly spaced slots along a horizontal line centred on x = 0
    pub fn from_config(config: &TurnConfig, y: f32, spacing: f32, seed: u32) -> Self {
        let n = config.items_per_turn;
        let left = -(n.saturating_sub(1) as f32) * spacing / 2.0;
        let slots = (0..n)
            .map(|i| WorldPos::new(left + i as f32 * spacing, y))
            .collect();
        Self::new(slots, config.block_chance, seed)
    }

    pub fn slots(&self) -> &[WorldPos] {
        &self.slots
    }

    /// Deal a fresh tray; blocks are spawned into `field` at their slot
    pub fn deal(&mut self, field: &mut Field) -> Vec<TrayItem> {
        let mut tray = Vec::with_capacity(self.slots.len());
        for &home in &self.slots {
            if self.rng.chance(self.block_chance) {
                let kind = BlockKind::ALL[self.rng.next_range(BlockKind::ALL.len() as u32) as usize];
                tray.push(TrayItem::Block(field.spawn_block(kind, MIN_LEVEL, home)));
            } else {
                tray.push(TrayItem::Expand(ExpandToken {
                    home,
                    position: home,
                }));
            }
        }
        debug!(items = tray.len(), "tray dealt");
        tray
    }
}
