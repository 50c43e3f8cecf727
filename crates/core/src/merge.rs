//! Merge resolution
//!
//! Two blocks of the same kind and level combine: the survivor keeps its
//! anchor, shape and grid and gains a level, the absorbed block is
//! destroyed. A level-up can create a new match, so resolution repeats
//! until no neighbour matches. Every merge removes a block, which bounds the
//! cascade.
//!
//! Lookups go through the grid's owner index, so they cost O(footprint)
//! rather than a scan over every block.

use arrayvec::ArrayVec;
use tracing::{debug, info};

use crate::block::BlockState;
use crate::config::{AdjacencyScope, MaxLevelPolicy};
use crate::error::BlockError;
use crate::events::FieldEvent;
use crate::field::Field;
use crate::shapes::{footprint, Shape};
use crate::types::{BlockId, BlockKind, GridCoord, GridId};

impl Field {
    /// First placed block (other than `exclude`) of `kind`/`level` owning a
    /// cell under `shape` at `anchor`
    ///
    /// Cells are checked in shape order; the first match wins.
    pub fn find_merge_target(
        &self,
        grid: GridId,
        anchor: GridCoord,
        shape: &Shape,
        kind: BlockKind,
        level: u8,
        exclude: BlockId,
    ) -> Option<BlockId> {
        footprint(anchor, shape).into_iter().find_map(|cell| {
            let owner = self.grids.owner_at(grid, cell)?;
            let block = self.blocks.get(&owner)?;
            (owner != exclude && block.is_placed() && block.kind == kind && block.level == level)
                .then_some(owner)
        })
    }

    /// Placed neighbours of `id` with the same kind and level
    ///
    /// With [`AdjacencyScope::Anchor`] only the anchor's four neighbours are
    /// searched; with [`AdjacencyScope::Footprint`] the neighbours of every
    /// footprint cell are.
    pub fn find_adjacent_same(&self, id: BlockId) -> Vec<BlockId> {
        let Some(block) = self.blocks.get(&id) else {
            return Vec::new();
        };
        let Some(at) = block.placement() else {
            return Vec::new();
        };

        let mut probes: ArrayVec<GridCoord, 16> = ArrayVec::new();
        match self.config.adjacency {
            AdjacencyScope::Anchor => probes.extend(at.anchor.neighbors()),
            AdjacencyScope::Footprint => {
                let own = at.cells();
                for cell in own {
                    for n in cell.neighbors() {
                        if !own.contains(&n) && !probes.contains(&n) {
                            probes.push(n);
                        }
                    }
                }
            }
        }

        let mut found = Vec::new();
        for probe in probes {
            let Some(owner) = self.grids.owner_at(at.grid, probe) else {
                continue;
            };
            if owner == id || found.contains(&owner) {
                continue;
            }
            if let Some(other) = self.blocks.get(&owner) {
                if other.is_placed() && other.matches(block) {
                    found.push(owner);
                }
            }
        }
        found
    }

    /// Whether two blocks at `level` may still merge under the level policy
    pub fn level_allows_merge(&self, level: u8) -> bool {
        match self.config.max_level_policy {
            MaxLevelPolicy::Block => level < self.config.max_level,
            MaxLevelPolicy::Clamp => true,
        }
    }

    /// Merge `absorbed` into placed `survivor`, then keep resolving
    ///
    /// Returns the survivor's final level.
    pub fn merge(&mut self, survivor: BlockId, absorbed: BlockId) -> Result<u8, BlockError> {
        let s = self.get(survivor)?;
        let a = self.get(absorbed)?;
        if !s.is_placed() {
            return Err(BlockError::NotPlaced);
        }
        if survivor == absorbed || !s.matches(a) || !self.level_allows_merge(s.level) {
            return Err(BlockError::CannotMerge);
        }
        self.merge_pair(survivor, absorbed);
        self.check_and_merge(survivor);
        Ok(self.get(survivor)?.level)
    }

    /// Repeatedly merge `id` with its first matching neighbour
    ///
    /// Returns the number of merges performed.
    pub fn check_and_merge(&mut self, id: BlockId) -> u32 {
        let mut merges = 0;
        loop {
            let Some(level) = self.blocks.get(&id).map(|b| b.level) else {
                break;
            };
            if !self.level_allows_merge(level) {
                break;
            }
            let Some(other) = self.find_adjacent_same(id).first().copied() else {
                break;
            };
            self.merge_pair(id, other);
            merges += 1;
        }
        if merges > 1 {
            debug!(block = %id, merges, "merge cascade finished");
        }
        merges
    }

    /// Combine without validation; caller guarantees a placed survivor
    pub(crate) fn merge_pair(&mut self, survivor: BlockId, absorbed: BlockId) -> u8 {
        if self.blocks.get(&survivor).is_some_and(|b| b.is_ghost()) {
            if let Err(err) = self.revert_ghost(survivor) {
                debug!(block = %survivor, reason = err.code(), "ghost not reverted before merge");
            }
        }

        let Some(at) = self.blocks.get(&survivor).and_then(|b| b.placement()) else {
            return 0;
        };
        let other = self.blocks.remove(&absorbed);

        self.grids.free(at.grid, at.anchor, &at.shape);
        if let Some(BlockState::Placed { at: their, .. }) = other.as_ref().map(|b| b.state) {
            self.grids.free(their.grid, their.anchor, &their.shape);
        }
        if matches!(
            other.as_ref().map(|b| b.state),
            Some(BlockState::Dragging { from: Some(_), .. })
        ) {
            debug!(block = %absorbed, "lifted block absorbed on drop");
        }

        let max = self.config.max_level;
        let centroid = self.grids.centroid(at.grid, at.anchor, &at.shape);
        let Some(block) = self.blocks.get_mut(&survivor) else {
            return 0;
        };
        block.level = if block.level < max { block.level + 1 } else { max };
        let level = block.level;
        self.grids.occupy_owned(at.grid, at.anchor, &at.shape, survivor);

        self.events.push(FieldEvent::Merged {
            survivor,
            absorbed,
            level,
            centroid,
        });
        info!(survivor = %survivor, absorbed = %absorbed, level, grid = ?at.grid, "blocks merged");
        level
    }
}
