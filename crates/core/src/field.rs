//! Field module - block registry and placement controller
//!
//! [`Field`] owns the two grids, every block, the seeded RNG and the outgoing
//! event queue. Every block operation is a method taking a [`BlockId`]; the
//! merge and ghost-rotation operations live in [`merge`](crate::merge) and
//! [`ghost`](crate::ghost) as further `impl Field` blocks.
//!
//! # Drag lifecycle
//!
//! 1. [`begin_drag`](Field::begin_drag) lifts a placed block: its placement
//!    is saved and its cells are freed immediately.
//! 2. [`drag_to`](Field::drag_to) only moves the visual position.
//! 3. [`end_drag`](Field::end_drag) resolves the drop, in order: delete zone
//!    (lifted blocks only), merge into a matching block under the footprint,
//!    plain placement, restore to the saved placement, return to the tray.
//!
//! Only one block may be dragged at a time. A failed drop of a lifted block
//! re-occupies exactly the saved cells; if something took them during the
//! drag the block is destroyed instead, so a drag never leaks or steals
//! occupancy.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::block::{BlockState, PlacedBlock, Placement};
use crate::config::FieldConfig;
use crate::error::{BlockError, ExpandRejection};
use crate::events::FieldEvent;
use crate::grid::{ExpandReport, GridStore};
use crate::rng::SimpleRng;
use crate::shapes::{next_rotation, rotate90};
use crate::types::{BlockId, BlockKind, GridCoord, GridId, WorldPos, MIN_LEVEL};
use crate::zone::{DeleteZone, NoZone};

/// How a drop was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released over the delete zone, or its saved cells were taken; the
    /// block is gone
    Deleted,
    /// Absorbed by `into`, which is now at `level`
    Merged { into: BlockId, level: u8 },
    Placed { grid: GridId, anchor: GridCoord },
    /// Put back exactly where it was lifted from
    Restored,
    /// Never-placed block went back to its tray position
    Returned,
}

pub struct Field {
    pub(crate) config: FieldConfig,
    pub(crate) grids: GridStore,
    pub(crate) blocks: BTreeMap<BlockId, PlacedBlock>,
    next_id: u32,
    pub(crate) rng: SimpleRng,
    pub(crate) events: Vec<FieldEvent>,
    zone: Box<dyn DeleteZone>,
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("blocks", &self.blocks.len())
            .field("cells_a", &self.grids.cell_count(GridId::A))
            .field("cells_b", &self.grids.cell_count(GridId::B))
            .finish()
    }
}

impl Field {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            grids: GridStore::new(&config),
            rng: SimpleRng::new(config.rng_seed),
            config,
            blocks: BTreeMap::new(),
            next_id: 1,
            events: Vec::new(),
            zone: Box::new(NoZone),
        }
    }

    pub fn with_delete_zone(mut self, zone: impl DeleteZone + 'static) -> Self {
        self.zone = Box::new(zone);
        self
    }

    pub fn set_delete_zone(&mut self, zone: impl DeleteZone + 'static) {
        self.zone = Box::new(zone);
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn grids(&self) -> &GridStore {
        &self.grids
    }

    pub fn block(&self, id: BlockId) -> Option<&PlacedBlock> {
        self.blocks.get(&id)
    }

    /// Blocks in id (creation) order
    pub fn blocks(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block owning the cell, including a ghosted block's reserved footprint
    pub fn block_at(&self, grid: GridId, coord: GridCoord) -> Option<BlockId> {
        self.grids.owner_at(grid, coord)
    }

    /// Block currently being dragged, if any
    pub fn dragging(&self) -> Option<BlockId> {
        self.blocks.values().find(|b| b.is_dragging()).map(|b| b.id)
    }

    /// Drain queued collaborator notifications
    pub fn take_events(&mut self) -> Vec<FieldEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn get(&self, id: BlockId) -> Result<&PlacedBlock, BlockError> {
        self.blocks.get(&id).ok_or(BlockError::UnknownBlock(id))
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Result<&mut PlacedBlock, BlockError> {
        self.blocks.get_mut(&id).ok_or(BlockError::UnknownBlock(id))
    }

    // ---- lifecycle ----

    /// Create an unplaced block at `home`; level is clamped to `1..=max_level`
    pub fn spawn_block(&mut self, kind: BlockKind, level: u8, home: WorldPos) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        let level = level.clamp(MIN_LEVEL, self.config.max_level.max(MIN_LEVEL));
        self.blocks
            .insert(id, PlacedBlock::new(id, kind, level, home));
        debug!(block = %id, kind = kind.as_str(), level, "block spawned");
        id
    }

    /// Destroy a block, releasing any cells it holds
    pub fn remove_block(&mut self, id: BlockId) -> Result<(), BlockError> {
        let block = self.blocks.remove(&id).ok_or(BlockError::UnknownBlock(id))?;
        if let BlockState::Placed { at, .. } = block.state {
            self.grids.free(at.grid, at.anchor, &at.shape);
        }
        if matches!(block.state, BlockState::Dragging { from: Some(_), .. }) {
            self.events.push(FieldEvent::DeleteZoneHidden);
        }
        self.events.push(FieldEvent::Removed { block: id });
        debug!(block = %id, "block removed");
        Ok(())
    }

    /// Rotate a block sitting in the tray; no grid interaction
    pub fn rotate(&mut self, id: BlockId) -> Result<u8, BlockError> {
        let block = self.get_mut(id)?;
        match block.state {
            BlockState::Unplaced => {}
            BlockState::Placed { .. } => return Err(BlockError::AlreadyPlaced),
            BlockState::Dragging { .. } => return Err(BlockError::AlreadyDragging),
        }
        block.rotation = next_rotation(block.rotation);
        block.shape = rotate90(block.shape);
        Ok(block.rotation)
    }

    /// Place an unplaced block directly, then resolve merges
    ///
    /// Returns `Ok(false)` when the cells are not available.
    pub fn place_at(
        &mut self,
        id: BlockId,
        grid: GridId,
        anchor: GridCoord,
    ) -> Result<bool, BlockError> {
        let block = self.get(id)?;
        match block.state {
            BlockState::Unplaced => {}
            BlockState::Placed { .. } => return Err(BlockError::AlreadyPlaced),
            BlockState::Dragging { .. } => return Err(BlockError::AlreadyDragging),
        }
        let (shape, rotation) = (block.shape, block.rotation);
        if let Err(why) = self.grids.check_place(grid, anchor, &shape) {
            debug!(block = %id, grid = ?grid, anchor = %anchor, reason = why.code(), "placement rejected");
            return Ok(false);
        }
        self.commit(
            id,
            Placement {
                grid,
                anchor,
                shape,
                rotation,
            },
        );
        self.check_and_merge(id);
        Ok(true)
    }

    /// Occupy `at` for `id` and mark it placed
    pub(crate) fn commit(&mut self, id: BlockId, at: Placement) {
        self.grids.occupy_owned(at.grid, at.anchor, &at.shape, id);
        let centroid = self.grids.centroid(at.grid, at.anchor, &at.shape);
        let Some(block) = self.blocks.get_mut(&id) else {
            return;
        };
        block.shape = at.shape;
        block.rotation = at.rotation;
        block.state = BlockState::Placed { at, ghost: false };
        block.position = centroid;
        let level = block.level;
        self.events.push(FieldEvent::Placed {
            block: id,
            grid: at.grid,
            centroid,
            level,
        });
        debug!(block = %id, grid = ?at.grid, anchor = %at.anchor, level, "block placed");
    }

    // ---- drag ----

    /// Pick a block up
    ///
    /// A ghosted block is reverted first. A placed block's cells are freed
    /// and its placement saved for recovery. Fails with
    /// [`BlockError::DragInProgress`] while another block is lifted.
    pub fn begin_drag(&mut self, id: BlockId) -> Result<(), BlockError> {
        if let Some(other) = self.dragging().filter(|other| *other != id) {
            return Err(BlockError::DragInProgress(other));
        }
        if self.get(id)?.is_ghost() {
            self.revert_ghost(id)?;
        }
        let block = self.get(id)?;
        let origin = block.position;
        let from = match block.state {
            BlockState::Dragging { .. } => return Err(BlockError::AlreadyDragging),
            BlockState::Unplaced => None,
            BlockState::Placed { at, .. } => Some(at),
        };
        if let Some(at) = from {
            self.grids.free(at.grid, at.anchor, &at.shape);
            self.events.push(FieldEvent::DeleteZoneShown);
        }
        self.get_mut(id)?.state = BlockState::Dragging { from, origin };
        debug!(block = %id, lifted = from.is_some(), "drag started");
        Ok(())
    }

    /// Move the dragged block's visual position
    pub fn drag_to(&mut self, id: BlockId, pos: WorldPos) -> Result<(), BlockError> {
        let block = self.get_mut(id)?;
        if !block.is_dragging() {
            return Err(BlockError::NotDragging);
        }
        block.position = pos;
        Ok(())
    }

    /// Resolve a drop at `pos`
    pub fn end_drag(&mut self, id: BlockId, pos: WorldPos) -> Result<DropOutcome, BlockError> {
        let block = self.get(id)?;
        let BlockState::Dragging { from, origin } = block.state else {
            return Err(BlockError::NotDragging);
        };
        let (kind, level, shape, rotation) = (block.kind, block.level, block.shape, block.rotation);

        if from.is_some() {
            self.events.push(FieldEvent::DeleteZoneHidden);
            if self.zone.contains(pos) {
                self.blocks.remove(&id);
                self.events.push(FieldEvent::Removed { block: id });
                debug!(block = %id, "block dropped on delete zone");
                return Ok(DropOutcome::Deleted);
            }
        }

        let (grid, anchor) = self.grids.world_to_grid(pos);

        // Merge wins over plain placement at the same target
        if let Some(target) = self.find_merge_target(grid, anchor, &shape, kind, level, id) {
            if self.level_allows_merge(level) {
                let new_level = self.merge_pair(target, id);
                self.check_and_merge(target);
                let level = self.blocks.get(&target).map_or(new_level, |b| b.level);
                return Ok(DropOutcome::Merged {
                    into: target,
                    level,
                });
            }
        }

        match self.grids.check_place(grid, anchor, &shape) {
            Ok(()) => {
                self.commit(
                    id,
                    Placement {
                        grid,
                        anchor,
                        shape,
                        rotation,
                    },
                );
                self.check_and_merge(id);
                return Ok(DropOutcome::Placed { grid, anchor });
            }
            Err(why) => {
                debug!(block = %id, grid = ?grid, anchor = %anchor, reason = why.code(), "drop rejected");
            }
        }

        self.settle(id, from, origin)
    }

    /// Abandon a drag without a drop: a lifted block goes back to its saved
    /// placement, a tray block to its tray position
    pub fn cancel_drag(&mut self, id: BlockId) -> Result<DropOutcome, BlockError> {
        let BlockState::Dragging { from, origin } = self.get(id)?.state else {
            return Err(BlockError::NotDragging);
        };
        if from.is_some() {
            self.events.push(FieldEvent::DeleteZoneHidden);
        }
        debug!(block = %id, "drag cancelled");
        self.settle(id, from, origin)
    }

    fn settle(
        &mut self,
        id: BlockId,
        from: Option<Placement>,
        origin: WorldPos,
    ) -> Result<DropOutcome, BlockError> {
        if let Some(at) = from {
            return Ok(if self.restore(id, at) {
                DropOutcome::Restored
            } else {
                DropOutcome::Deleted
            });
        }
        let block = self.get_mut(id)?;
        block.state = BlockState::Unplaced;
        block.position = origin;
        Ok(DropOutcome::Returned)
    }

    /// Re-occupy a saved placement without notifying collaborators
    ///
    /// When another block now holds any of the saved cells the lifted block
    /// is destroyed and `false` returned.
    fn restore(&mut self, id: BlockId, at: Placement) -> bool {
        if let Err(why) = self.grids.check_place(at.grid, at.anchor, &at.shape) {
            self.blocks.remove(&id);
            self.events.push(FieldEvent::Removed { block: id });
            warn!(block = %id, reason = why.code(), "saved placement taken, block destroyed");
            return false;
        }
        self.grids.occupy_owned(at.grid, at.anchor, &at.shape, id);
        let centroid = self.grids.centroid(at.grid, at.anchor, &at.shape);
        if let Some(block) = self.blocks.get_mut(&id) {
            block.shape = at.shape;
            block.rotation = at.rotation;
            block.state = BlockState::Placed { at, ghost: false };
            block.position = centroid;
        }
        debug!(block = %id, "drag restored");
        true
    }

    // ---- phase housekeeping ----

    /// End-of-phase cleanup: tray blocks are destroyed, lifted blocks go back
    ///
    /// Returns every destroyed block.
    pub fn discard_unplaced(&mut self) -> Vec<BlockId> {
        let mut removed = Vec::new();
        let ids: Vec<BlockId> = self.blocks.keys().copied().collect();
        for id in ids {
            let Some(block) = self.blocks.get(&id) else {
                continue;
            };
            match block.state {
                BlockState::Placed { .. } => {}
                BlockState::Dragging { from: Some(at), .. } => {
                    self.events.push(FieldEvent::DeleteZoneHidden);
                    if !self.restore(id, at) {
                        removed.push(id);
                    }
                }
                BlockState::Unplaced | BlockState::Dragging { from: None, .. } => {
                    self.blocks.remove(&id);
                    self.events.push(FieldEvent::Removed { block: id });
                    removed.push(id);
                }
            }
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "unplaced blocks discarded");
        }
        removed
    }

    // ---- expansion ----

    pub fn expand_at(
        &mut self,
        grid: GridId,
        target: GridCoord,
        count: usize,
    ) -> Result<ExpandReport, ExpandRejection> {
        let report = self.grids.try_expand(grid, target, count, &mut self.rng);
        self.note_expansion(report)
    }

    /// Expand the grid cell under `pos`
    pub fn expand_at_world(
        &mut self,
        pos: WorldPos,
        count: usize,
    ) -> Result<ExpandReport, ExpandRejection> {
        let report = self.grids.expand_at_world(pos, count, &mut self.rng);
        self.note_expansion(report)
    }

    pub fn expand_frontier(
        &mut self,
        grid: GridId,
        count: usize,
    ) -> Result<Vec<GridCoord>, ExpandRejection> {
        let added = self.grids.expand_frontier(grid, count, &mut self.rng)?;
        for chunk in added.chunks(4) {
            self.events.push(FieldEvent::Expanded {
                grid,
                cells: chunk.iter().copied().collect(),
            });
        }
        Ok(added)
    }

    fn note_expansion(
        &mut self,
        report: Result<ExpandReport, ExpandRejection>,
    ) -> Result<ExpandReport, ExpandRejection> {
        match &report {
            Ok(r) => self.events.push(FieldEvent::Expanded {
                grid: r.grid,
                cells: r.cells.clone(),
            }),
            Err(why) => warn!(reason = why.code(), "expansion rejected"),
        }
        report
    }

    /// Occupied cells equal the union of placed footprints, each owned by its block
    pub fn occupancy_consistent(&self) -> bool {
        let mut claimed = 0usize;
        for block in self.blocks.values() {
            let Some(at) = block.placement() else {
                continue;
            };
            for cell in at.cells() {
                if self.grids.is_free(at.grid, cell)
                    || self.grids.owner_at(at.grid, cell) != Some(block.id)
                {
                    return false;
                }
                claimed += 1;
            }
        }
        let occupied: usize = GridId::ALL
            .iter()
            .map(|g| self.grids.occupied_count(*g))
            .sum();
        occupied == claimed
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new(FieldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::RectZone;

    fn c(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    #[test]
    fn test_spawn_clamps_level() {
        let mut field = Field::default();
        let a = field.spawn_block(BlockKind::T, 0, WorldPos::ZERO);
        let b = field.spawn_block(BlockKind::T, 40, WorldPos::ZERO);
        assert_eq!(field.block(a).unwrap().level, 1);
        assert_eq!(field.block(b).unwrap().level, 9);
        assert!(!field.block(a).unwrap().is_placed());
    }

    #[test]
    fn test_rotate_only_in_tray() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::L, 1, WorldPos::ZERO);
        assert_eq!(field.rotate(id), Ok(1));
        assert!(field.place_at(id, GridId::A, c(0, 0)).unwrap());
        assert_eq!(field.rotate(id), Err(BlockError::AlreadyPlaced));
        assert_eq!(field.rotate(BlockId(99)), Err(BlockError::UnknownBlock(BlockId(99))));
    }

    #[test]
    fn test_place_at_emits_placed() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
        assert!(field.place_at(id, GridId::B, c(0, 0)).unwrap());
        let events = field.take_events();
        assert!(matches!(
            events.as_slice(),
            [FieldEvent::Placed { grid: GridId::B, level: 1, .. }]
        ));
        assert_eq!(field.block_at(GridId::B, c(1, 1)), Some(id));
        assert!(field.take_events().is_empty());
    }

    #[test]
    fn test_unplaced_drop_off_grid_returns_home() {
        let mut field = Field::default();
        let home = WorldPos::new(0.0, -8.0);
        let id = field.spawn_block(BlockKind::S, 1, home);
        field.begin_drag(id).unwrap();
        field.drag_to(id, WorldPos::new(-5.0, 20.0)).unwrap();
        let out = field.end_drag(id, WorldPos::new(-5.0, 20.0)).unwrap();
        assert_eq!(out, DropOutcome::Returned);
        let block = field.block(id).unwrap();
        assert_eq!(block.position, home);
        assert_eq!(block.state, BlockState::Unplaced);
    }

    #[test]
    fn test_delete_zone_only_for_lifted_blocks() {
        let zone = RectZone::new(WorldPos::new(-1.0, 6.0), WorldPos::new(1.0, 8.0));
        let mut field = Field::default().with_delete_zone(zone);
        let tray = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);
        field.begin_drag(tray).unwrap();
        assert_eq!(
            field.end_drag(tray, WorldPos::new(0.0, 7.0)).unwrap(),
            DropOutcome::Returned
        );

        let placed = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);
        field.place_at(placed, GridId::A, c(0, 0)).unwrap();
        field.take_events();
        field.begin_drag(placed).unwrap();
        assert_eq!(
            field.end_drag(placed, WorldPos::new(0.0, 7.0)).unwrap(),
            DropOutcome::Deleted
        );
        assert!(field.block(placed).is_none());
        assert_eq!(field.grids().occupied_count(GridId::A), 0);
        assert_eq!(
            field.take_events(),
            vec![
                FieldEvent::DeleteZoneShown,
                FieldEvent::DeleteZoneHidden,
                FieldEvent::Removed { block: placed }
            ]
        );
    }

    #[test]
    fn test_discard_unplaced_keeps_board() {
        let mut field = Field::default();
        let placed = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
        field.place_at(placed, GridId::A, c(-2, -2)).unwrap();
        let tray = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
        field.begin_drag(placed).unwrap();

        let removed = field.discard_unplaced();
        assert_eq!(removed, vec![tray]);
        assert!(field.block(placed).unwrap().is_placed());
        assert!(field.occupancy_consistent());
    }

    #[test]
    fn test_drag_state_errors() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::J, 1, WorldPos::ZERO);
        assert_eq!(field.drag_to(id, WorldPos::ZERO), Err(BlockError::NotDragging));
        assert_eq!(field.end_drag(id, WorldPos::ZERO), Err(BlockError::NotDragging));
        field.begin_drag(id).unwrap();
        assert_eq!(field.begin_drag(id), Err(BlockError::AlreadyDragging));
    }

    #[test]
    fn test_second_drag_refused() {
        let mut field = Field::default();
        let a = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
        let b = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);
        field.begin_drag(a).unwrap();
        assert_eq!(field.dragging(), Some(a));
        assert_eq!(field.begin_drag(b), Err(BlockError::DragInProgress(a)));
        assert_eq!(field.end_drag(a, WorldPos::new(-5.0, 20.0)), Ok(DropOutcome::Returned));
        assert_eq!(field.dragging(), None);
        assert!(field.begin_drag(b).is_ok());
    }

    #[test]
    fn test_cancel_drag_restores_lifted_block() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::L, 1, WorldPos::ZERO);
        field.place_at(id, GridId::B, c(0, 0)).unwrap();
        let cells = field.grids().occupied_count(GridId::B);
        field.begin_drag(id).unwrap();
        field.drag_to(id, WorldPos::new(0.0, -30.0)).unwrap();
        field.take_events();

        assert_eq!(field.cancel_drag(id), Ok(DropOutcome::Restored));
        assert_eq!(field.grids().occupied_count(GridId::B), cells);
        assert_eq!(field.take_events(), vec![FieldEvent::DeleteZoneHidden]);
        assert_eq!(field.cancel_drag(id), Err(BlockError::NotDragging));
        assert!(field.occupancy_consistent());
    }

    #[test]
    fn test_expand_emits_event() {
        let mut field = Field::default();
        let report = field.expand_at(GridId::A, c(0, 3), 1).unwrap();
        assert_eq!(report.cells.as_slice(), &[c(0, 3)]);
        assert!(matches!(
            field.take_events().as_slice(),
            [FieldEvent::Expanded { grid: GridId::A, .. }]
        ));
        assert!(field.expand_at(GridId::A, c(0, 9), 1).is_err());
        assert!(field.take_events().is_empty());
    }
}
