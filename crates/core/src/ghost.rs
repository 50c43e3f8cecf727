//! Rotation of placed blocks and the ghost sub-state
//!
//! Tapping a placed block rotates it in place. When the rotated shape does
//! not fit, the block becomes a ghost: its own shape shows the rotation it
//! could not take, while the last valid placement stays occupied and owned
//! by the block. Further taps keep rotating the preview and the fallback
//! never changes. A tap that finds room commits the rotation; a pointer-down
//! elsewhere reverts to the fallback.
//!
//! The fallback cells are released only for the duration of a fit test, so
//! no other block can claim them while the ghost is shown and reverting
//! never fails.

use tracing::debug;

use crate::block::{BlockState, Placement};
use crate::error::BlockError;
use crate::events::FieldEvent;
use crate::field::Field;
use crate::shapes::{next_rotation, rotate90};
use crate::types::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateOutcome {
    /// The rotation fit and is now occupied
    Rotated,
    /// No room; the block is (still) a ghost
    Ghosted,
}

impl Field {
    /// Rotate a placed block by 90° around its anchor
    pub fn tap_rotate_if_placed(&mut self, id: BlockId) -> Result<RotateOutcome, BlockError> {
        let block = self.get(id)?;
        let BlockState::Placed { at, ghost } = block.state else {
            return Err(BlockError::NotPlaced);
        };
        let rotation = next_rotation(block.rotation);
        let shape = rotate90(block.shape);

        self.grids.free(at.grid, at.anchor, &at.shape);
        if self.grids.can_place(at.grid, at.anchor, &shape) {
            let new_at = Placement {
                grid: at.grid,
                anchor: at.anchor,
                shape,
                rotation,
            };
            self.grids.occupy_owned(at.grid, at.anchor, &shape, id);
            let centroid = self.grids.centroid(at.grid, at.anchor, &shape);
            let block = self.get_mut(id)?;
            block.shape = shape;
            block.rotation = rotation;
            block.state = BlockState::Placed {
                at: new_at,
                ghost: false,
            };
            block.position = centroid;
            if ghost {
                self.events.push(FieldEvent::GhostChanged { block: id, ghost: false });
            }
            self.events.push(FieldEvent::Moved { block: id, centroid });
            debug!(block = %id, rotation, "placed block rotated");
            return Ok(RotateOutcome::Rotated);
        }

        self.grids.occupy_owned(at.grid, at.anchor, &at.shape, id);
        let block = self.get_mut(id)?;
        block.shape = shape;
        block.rotation = rotation;
        block.state = BlockState::Placed { at, ghost: true };
        if !ghost {
            self.events.push(FieldEvent::GhostChanged { block: id, ghost: true });
        }
        debug!(block = %id, rotation, "rotation blocked, ghost shown");
        Ok(RotateOutcome::Ghosted)
    }

    /// Drop a ghost preview and return to the last valid placement
    ///
    /// Returns `Ok(false)` if the block was not a ghost.
    pub fn revert_ghost(&mut self, id: BlockId) -> Result<bool, BlockError> {
        let block = self.get(id)?;
        let BlockState::Placed { at, ghost: true } = block.state else {
            return Ok(false);
        };
        // Reserved cells are still held; occupying again only refreshes ownership
        self.grids.occupy_owned(at.grid, at.anchor, &at.shape, id);
        let block = self.get_mut(id)?;
        block.shape = at.shape;
        block.rotation = at.rotation;
        block.state = BlockState::Placed { at, ghost: false };
        self.events.push(FieldEvent::GhostChanged { block: id, ghost: false });
        debug!(block = %id, "ghost reverted");
        Ok(true)
    }

    /// Revert every ghost except `keep`; returns how many were reverted
    pub fn revert_all_ghosts(&mut self, keep: Option<BlockId>) -> usize {
        let ghosts: Vec<BlockId> = self
            .blocks
            .values()
            .filter(|b| b.is_ghost() && Some(b.id) != keep)
            .map(|b| b.id)
            .collect();
        let mut reverted = 0;
        for id in ghosts {
            match self.revert_ghost(id) {
                Ok(true) => reverted += 1,
                Ok(false) => {}
                Err(err) => debug!(block = %id, reason = err.code(), "ghost not reverted"),
            }
        }
        reverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::shape_for;
    use crate::types::{BlockKind, GridCoord, GridId, WorldPos};

    fn c(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    #[test]
    fn test_rotation_with_room_commits() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);
        field.place_at(id, GridId::A, c(0, 0)).unwrap();
        field.take_events();

        assert_eq!(field.tap_rotate_if_placed(id), Ok(RotateOutcome::Rotated));
        let block = field.block(id).unwrap();
        assert_eq!(block.rotation, 1);
        assert_eq!(block.placement().unwrap().shape, shape_for(BlockKind::T, 1));
        assert!(!block.is_ghost());
        assert!(field.occupancy_consistent());
        assert!(matches!(field.take_events().as_slice(), [FieldEvent::Moved { .. }]));
    }

    #[test]
    fn test_blocked_rotation_keeps_fallback_reserved() {
        let mut field = Field::default();
        // Horizontal I on the top row: rotating needs (0,3) which is off grid
        let id = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
        field.place_at(id, GridId::A, c(0, 2)).unwrap();
        let before: Vec<_> = field.grids().cells(GridId::A).collect();

        assert_eq!(field.tap_rotate_if_placed(id), Ok(RotateOutcome::Ghosted));
        let block = field.block(id).unwrap();
        assert!(block.is_ghost());
        assert_eq!(block.shape, shape_for(BlockKind::I, 1));
        assert_eq!(block.placement().unwrap().rotation, 0);
        // Fallback cells still held
        assert_eq!(field.grids().cells(GridId::A).collect::<Vec<_>>(), before);
        assert_eq!(field.block_at(GridId::A, c(2, 2)), Some(id));
    }

    #[test]
    fn test_ghost_exits_when_next_rotation_fits() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
        field.place_at(id, GridId::A, c(0, 2)).unwrap();
        field.tap_rotate_if_placed(id).unwrap();
        // Rotation 2 covers (-2,2)..(1,2): free apart from its own reserved cells
        assert_eq!(field.tap_rotate_if_placed(id), Ok(RotateOutcome::Rotated));
        assert!(!field.block(id).unwrap().is_ghost());
        assert_eq!(field.block(id).unwrap().placement().unwrap().rotation, 2);
        assert!(field.occupancy_consistent());
    }

    #[test]
    fn test_repeated_blocked_rotation_keeps_first_fallback() {
        let mut field = Field::default();
        // Left-aligned on the top row: rotations 1, 2 and 3 all leave the grid
        let id = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
        field.place_at(id, GridId::A, c(-1, 2)).unwrap();
        let fallback = field.block(id).unwrap().placement().unwrap();

        for expected_rotation in 1..=3 {
            assert_eq!(field.tap_rotate_if_placed(id), Ok(RotateOutcome::Ghosted));
            let block = field.block(id).unwrap();
            assert_eq!(block.rotation, expected_rotation);
            assert_eq!(block.placement(), Some(fallback));
        }
        let ghost_events = field
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, FieldEvent::GhostChanged { ghost: true, .. }))
            .count();
        assert_eq!(ghost_events, 1);

        // Fourth turn is the original shape, which always fits
        assert_eq!(field.tap_rotate_if_placed(id), Ok(RotateOutcome::Rotated));
        assert_eq!(field.block(id).unwrap().placement(), Some(fallback));
        assert!(field.occupancy_consistent());
    }

    #[test]
    fn test_revert_ghost_restores_shape() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
        field.place_at(id, GridId::B, c(0, 2)).unwrap();
        field.tap_rotate_if_placed(id).unwrap();
        field.take_events();

        assert_eq!(field.revert_ghost(id), Ok(true));
        let block = field.block(id).unwrap();
        assert_eq!(block.rotation, 0);
        assert_eq!(block.shape, shape_for(BlockKind::I, 0));
        assert!(!block.is_ghost());
        assert_eq!(
            field.take_events(),
            vec![FieldEvent::GhostChanged { block: id, ghost: false }]
        );
        assert_eq!(field.revert_ghost(id), Ok(false));
    }

    #[test]
    fn test_rotate_unplaced_is_error() {
        let mut field = Field::default();
        let id = field.spawn_block(BlockKind::Z, 1, WorldPos::ZERO);
        assert_eq!(field.tap_rotate_if_placed(id), Err(BlockError::NotPlaced));
    }
}
