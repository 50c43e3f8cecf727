//! Notifications for collaborators (turrets, renderer, delete zone)
//!
//! The field queues these as it mutates; callers drain them with
//! [`Field::take_events`](crate::field::Field::take_events) after each call.

use arrayvec::ArrayVec;
use serde::Serialize;

use crate::types::{BlockId, GridCoord, GridId, WorldPos};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldEvent {
    /// Block committed to a grid (fresh placement or moved by a drag)
    Placed {
        block: BlockId,
        grid: GridId,
        centroid: WorldPos,
        level: u8,
    },
    /// Footprint changed in place (rotation)
    Moved { block: BlockId, centroid: WorldPos },
    Merged {
        survivor: BlockId,
        absorbed: BlockId,
        level: u8,
        centroid: WorldPos,
    },
    Removed { block: BlockId },
    GhostChanged { block: BlockId, ghost: bool },
    Expanded {
        grid: GridId,
        cells: ArrayVec<GridCoord, 4>,
    },
    DeleteZoneShown,
    DeleteZoneHidden,
}
