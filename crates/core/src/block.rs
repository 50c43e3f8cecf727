//! Block entity and its lifecycle state
//!
//! ```text
//! Unplaced ──drag──► Dragging{from: None} ──drop──► Placed | Unplaced
//! Placed   ──drag──► Dragging{from: Some} ──drop──► Placed | Deleted
//! Placed{ghost: false} ◄──tap rotate──► Placed{ghost: true}
//! ```

use serde::Serialize;

use crate::shapes::{footprint, shape_for, Shape};
use crate::types::{BlockId, BlockKind, GridCoord, GridId, WorldPos};

/// Where a block sits on a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub grid: GridId,
    pub anchor: GridCoord,
    pub shape: Shape,
    pub rotation: u8,
}

impl Placement {
    pub fn cells(&self) -> Shape {
        footprint(self.anchor, &self.shape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BlockState {
    /// Sitting in the tray, no grid association
    Unplaced,
    /// `at` is occupied and owned by the block. While `ghost` is set the
    /// block's own shape is a rotation preview and `at` is the last valid
    /// placement to fall back to.
    Placed { at: Placement, ghost: bool },
    /// Following the pointer. `from` is the placement the block was lifted
    /// from, `origin` the visual position before the drag began.
    Dragging {
        from: Option<Placement>,
        origin: WorldPos,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedBlock {
    pub id: BlockId,
    pub kind: BlockKind,
    pub level: u8,
    pub rotation: u8,
    /// Current shape; differs from the placement's while ghosted
    pub shape: Shape,
    pub state: BlockState,
    /// Visual position in world space
    pub position: WorldPos,
}

impl PlacedBlock {
    pub(crate) fn new(id: BlockId, kind: BlockKind, level: u8, home: WorldPos) -> Self {
        Self {
            id,
            kind,
            level,
            rotation: 0,
            shape: shape_for(kind, 0),
            state: BlockState::Unplaced,
            position: home,
        }
    }

    pub fn placement(&self) -> Option<Placement> {
        match self.state {
            BlockState::Placed { at, .. } => Some(at),
            _ => None,
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self.state, BlockState::Placed { .. })
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self.state, BlockState::Placed { ghost: true, .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, BlockState::Dragging { .. })
    }

    /// Same kind and level
    pub fn matches(&self, other: &PlacedBlock) -> bool {
        self.kind == other.kind && self.level == other.level
    }
}
