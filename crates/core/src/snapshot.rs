use serde::Serialize;

use crate::block::BlockState;
use crate::field::Field;
use crate::shapes::{footprint, Shape};
use crate::types::{BlockId, BlockKind, GridCoord, GridId, WorldPos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPhase {
    Unplaced,
    Placed,
    Ghost,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellSnapshot {
    pub coord: GridCoord,
    pub free: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    pub id: GridId,
    pub origin: WorldPos,
    pub cells: Vec<CellSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub kind: BlockKind,
    pub level: u8,
    pub rotation: u8,
    pub phase: BlockPhase,
    pub grid: Option<GridId>,
    pub anchor: Option<GridCoord>,
    /// Occupied cells; empty unless placed
    pub footprint: Vec<GridCoord>,
    /// Current (possibly ghost) shape relative to the anchor
    pub shape: Shape,
    pub position: WorldPos,
}

impl BlockSnapshot {
    pub fn is_ghost(&self) -> bool {
        self.phase == BlockPhase::Ghost
    }
}

/// Read-only copy of a field for views and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSnapshot {
    pub cell_size: f32,
    pub grids: [GridSnapshot; 2],
    pub blocks: Vec<BlockSnapshot>,
}

impl FieldSnapshot {
    pub fn grid(&self, id: GridId) -> &GridSnapshot {
        &self.grids[id.index()]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Field {
    pub fn snapshot(&self) -> FieldSnapshot {
        let grid = |id: GridId| GridSnapshot {
            id,
            origin: self.grids.origin(id),
            cells: self
                .grids
                .cells(id)
                .map(|(coord, free)| CellSnapshot { coord, free })
                .collect(),
        };
        let blocks = self
            .blocks
            .values()
            .map(|b| {
                let (phase, at) = match b.state {
                    BlockState::Unplaced => (BlockPhase::Unplaced, None),
                    BlockState::Dragging { .. } => (BlockPhase::Dragging, None),
                    BlockState::Placed { at, ghost: true } => (BlockPhase::Ghost, Some(at)),
                    BlockState::Placed { at, ghost: false } => (BlockPhase::Placed, Some(at)),
                };
                BlockSnapshot {
                    id: b.id,
                    kind: b.kind,
                    level: b.level,
                    rotation: b.rotation,
                    phase,
                    grid: at.map(|p| p.grid),
                    anchor: at.map(|p| p.anchor),
                    footprint: at.map_or_else(Vec::new, |p| footprint(p.anchor, &p.shape).to_vec()),
                    shape: b.shape,
                    position: b.position,
                }
            })
            .collect();
        FieldSnapshot {
            cell_size: self.grids.cell_size(),
            grids: [grid(GridId::A), grid(GridId::B)],
            blocks,
        }
    }
}
