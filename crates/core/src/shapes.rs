//! Shapes module - tetromino cell offsets and the 90° rotation
//!
//! Offsets are anchor-relative. Rotation applies `(x, y) -> (y, -x)` once per
//! step; four steps return to the canonical shape.

use crate::types::{BlockKind, GridCoord};

/// Shape of a block - 4 cell offsets from its anchor
pub type Shape = [GridCoord; 4];

const fn c(x: i32, y: i32) -> GridCoord {
    GridCoord::new(x, y)
}

/// Canonical (rotation 0) shape for a block kind
pub fn base_shape(kind: BlockKind) -> Shape {
    match kind {
        BlockKind::I => [c(-1, 0), c(0, 0), c(1, 0), c(2, 0)],
        BlockKind::O => [c(0, 0), c(1, 0), c(0, 1), c(1, 1)],
        BlockKind::T => [c(0, 0), c(-1, 0), c(1, 0), c(0, 1)],
        BlockKind::S => [c(0, 0), c(1, 0), c(0, 1), c(-1, 1)],
        BlockKind::Z => [c(0, 0), c(-1, 0), c(0, 1), c(1, 1)],
        BlockKind::J => [c(0, 0), c(-1, 0), c(1, 0), c(-1, 1)],
        BlockKind::L => [c(0, 0), c(-1, 0), c(1, 0), c(1, 1)],
    }
}

/// Rotate every offset by 90°
#[inline]
pub fn rotate90(shape: Shape) -> Shape {
    shape.map(|o| c(o.y, -o.x))
}

/// Shape of `kind` after `rotation` quarter turns
pub fn shape_for(kind: BlockKind, rotation: u8) -> Shape {
    let mut shape = base_shape(kind);
    for _ in 0..rotation % 4 {
        shape = rotate90(shape);
    }
    shape
}

/// Next rotation index, wrapping after four steps
#[inline]
pub fn next_rotation(rotation: u8) -> u8 {
    (rotation + 1) % 4
}

/// Absolute cells covered by `shape` at `anchor`
#[inline]
pub fn footprint(anchor: GridCoord, shape: &Shape) -> Shape {
    shape.map(|o| anchor + o)
}
