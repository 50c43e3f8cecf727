//! Delete zone hit-testing

use crate::types::WorldPos;

/// Region where dropping a previously placed block deletes it
pub trait DeleteZone: Send + Sync {
    fn contains(&self, pos: WorldPos) -> bool;
}

/// Axis-aligned rectangle, inclusive on all edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectZone {
    pub min: WorldPos,
    pub max: WorldPos,
}

impl RectZone {
    pub fn new(min: WorldPos, max: WorldPos) -> Self {
        Self { min, max }
    }
}

impl DeleteZone for RectZone {
    fn contains(&self, pos: WorldPos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }
}

/// A field without a delete zone
#[derive(Debug, Clone, Copy, Default)]
pub struct NoZone;

impl DeleteZone for NoZone {
    fn contains(&self, _pos: WorldPos) -> bool {
        false
    }
}
