//! Typed negative outcomes for the field
//!
//! None of these are faults. Spatial queries still expose a plain `bool`
//! (`can_place`, `expand`); the enums exist so tests and logs can tell an
//! off-grid target from an occupied one.

use thiserror::Error;

use crate::types::{BlockId, GridCoord};

/// Why a shape cannot be placed at an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceRejection {
    #[error("cell {0} is not part of the grid")]
    OffGrid(GridCoord),
    #[error("cell {0} is already occupied")]
    Occupied(GridCoord),
}

impl PlaceRejection {
    pub fn code(self) -> &'static str {
        match self {
            PlaceRejection::OffGrid(_) => "off_grid",
            PlaceRejection::Occupied(_) => "occupied",
        }
    }

    /// The first offending cell
    pub fn cell(self) -> GridCoord {
        match self {
            PlaceRejection::OffGrid(c) | PlaceRejection::Occupied(c) => c,
        }
    }
}

/// Why an expansion added nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExpandRejection {
    #[error("cell {0} is already part of the grid")]
    AlreadyPresent(GridCoord),
    #[error("cell {0} does not touch the grid")]
    NotAdjacent(GridCoord),
    #[error("grid has no frontier left to grow into")]
    Exhausted,
}

impl ExpandRejection {
    pub fn code(self) -> &'static str {
        match self {
            ExpandRejection::AlreadyPresent(_) => "already_present",
            ExpandRejection::NotAdjacent(_) => "not_adjacent",
            ExpandRejection::Exhausted => "exhausted",
        }
    }
}

/// A block operation was called in a state that does not allow it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("block {0} does not exist")]
    UnknownBlock(BlockId),
    #[error("block is not placed")]
    NotPlaced,
    #[error("block is already placed")]
    AlreadyPlaced,
    #[error("block is not being dragged")]
    NotDragging,
    #[error("block is already being dragged")]
    AlreadyDragging,
    #[error("block {0} is still being dragged")]
    DragInProgress(BlockId),
    #[error("blocks cannot be merged")]
    CannotMerge,
}

impl BlockError {
    pub fn code(self) -> &'static str {
        match self {
            BlockError::UnknownBlock(_) => "unknown_block",
            BlockError::NotPlaced
            | BlockError::AlreadyPlaced
            | BlockError::NotDragging
            | BlockError::AlreadyDragging
            | BlockError::DragInProgress(_) => "invalid_state",
            BlockError::CannotMerge => "cannot_merge",
        }
    }
}

/// Failure to read a configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io(_) => "config_io",
            ConfigError::Parse(_) => "config_parse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_are_distinct() {
        let c = GridCoord::new(3, 3);
        assert_eq!(PlaceRejection::OffGrid(c).code(), "off_grid");
        assert_eq!(PlaceRejection::Occupied(c).code(), "occupied");
        assert_eq!(PlaceRejection::Occupied(c).cell(), c);
        assert_eq!(ExpandRejection::NotAdjacent(c).code(), "not_adjacent");
    }

    #[test]
    fn state_errors_share_a_code() {
        assert_eq!(BlockError::NotPlaced.code(), BlockError::AlreadyDragging.code());
        assert_eq!(BlockError::UnknownBlock(BlockId(7)).to_string(), "block #7 does not exist");
    }

    #[test]
    fn parse_error_converts() {
        let err: ConfigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.code(), "config_parse");
    }
}
