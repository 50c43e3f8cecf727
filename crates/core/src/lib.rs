//! Core field logic - pure, deterministic, and testable
//!
//! This crate holds the grid occupancy, block placement and merge rules. It
//! has no dependency on terminals, timers or async runtimes, so every rule
//! can be driven directly from tests.
//!
//! # Module Structure
//!
//! - [`shapes`]: the seven tetromino offset sets and the 90° rotation
//! - [`grid`]: two sparse, growable cell maps with world transforms
//! - [`field`]: block registry, placement and the drag lifecycle
//! - [`merge`]: same-kind same-level merge resolution with cascades
//! - [`ghost`]: in-place rotation of placed blocks and the ghost preview
//! - [`gesture`]: tap vs drag classification of a pointer press
//! - [`events`]: notifications for turrets, views and the delete zone
//! - [`snapshot`]: serializable read-only copy of a field
//!
//! # Rules
//!
//! - **Placement**: every covered cell must be land and free
//! - **Merge first**: a drop onto a matching block combines instead of failing
//! - **Cascade**: a level-up can trigger the next merge, until none matches
//! - **Ghost**: a blocked rotation keeps the previous footprint reserved
//! - **Recovery**: a lifted block that cannot land goes back exactly where it was
//!
//! # Example
//!
//! ```
//! use tetromerge_core::Field;
//! use tetromerge_core::types::{BlockKind, GridCoord, GridId, WorldPos};
//!
//! let mut field = Field::default();
//! let a = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
//! let b = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
//!
//! assert!(field.place_at(a, GridId::A, GridCoord::new(-2, -2)).unwrap());
//! // b's anchor is right next to one of a's cells, so the two merge
//! assert!(field.place_at(b, GridId::A, GridCoord::new(0, -2)).unwrap());
//!
//! assert!(field.block(a).is_none());
//! assert_eq!(field.block(b).unwrap().level, 2);
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod events;
pub mod field;
pub mod gesture;
pub mod ghost;
pub mod grid;
pub mod merge;
pub mod rng;
pub mod shapes;
pub mod snapshot;
pub mod zone;

pub use tetromerge_types as types;

// Re-export commonly used types for convenience
pub use block::{BlockState, PlacedBlock, Placement};
pub use config::{AdjacencyScope, FieldConfig, MaxLevelPolicy};
pub use error::{BlockError, ConfigError, ExpandRejection, PlaceRejection};
pub use events::FieldEvent;
pub use field::{DropOutcome, Field};
pub use gesture::{Gesture, GestureKind};
pub use ghost::RotateOutcome;
pub use grid::{ExpandReport, GridStore};
pub use rng::SimpleRng;
pub use shapes::{base_shape, rotate90, shape_for, Shape};
pub use snapshot::{BlockPhase, BlockSnapshot, FieldSnapshot};
pub use zone::{DeleteZone, NoZone, RectZone};
