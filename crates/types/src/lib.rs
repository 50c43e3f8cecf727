//! Shared types module - plain data used by every layer
//!
//! This crate defines the vocabulary the rest of the workspace speaks: block
//! kinds, the two grid identifiers, integer grid coordinates, world positions,
//! block ids, and the gameplay constants the defaults are built from.
//!
//! # Grids
//!
//! Two grids exist side by side along the world X axis:
//!
//! - **A**: origin at `(-GRID_SEPARATION / 2, 0)`
//! - **B**: origin at `(+GRID_SEPARATION / 2, 0)`
//!
//! Each grid starts as a `SEED_WIDTH x SEED_HEIGHT` rectangle centred on its
//! origin (coordinates `-2..=2` on both axes for the 5x5 default) and can grow
//! one cell at a time at runtime.
//!
//! # Gameplay Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MIN_LEVEL` | 1 | Level of a freshly spawned block |
//! | `MAX_LEVEL` | 9 | Level cap for merges |
//! | `TAP_THRESHOLD_MS` | 200 | Press shorter than this is a tap |
//! | `TICK_MS` | 16 | Fixed frame interval (~60 FPS) |
//! | `ITEMS_PER_TURN` | 3 | Tray items offered each player phase |
//! | `MAX_TURNS` | 100 | Surviving this many turns wins |
//!
//! # Examples
//!
//! ```
//! use tetromerge_types::{BlockKind, GridCoord, GridId};
//!
//! let kind = BlockKind::from_str("t").unwrap();
//! assert_eq!(kind, BlockKind::T);
//!
//! let c = GridCoord::new(1, -2) + GridCoord::new(1, 1);
//! assert_eq!(c, GridCoord::new(2, -1));
//!
//! assert_eq!(GridId::A.other(), GridId::B);
//! ```

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Width of the rectangular seed region of each grid
pub const SEED_WIDTH: u32 = 5;

/// Height of the rectangular seed region of each grid
pub const SEED_HEIGHT: u32 = 5;

/// Size of one grid cell in world units
pub const CELL_SIZE: f32 = 1.0;

/// Distance between the two grid origins along the world X axis
pub const GRID_SEPARATION: f32 = 10.0;

/// Level of a freshly spawned block
pub const MIN_LEVEL: u8 = 1;

/// Level cap for merges
pub const MAX_LEVEL: u8 = 9;

/// A press released before this many milliseconds counts as a tap
pub const TAP_THRESHOLD_MS: u32 = 200;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Tray items offered at the start of each player phase
pub const ITEMS_PER_TURN: usize = 3;

/// Chance that a tray item is a block rather than an expand token
pub const BLOCK_ITEM_CHANCE: f32 = 0.7;

/// Surviving this many turns wins the game
pub const MAX_TURNS: u32 = 100;

/// Money awarded on a win (reported to the economy collaborator)
pub const WIN_REWARD: u32 = 500;

/// Starting health of the defended base
pub const BASE_HEALTH: f32 = 100.0;

/// Delay between two enemy spawns within a wave (milliseconds)
pub const ENEMY_SPAWN_INTERVAL_MS: u64 = 300;

/// Poll interval while waiting for a wave to finish (milliseconds)
pub const TURN_POLL_INTERVAL_MS: u64 = 100;


/// The seven tetromino block kinds
///
/// - **I**: straight bar
/// - **O**: 2x2 square
/// - **T**: T-shaped
/// - **S**: S-shaped
/// - **Z**: Z-shaped (mirror of S)
/// - **J**: J-shaped
/// - **L**: L-shaped (mirror of J)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl BlockKind {
    /// All kinds in declaration order
    pub const ALL: [BlockKind; 7] = [
        BlockKind::I,
        BlockKind::O,
        BlockKind::T,
        BlockKind::S,
        BlockKind::Z,
        BlockKind::J,
        BlockKind::L,
    ];

    /// Parse block kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetromerge_types::BlockKind;
    ///
    /// assert_eq!(BlockKind::from_str("i"), Some(BlockKind::I));
    /// assert_eq!(BlockKind::from_str("O"), Some(BlockKind::O));
    /// assert_eq!(BlockKind::from_str("unknown"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(BlockKind::I),
            "o" => Some(BlockKind::O),
            "t" => Some(BlockKind::T),
            "s" => Some(BlockKind::S),
            "z" => Some(BlockKind::Z),
            "j" => Some(BlockKind::J),
            "l" => Some(BlockKind::L),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::I => "i",
            BlockKind::O => "o",
            BlockKind::T => "t",
            BlockKind::S => "s",
            BlockKind::Z => "z",
            BlockKind::J => "j",
            BlockKind::L => "l",
        }
    }

    /// Uppercase display letter
    pub fn letter(&self) -> char {
        match self {
            BlockKind::I => 'I',
            BlockKind::O => 'O',
            BlockKind::T => 'T',
            BlockKind::S => 'S',
            BlockKind::Z => 'Z',
            BlockKind::J => 'J',
            BlockKind::L => 'L',
        }
    }
}

/// Identifies one of the two independent grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GridId {
    A,
    B,
}

impl GridId {
    /// Both grids, A first (the order dual-grid operations try them in)
    pub const ALL: [GridId; 2] = [GridId::A, GridId::B];

    /// Dense index for per-grid arrays
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            GridId::A => 0,
            GridId::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            GridId::A => GridId::B,
            GridId::B => GridId::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GridId::A => "a",
            GridId::B => "b",
        }
    }
}

/// Integer cell coordinate within one grid
///
/// Also used for anchor-relative shape offsets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const ZERO: GridCoord = GridCoord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four 4-adjacent coordinates: up, down, left, right
    pub fn neighbors(self) -> [GridCoord; 4] {
        [
            GridCoord::new(self.x, self.y + 1),
            GridCoord::new(self.x, self.y - 1),
            GridCoord::new(self.x - 1, self.y),
            GridCoord::new(self.x + 1, self.y),
        ]
    }

    /// True if `other` is exactly one step away horizontally or vertically
    pub fn is_adjacent(self, other: GridCoord) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

impl Add for GridCoord {
    type Output = GridCoord;

    fn add(self, rhs: GridCoord) -> GridCoord {
        GridCoord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridCoord {
    type Output = GridCoord;

    fn sub(self, rhs: GridCoord) -> GridCoord {
        GridCoord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Continuous position on the world plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const ZERO: WorldPos = WorldPos { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: WorldPos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn scale(self, k: f32) -> WorldPos {
        WorldPos::new(self.x * k, self.y * k)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for WorldPos {
    type Output = WorldPos;

    fn add(self, rhs: WorldPos) -> WorldPos {
        WorldPos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for WorldPos {
    type Output = WorldPos;

    fn sub(self, rhs: WorldPos) -> WorldPos {
        WorldPos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Stable identity of a block within one field
///
/// Ids are handed out monotonically and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
