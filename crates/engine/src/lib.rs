//! Game engine - everything around the field
//!
//! The core crate decides where blocks go; this crate decides what that means
//! for the game. Placed blocks become turrets, turns alternate between a build
//! phase and an enemy wave, and enemies that reach the base wear it down.
//!
//! # Module Structure
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `GameConfig`, JSON and environment loading |
//! | [`turret`] | one turret per placed block, driven by field events |
//! | [`spawner`] | tray items dealt each build phase |
//! | [`enemy`] | enemy roster walking the path, and the base |
//! | [`turn`] | turn director and per-turn wave plans |
//! | [`wave`] | async wave runner on tokio timers |
//! | [`session`] | pointer routing and the frame tick |
//!
//! The session is synchronous and owned by the frame loop. Only the wave
//! runner is async; it shares the enemy roster through a `tokio` mutex.

pub mod config;
pub mod enemy;
pub mod session;
pub mod spawner;
pub mod turn;
pub mod turret;
pub mod wave;

pub use tetromerge_types as types;

pub use config::{GameConfig, TurnConfig, TurretConfig, WaveConfig};
pub use enemy::{Base, Enemy, EnemyRoster, EnemyStats};
pub use session::{Grab, Interaction, Session};
pub use spawner::{ExpandToken, ItemSpawner, TrayItem};
pub use turn::{Phase, TurnDirector, TurnEvent, WavePlan};
pub use turret::{Turret, TurretRegistry, TurretStats};
pub use wave::{run_wave, SharedRoster, WaveReport};
