//! Tetromerge (workspace facade crate).
//!
//! Re-exports the member crates under short module names so binaries, tests
//! and benches can write `tetromerge::core::Field` and friends.

pub use tetromerge_core as core;
pub use tetromerge_engine as engine;
pub use tetromerge_input as input;
pub use tetromerge_term as term;
pub use tetromerge_types as types;
