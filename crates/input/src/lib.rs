//! Terminal input, mapped into front-end commands and pointer events.
//!
//! Nothing here knows about grids or world coordinates. Mouse events stay in
//! screen cells; the view converts them to world positions.

pub mod map;
pub mod pointer;

pub use map::{handle_key_event, should_quit, Command};
pub use pointer::{map_mouse_event, PointerEvent, PointerQueue};
