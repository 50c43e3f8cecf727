//! Terminal front end: a small game-style renderer.
//!
//! Instead of a widget toolkit the view draws straight into a framebuffer
//! that is diffed and flushed to the terminal each frame. Each world cell is
//! two columns wide, which keeps grid cells close to square.

pub mod fb;
pub mod field_view;
pub mod renderer;

pub use tetromerge_core as core;
pub use tetromerge_engine as engine;
pub use tetromerge_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use field_view::{kind_color, FieldView, Projection, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
