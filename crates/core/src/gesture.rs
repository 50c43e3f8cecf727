//! Tap vs drag classification for a single pointer press
//!
//! A press is a tap when it is released before the threshold and never moved
//! far enough to start a drag. The first qualifying move starts the drag.

use crate::types::WorldPos;

/// Pointer travel (world units) below which a move is treated as jitter
pub const DRAG_SLOP: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Tap,
    Drag,
}

#[derive(Debug, Clone)]
pub struct Gesture {
    tap_threshold_ms: u32,
    pressed: Option<(WorldPos, u64)>,
    dragging: bool,
}

impl Gesture {
    pub fn new(tap_threshold_ms: u32) -> Self {
        Self {
            tap_threshold_ms,
            pressed: None,
            dragging: false,
        }
    }

    pub fn down(&mut self, pos: WorldPos, now_ms: u64) {
        self.pressed = Some((pos, now_ms));
        self.dragging = false;
    }

    /// Returns true exactly once, on the move that starts the drag
    pub fn moved(&mut self, pos: WorldPos) -> bool {
        let Some((start, _)) = self.pressed else {
            return false;
        };
        if self.dragging || pos.distance(start) < DRAG_SLOP {
            return false;
        }
        self.dragging = true;
        true
    }

    /// Finish the press; `None` when no press was in progress
    pub fn up(&mut self, now_ms: u64) -> Option<GestureKind> {
        let (_, t0) = self.pressed.take()?;
        let held = now_ms.saturating_sub(t0);
        let dragging = std::mem::take(&mut self.dragging);
        if !dragging && held < self.tap_threshold_ms as u64 {
            Some(GestureKind::Tap)
        } else {
            Some(GestureKind::Drag)
        }
    }

    /// Forget the press without classifying it
    pub fn cancel(&mut self) {
        self.pressed = None;
        self.dragging = false;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_release_is_tap() {
        let mut g = Gesture::new(200);
        g.down(WorldPos::ZERO, 1000);
        assert_eq!(g.up(1150), Some(GestureKind::Tap));
        assert!(!g.is_pressed());
    }

    #[test]
    fn test_long_press_is_not_tap() {
        let mut g = Gesture::new(200);
        g.down(WorldPos::ZERO, 0);
        assert_eq!(g.up(200), Some(GestureKind::Drag));
    }

    #[test]
    fn test_move_starts_drag_once() {
        let mut g = Gesture::new(200);
        g.down(WorldPos::ZERO, 0);
        assert!(!g.moved(WorldPos::new(0.1, 0.0)));
        assert!(g.moved(WorldPos::new(1.0, 0.0)));
        assert!(!g.moved(WorldPos::new(2.0, 0.0)));
        assert!(g.is_dragging());
        assert_eq!(g.up(50), Some(GestureKind::Drag));
    }

    #[test]
    fn test_up_without_down() {
        let mut g = Gesture::new(200);
        assert_eq!(g.up(10), None);
        assert!(!g.moved(WorldPos::ZERO));
    }
}
