//! Mouse events as pointer down / move / up in screen cells.
//!
//! Terminals report a drag as a burst of motion events. [`PointerQueue`]
//! collects one frame's worth and folds consecutive moves into the latest
//! one, so a slow frame never replays a stale drag path.

use arrayvec::ArrayVec;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

const QUEUE_CAP: usize = 16;

/// Pointer event at a terminal cell (`col`, `row`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down { col: u16, row: u16 },
    Move { col: u16, row: u16 },
    Up { col: u16, row: u16 },
}

impl PointerEvent {
    pub fn cell(self) -> (u16, u16) {
        match self {
            PointerEvent::Down { col, row }
            | PointerEvent::Move { col, row }
            | PointerEvent::Up { col, row } => (col, row),
        }
    }
}

/// Left button only; wheel and other buttons are ignored
pub fn map_mouse_event(ev: MouseEvent) -> Option<PointerEvent> {
    let (col, row) = (ev.column, ev.row);
    match ev.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerEvent::Down { col, row }),
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerEvent::Move { col, row }),
        MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::Up { col, row }),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointerQueue {
    events: ArrayVec<PointerEvent, QUEUE_CAP>,
}

impl PointerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ev: PointerEvent) {
        if let (PointerEvent::Move { .. }, Some(PointerEvent::Move { .. })) = (ev, self.events.last()) {
            self.events.pop();
        }
        if self.events.is_full() {
            // Keep downs and ups; the oldest move can go
            let Some(idx) = self
                .events
                .iter()
                .position(|e| matches!(e, PointerEvent::Move { .. }))
            else {
                return;
            };
            self.events.remove(idx);
        }
        self.events.push(ev);
    }

    pub fn push_mouse(&mut self, ev: MouseEvent) {
        if let Some(p) = map_mouse_event(ev) {
            self.push(p);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PointerEvent> + '_ {
        self.events.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_left_button_maps() {
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 3, 4)),
            Some(PointerEvent::Down { col: 3, row: 4 })
        );
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 4)),
            Some(PointerEvent::Move { col: 5, row: 4 })
        );
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::Up(MouseButton::Left), 5, 4)),
            Some(PointerEvent::Up { col: 5, row: 4 })
        );
        assert_eq!(map_mouse_event(mouse(MouseEventKind::Down(MouseButton::Right), 0, 0)), None);
        assert_eq!(map_mouse_event(mouse(MouseEventKind::ScrollUp, 0, 0)), None);
    }

    #[test]
    fn test_consecutive_moves_coalesce() {
        let mut q = PointerQueue::new();
        q.push(PointerEvent::Down { col: 1, row: 1 });
        for c in 2..10 {
            q.push(PointerEvent::Move { col: c, row: 1 });
        }
        q.push(PointerEvent::Up { col: 9, row: 1 });
        let events: Vec<_> = q.drain().collect();
        assert_eq!(
            events,
            vec![
                PointerEvent::Down { col: 1, row: 1 },
                PointerEvent::Move { col: 9, row: 1 },
                PointerEvent::Up { col: 9, row: 1 },
            ]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn test_full_queue_drops_moves_first() {
        let mut q = PointerQueue::new();
        for i in 0..QUEUE_CAP as u16 {
            if i % 2 == 0 {
                q.push(PointerEvent::Down { col: i, row: 0 });
            } else {
                q.push(PointerEvent::Move { col: i, row: 0 });
            }
        }
        q.push(PointerEvent::Up { col: 99, row: 0 });
        assert_eq!(q.len(), QUEUE_CAP);
        let events: Vec<_> = q.drain().collect();
        assert_eq!(events.last(), Some(&PointerEvent::Up { col: 99, row: 0 }));
        assert_eq!(events[1], PointerEvent::Down { col: 2, row: 0 });
    }
}
