//! FieldView: maps a running [`Session`] into a terminal framebuffer.
//!
//! Pure (no I/O), so it can be unit-tested. The view shows a fixed window of
//! the world plane; one world cell is `cell_w` columns by `cell_h` rows.
//! [`Projection`] is the screen↔world transform shared with the input path,
//! so a click lands on the cell that was drawn there.

use crate::core::{BlockPhase, BlockSnapshot, FieldSnapshot};
use crate::engine::session::DELETE_ZONE;
use crate::engine::{Phase, Session, TrayItem};
use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};
use crate::types::{BlockKind, GridCoord, WorldPos};

/// World window, in world units (cell edges fall on half-integers)
const WORLD_LEFT: f32 = -11.5;
const WORLD_TOP: f32 = 8.5;
const WORLD_COLS: u16 = 23;
const WORLD_ROWS: u16 = 19;
const PANEL_W: u16 = 18;
/// Largest terminal span of one world cell
const MAX_CELL_SPAN: u16 = 16;

const BG: Rgb = Rgb::new(30, 30, 40);
const BLACK: Rgb = Rgb::new(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Screen↔world transform for one viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Screen position of the top-left world cell
    pub origin_x: u16,
    pub origin_y: u16,
    pub cell_w: u16,
    pub cell_h: u16,
    pub cell_size: f32,
}

impl Projection {
    /// Top-left terminal cell of the world cell containing `pos`
    pub fn to_screen(&self, pos: WorldPos) -> Option<(u16, u16)> {
        let i = ((pos.x - WORLD_LEFT) / self.cell_size).floor();
        let j = ((WORLD_TOP - pos.y) / self.cell_size).floor();
        if i < 0.0 || j < 0.0 || i >= WORLD_COLS as f32 || j >= WORLD_ROWS as f32 {
            return None;
        }
        Some((
            self.origin_x + i as u16 * self.cell_w,
            self.origin_y + j as u16 * self.cell_h,
        ))
    }

    /// Centre of the world cell drawn at terminal cell (`col`, `row`)
    pub fn to_world(&self, col: u16, row: u16) -> WorldPos {
        let i = (col as f32 - self.origin_x as f32) / self.cell_w as f32;
        let j = (row as f32 - self.origin_y as f32) / self.cell_h as f32;
        WorldPos::new(
            WORLD_LEFT + (i.floor() + 0.5) * self.cell_size,
            WORLD_TOP - (j.floor() + 0.5) * self.cell_size,
        )
    }
}

pub struct FieldView {
    cell_w: u16,
    cell_h: u16,
}

impl Default for FieldView {
    fn default() -> Self {
        // 2x1 roughly squares a terminal glyph
        Self { cell_w: 2, cell_h: 1 }
    }
}

impl FieldView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.clamp(1, MAX_CELL_SPAN),
            cell_h: cell_h.clamp(1, MAX_CELL_SPAN),
        }
    }

    fn frame_size(&self) -> (u16, u16) {
        (
            WORLD_COLS.saturating_mul(self.cell_w).saturating_add(2),
            WORLD_ROWS.saturating_mul(self.cell_h).saturating_add(2),
        )
    }

    pub fn projection(&self, session: &Session, viewport: Viewport) -> Projection {
        let (frame_w, frame_h) = self.frame_size();
        let start_x = viewport.width.saturating_sub(frame_w + PANEL_W) / 2;
        let start_y = viewport.height.saturating_sub(frame_h) / 2;
        Projection {
            origin_x: start_x + 1,
            origin_y: start_y + 1,
            cell_w: self.cell_w,
            cell_h: self.cell_h,
            cell_size: session.field().grids().cell_size(),
        }
    }

    /// Render into an existing framebuffer, resizing it to the viewport.
    pub fn render_into(&self, session: &Session, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(Cell::default());

        let proj = self.projection(session, viewport);
        let (frame_w, frame_h) = self.frame_size();
        let (start_x, start_y) = (proj.origin_x - 1, proj.origin_y - 1);

        fb.fill_rect(
            proj.origin_x,
            proj.origin_y,
            WORLD_COLS * self.cell_w,
            WORLD_ROWS * self.cell_h,
            ' ',
            CellStyle::new(BG, BG),
        );
        draw_border(fb, start_x, start_y, frame_w, frame_h);

        let snap = session.snapshot();
        self.draw_path(fb, &proj, session);
        self.draw_grids(fb, &proj, &snap);
        if session.delete_zone_visible() {
            self.draw_delete_zone(fb, &proj);
        }
        // Placed first so tray and dragged blocks stay on top
        for block in snap.blocks.iter().filter(|b| b.grid.is_some()) {
            self.draw_placed(fb, &proj, session, block);
        }
        for block in snap.blocks.iter().filter(|b| b.grid.is_none()) {
            self.draw_loose(fb, &proj, block);
        }
        self.draw_tokens(fb, &proj, session);
        self.draw_enemies(fb, &proj, session);
        self.draw_panel(fb, session, viewport, start_x + frame_w + 2, start_y);

        match session.phase() {
            Phase::Won => draw_overlay(fb, start_x, start_y, frame_w, frame_h, "VICTORY"),
            Phase::Lost => draw_overlay(fb, start_x, start_y, frame_w, frame_h, "DEFEAT"),
            Phase::Player | Phase::Enemy => {}
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, session: &Session, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(session, viewport, &mut fb);
        fb
    }

    fn fill_world_cell(&self, fb: &mut FrameBuffer, proj: &Projection, pos: WorldPos, ch: char, style: CellStyle) {
        if let Some((x, y)) = proj.to_screen(pos) {
            fb.fill_rect(x, y, self.cell_w, self.cell_h, ch, style);
        }
    }

    fn draw_path(&self, fb: &mut FrameBuffer, proj: &Projection, session: &Session) {
        let style = CellStyle::new(Rgb::new(150, 120, 80), BG).dim();
        let step = proj.cell_size / 2.0;
        let roster = session.roster();
        if let Ok(roster) = roster.try_lock() {
            for pair in roster.path().windows(2) {
                let (from, to) = (pair[0], pair[1]);
                let n = (from.distance(to) / step).ceil() as u32;
                for k in 0..=n {
                    let t = if n == 0 { 0.0 } else { k as f32 / n as f32 };
                    self.fill_world_cell(fb, proj, from + (to - from).scale(t), ':', style);
                }
            }
        }

        let base = session.base();
        let hp = base.health() / base.max_health().max(1.0);
        let color = if hp > 0.5 {
            Rgb::new(100, 200, 120)
        } else if hp > 0.2 {
            Rgb::new(240, 200, 80)
        } else {
            Rgb::new(220, 80, 80)
        };
        self.fill_world_cell(fb, proj, base.position, '■', CellStyle::new(color, BG).bold());
    }

    fn draw_grids(&self, fb: &mut FrameBuffer, proj: &Projection, snap: &FieldSnapshot) {
        let empty = CellStyle::new(Rgb::new(90, 90, 100), Rgb::new(40, 40, 52)).dim();
        for grid in &snap.grids {
            for cell in grid.cells.iter().filter(|c| c.free) {
                let pos = cell_world(grid.origin, cell.coord, snap.cell_size);
                self.fill_world_cell(fb, proj, pos, '·', empty);
            }
        }
    }

    fn draw_delete_zone(&self, fb: &mut FrameBuffer, proj: &Projection) {
        let style = CellStyle::new(Rgb::new(220, 80, 80), Rgb::new(60, 20, 20)).bold();
        let (lo, hi) = DELETE_ZONE;
        let mut y = hi.y - proj.cell_size / 2.0;
        while y > lo.y {
            let mut x = lo.x + proj.cell_size / 2.0;
            while x < hi.x {
                self.fill_world_cell(fb, proj, WorldPos::new(x, y), '×', style);
                x += proj.cell_size;
            }
            y -= proj.cell_size;
        }
    }

    fn draw_placed(&self, fb: &mut FrameBuffer, proj: &Projection, session: &Session, block: &BlockSnapshot) {
        let (Some(grid), Some(anchor)) = (block.grid, block.anchor) else {
            return;
        };
        let grids = session.field().grids();
        let ghost = block.phase == BlockPhase::Ghost;
        let mut style = CellStyle::new(kind_color(block.kind), BG).bold();
        if ghost {
            style = CellStyle::new(kind_color(block.kind).darken(140), BG).dim();
        }
        for &cell in &block.footprint {
            self.fill_world_cell(fb, proj, grids.grid_to_world(grid, cell), '█', style);
        }
        if ghost {
            let preview = CellStyle::new(kind_color(block.kind), BG);
            for offset in block.shape {
                let cell = anchor + offset;
                if !block.footprint.contains(&cell) {
                    self.fill_world_cell(fb, proj, grids.grid_to_world(grid, cell), '░', preview);
                }
            }
        }
        self.draw_level(fb, proj, grids.grid_to_world(grid, anchor), block);
    }

    /// Tray and dragged blocks, drawn at their visual position
    fn draw_loose(&self, fb: &mut FrameBuffer, proj: &Projection, block: &BlockSnapshot) {
        let mut style = CellStyle::new(kind_color(block.kind), BG);
        if block.phase == BlockPhase::Dragging {
            style = style.bold();
        }
        for offset in block.shape {
            let pos = block.position + offset_world(offset, proj.cell_size);
            self.fill_world_cell(fb, proj, pos, '█', style);
        }
        self.draw_level(fb, proj, block.position, block);
    }

    fn draw_level(&self, fb: &mut FrameBuffer, proj: &Projection, pos: WorldPos, block: &BlockSnapshot) {
        if let Some((x, y)) = proj.to_screen(pos) {
            let style = CellStyle::new(BLACK, kind_color(block.kind)).bold();
            fb.put_u32(x, y, block.level as u32, style);
        }
    }

    fn draw_tokens(&self, fb: &mut FrameBuffer, proj: &Projection, session: &Session) {
        let style = CellStyle::new(Rgb::new(120, 240, 140), BG).bold();
        for item in session.tray() {
            if let TrayItem::Expand(token) = item {
                self.fill_world_cell(fb, proj, token.position, '+', style);
            }
        }
    }

    fn draw_enemies(&self, fb: &mut FrameBuffer, proj: &Projection, session: &Session) {
        let roster = session.roster();
        // The wave runner may hold the roster for a moment
        let Ok(roster) = roster.try_lock() else {
            return;
        };
        for enemy in roster.enemies() {
            let hp = enemy.health / enemy.max_health.max(1.0);
            let fg = if hp > 0.5 {
                Rgb::new(240, 90, 90)
            } else {
                Rgb::new(160, 60, 60)
            };
            self.fill_world_cell(fb, proj, enemy.position, '●', CellStyle::new(fg, BG).bold());
        }
    }

    fn draw_panel(&self, fb: &mut FrameBuffer, session: &Session, viewport: Viewport, x: u16, top: u16) {
        if x.saturating_add(12) > viewport.width {
            return;
        }
        let label = CellStyle::default().bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), BLACK);
        let mut y = top;

        fb.put_str(x, y, "TURN", label);
        y += 1;
        let w = fb.put_u32(x, y, session.turn(), value);
        fb.put_char(x + w, y, '/', value);
        fb.put_u32(x + w + 1, y, session.director().max_turns(), value);
        y += 2;

        fb.put_str(x, y, "PHASE", label);
        y += 1;
        fb.put_str(x, y, session.phase().label(), value);
        y += 2;

        fb.put_str(x, y, "BASE", label);
        y += 1;
        fb.put_u32(x, y, session.base().health().ceil() as u32, value);
        y += 2;

        fb.put_str(x, y, "ENEMIES", label);
        y += 1;
        match session.roster().try_lock() {
            Ok(r) => {
                fb.put_u32(x, y, r.alive_count() as u32 + r.pending(), value);
            }
            Err(_) => fb.put_str(x, y, "-", value),
        }
        y += 2;

        fb.put_str(x, y, "KILLS", label);
        y += 1;
        fb.put_u32(x, y, session.kills(), value);
        y += 2;

        fb.put_str(x, y, "TURRETS", label);
        y += 1;
        fb.put_u32(x, y, session.turrets().len() as u32, value);
        y += 2;

        let help = value.dim();
        for line in ["tap: rotate", "drag: place", "enter: wave", "r: restart", "q: quit"] {
            if y >= viewport.height {
                break;
            }
            fb.put_str(x, y, line, help);
            y += 1;
        }
    }
}

fn cell_world(origin: WorldPos, coord: GridCoord, cell_size: f32) -> WorldPos {
    origin + offset_world(coord, cell_size)
}

fn offset_world(offset: GridCoord, cell_size: f32) -> WorldPos {
    WorldPos::new(offset.x as f32 * cell_size, offset.y as f32 * cell_size)
}

pub fn kind_color(kind: BlockKind) -> Rgb {
    match kind {
        BlockKind::I => Rgb::new(80, 220, 220),
        BlockKind::O => Rgb::new(240, 220, 80),
        BlockKind::T => Rgb::new(200, 120, 220),
        BlockKind::S => Rgb::new(100, 220, 120),
        BlockKind::Z => Rgb::new(220, 80, 80),
        BlockKind::J => Rgb::new(80, 120, 220),
        BlockKind::L => Rgb::new(255, 165, 0),
    }
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16) {
    if w < 2 || h < 2 {
        return;
    }
    let style = CellStyle::new(Rgb::new(200, 200, 200), BLACK);
    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);
    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

fn draw_overlay(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, text: &str) {
    let text_w = text.chars().count() as u16;
    let style = CellStyle::new(Rgb::new(255, 255, 255), BLACK).bold();
    fb.put_str(
        x.saturating_add(w.saturating_sub(text_w) / 2),
        y.saturating_add(h / 2),
        text,
        style,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridId;

    #[test]
    fn projection_round_trips_grid_cells() {
        let session = Session::default();
        let proj = FieldView::default().projection(&session, Viewport::new(80, 24));
        let grids = session.field().grids();
        for grid in GridId::ALL {
            for (coord, _) in grids.cells(grid) {
                let world = grids.grid_to_world(grid, coord);
                let (col, row) = proj.to_screen(world).unwrap();
                // Either column of the double-width cell maps back
                assert_eq!(proj.to_world(col, row), world);
                assert_eq!(proj.to_world(col + 1, row), world);
            }
        }
    }

    #[test]
    fn oversized_cells_are_clamped() {
        let session = Session::default();
        let view = FieldView::new(u16::MAX, u16::MAX);
        let proj = view.projection(&session, Viewport::new(80, 24));
        assert_eq!((proj.cell_w, proj.cell_h), (MAX_CELL_SPAN, MAX_CELL_SPAN));
        assert_eq!(
            view.frame_size(),
            (WORLD_COLS * MAX_CELL_SPAN + 2, WORLD_ROWS * MAX_CELL_SPAN + 2)
        );
        let mut fb = FrameBuffer::new(80, 24);
        view.render_into(&session, Viewport::new(80, 24), &mut fb);
    }

    #[test]
    fn outside_world_is_not_drawn() {
        let session = Session::default();
        let proj = FieldView::default().projection(&session, Viewport::new(80, 24));
        assert_eq!(proj.to_screen(WorldPos::new(40.0, 0.0)), None);
        assert_eq!(proj.to_screen(WorldPos::new(0.0, 9.0)), None);
    }

    #[test]
    fn empty_cells_are_dotted() {
        let session = Session::default();
        let view = FieldView::default();
        let viewport = Viewport::new(80, 24);
        let fb = view.render(&session, viewport);
        let proj = view.projection(&session, viewport);
        let world = session.field().grids().grid_to_world(GridId::B, GridCoord::new(2, 2));
        let (x, y) = proj.to_screen(world).unwrap();
        assert_eq!(fb.get(x, y).map(|c| c.ch), Some('·'));
    }
}
