//! Session - one running game
//!
//! Owns the field, turrets, turn director, tray, enemy roster and base, and
//! turns pointer presses into field operations. All coordinates here are
//! world positions; the front end converts screen cells before calling in.
//!
//! # World layout
//!
//! ```text
//!        y
//!   8    ·        enemy path enters at (0, 7)
//!        ·
//!   0  [ A ]  ·  [ B ]   [del]
//!        ·
//!  -4         ■ base
//!  -8  tray   tray   tray
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use tetromerge_core::{
    DropOutcome, ExpandRejection, ExpandReport, Field, FieldEvent, FieldSnapshot, Gesture,
    GestureKind, RectZone, RotateOutcome,
};

use crate::config::GameConfig;
use crate::enemy::{Base, EnemyRoster};
use crate::spawner::{ItemSpawner, TrayItem};
use crate::turn::{Phase, TurnDirector, WavePlan};
use crate::turret::TurretRegistry;
use crate::types::{BlockId, WorldPos};
use crate::wave::SharedRoster;

/// Enemy path waypoints, entry first
pub const PATH: [WorldPos; 2] = [WorldPos { x: 0.0, y: 7.0 }, WorldPos { x: 0.0, y: -4.0 }];
pub const TRAY_Y: f32 = -8.0;
pub const TRAY_SPACING: f32 = 6.0;
/// Lower-left and upper-right corners of the delete zone
pub const DELETE_ZONE: (WorldPos, WorldPos) = (
    WorldPos { x: 8.5, y: -1.5 },
    WorldPos { x: 10.5, y: 1.5 },
);
/// How close a press must be to an expand token to pick it up
const TOKEN_REACH: f32 = 0.75;

/// What the pointer is holding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grab {
    Block(BlockId),
    /// Index into the tray
    Token(usize),
}

/// Result of a completed press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Tray block rotated to the given quarter turn
    TrayRotated(u8),
    Rotated(RotateOutcome),
    Dropped(DropOutcome),
    Expanded(ExpandReport),
    ExpandRejected(ExpandRejection),
}

pub struct Session {
    config: GameConfig,
    field: Field,
    turrets: TurretRegistry,
    director: TurnDirector,
    spawner: ItemSpawner,
    tray: Vec<TrayItem>,
    roster: SharedRoster,
    base: Base,
    gesture: Gesture,
    grab: Option<Grab>,
    delete_zone_visible: bool,
    kills: u32,
    /// Time from frames skipped while the wave runner held the roster
    pending_dt: f32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("turn", &self.director.turn())
            .field("phase", &self.director.phase())
            .field("field", &self.field)
            .field("tray", &self.tray.len())
            .finish()
    }
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        let (lo, hi) = DELETE_ZONE;
        let field = Field::new(config.field.clone()).with_delete_zone(RectZone::new(lo, hi));
        let spawner = ItemSpawner::from_config(
            &config.turn,
            TRAY_Y,
            TRAY_SPACING,
            config.field.rng_seed.wrapping_add(1),
        );
        let mut session = Self {
            turrets: TurretRegistry::new(config.turret.clone()),
            director: TurnDirector::new(config.turn.clone(), config.wave.clone()),
            tray: Vec::new(),
            roster: Arc::new(Mutex::new(EnemyRoster::new(PATH.to_vec()))),
            base: Base::new(PATH[PATH.len() - 1], config.base_health),
            gesture: Gesture::new(config.field.tap_threshold_ms),
            grab: None,
            delete_zone_visible: false,
            kills: 0,
            pending_dt: 0.0,
            field,
            spawner,
            config,
        };
        session.deal();
        session
    }

    /// Start over with the same configuration
    pub fn restart(&mut self) {
        *self = Self::new(self.config.clone());
        info!("session restarted");
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        self.field.snapshot()
    }

    pub fn turrets(&self) -> &TurretRegistry {
        &self.turrets
    }

    pub fn director(&self) -> &TurnDirector {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut TurnDirector {
        &mut self.director
    }

    pub fn phase(&self) -> Phase {
        self.director.phase()
    }

    pub fn turn(&self) -> u32 {
        self.director.turn()
    }

    pub fn tray(&self) -> &[TrayItem] {
        &self.tray
    }

    pub fn base(&self) -> &Base {
        &self.base
    }

    /// Handle for the wave runner
    pub fn roster(&self) -> SharedRoster {
        Arc::clone(&self.roster)
    }

    pub fn grab(&self) -> Option<Grab> {
        self.grab
    }

    pub fn delete_zone_visible(&self) -> bool {
        self.delete_zone_visible
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    // ---- pointer ----

    pub fn pointer_down(&mut self, pos: WorldPos, now_ms: u64) {
        if self.phase() != Phase::Player {
            return;
        }
        self.release_stale_grab();
        self.gesture.down(pos, now_ms);
        self.grab = self.hit_test(pos);
        let keep = match self.grab {
            Some(Grab::Block(id)) => Some(id),
            _ => None,
        };
        self.field.revert_all_ghosts(keep);
        self.pump_events();
        debug!(grab = ?self.grab, "pointer down");
    }

    pub fn pointer_move(&mut self, pos: WorldPos) {
        let Some(grab) = self.grab else {
            return;
        };
        if self.gesture.moved(pos) {
            if let Grab::Block(id) = grab {
                if let Err(err) = self.field.begin_drag(id) {
                    debug!(block = %id, reason = err.code(), "drag refused");
                    self.grab = None;
                    return;
                }
            }
        }
        if !self.gesture.is_dragging() {
            return;
        }
        match grab {
            Grab::Block(id) => {
                if let Err(err) = self.field.drag_to(id, pos) {
                    debug!(block = %id, reason = err.code(), "drag move ignored");
                }
            }
            Grab::Token(idx) => {
                if let Some(TrayItem::Expand(token)) = self.tray.get_mut(idx) {
                    token.position = pos;
                }
            }
        }
        self.pump_events();
    }

    pub fn pointer_up(&mut self, pos: WorldPos, now_ms: u64) -> Option<Interaction> {
        let kind = self.gesture.up(now_ms)?;
        let grab = self.grab.take()?;
        let outcome = match (grab, kind) {
            (Grab::Block(id), GestureKind::Tap) => self.tap_block(id),
            (Grab::Block(id), GestureKind::Drag) => self
                .field
                .end_drag(id, pos)
                .ok()
                .map(Interaction::Dropped),
            (Grab::Token(idx), GestureKind::Drag) => self.drop_token(idx, pos),
            (Grab::Token(_), GestureKind::Tap) => None,
        };
        self.pump_events();
        self.sync_tray();
        outcome
    }

    /// Settle a grab whose release never arrived
    ///
    /// Terminals drop the button-up when the pointer leaves the window, so a
    /// new press may find the previous block still lifted.
    fn release_stale_grab(&mut self) {
        let Some(grab) = self.grab.take() else {
            return;
        };
        self.gesture.cancel();
        match grab {
            Grab::Block(id) => {
                if self.field.block(id).is_some_and(|b| b.is_dragging()) {
                    match self.field.cancel_drag(id) {
                        Ok(outcome) => debug!(block = %id, ?outcome, "stale drag settled"),
                        Err(err) => debug!(block = %id, reason = err.code(), "stale drag not settled"),
                    }
                }
            }
            Grab::Token(idx) => {
                if let Some(TrayItem::Expand(token)) = self.tray.get_mut(idx) {
                    token.position = token.home;
                }
            }
        }
        self.pump_events();
        self.sync_tray();
    }

    fn tap_block(&mut self, id: BlockId) -> Option<Interaction> {
        let placed = self.field.block(id)?.is_placed();
        if placed {
            self.field
                .tap_rotate_if_placed(id)
                .ok()
                .map(Interaction::Rotated)
        } else {
            self.field.rotate(id).ok().map(Interaction::TrayRotated)
        }
    }

    fn drop_token(&mut self, idx: usize, pos: WorldPos) -> Option<Interaction> {
        let Some(TrayItem::Expand(token)) = self.tray.get_mut(idx) else {
            return None;
        };
        token.position = token.home;
        match self.field.expand_at_world(pos, 1) {
            Ok(report) => {
                self.tray.remove(idx);
                Some(Interaction::Expanded(report))
            }
            Err(why) => Some(Interaction::ExpandRejected(why)),
        }
    }

    /// Block under `pos`: grid owners first, then tray blocks, then tokens
    fn hit_test(&self, pos: WorldPos) -> Option<Grab> {
        let (grid, coord) = self.field.grids().world_to_grid(pos);
        if let Some(id) = self.field.block_at(grid, coord) {
            return Some(Grab::Block(id));
        }
        let half = self.field.grids().cell_size() / 2.0;
        for item in &self.tray {
            let TrayItem::Block(id) = *item else {
                continue;
            };
            let Some(block) = self.field.block(id) else {
                continue;
            };
            if block.is_placed() {
                continue;
            }
            let hit = block.shape.iter().any(|o| {
                let cell = block.position
                    + WorldPos::new(o.x as f32, o.y as f32).scale(self.field.grids().cell_size());
                (cell.x - pos.x).abs() <= half && (cell.y - pos.y).abs() <= half
            });
            if hit {
                return Some(Grab::Block(id));
            }
        }
        self.tray.iter().position(|item| {
            matches!(item, TrayItem::Expand(t) if t.position.distance(pos) <= TOKEN_REACH)
        })
        .map(Grab::Token)
    }

    /// Forward field events to the turrets and track the delete zone
    fn pump_events(&mut self) {
        for event in self.field.take_events() {
            match event {
                FieldEvent::DeleteZoneShown => self.delete_zone_visible = true,
                FieldEvent::DeleteZoneHidden => self.delete_zone_visible = false,
                _ => {}
            }
            self.turrets.apply(&event);
        }
    }

    /// Drop tray entries whose block left the tray
    fn sync_tray(&mut self) {
        let field = &self.field;
        self.tray.retain(|item| match item {
            TrayItem::Block(id) => field.block(*id).is_some_and(|b| !b.is_placed()),
            TrayItem::Expand(_) => true,
        });
    }

    fn deal(&mut self) {
        self.tray = self.spawner.deal(&mut self.field);
        self.pump_events();
    }

    // ---- turn flow ----

    /// Close the player phase: ghosts revert, tray leftovers are discarded
    pub fn end_turn(&mut self) -> Option<WavePlan> {
        if self.phase() != Phase::Player {
            return None;
        }
        self.release_stale_grab();
        self.field.revert_all_ghosts(None);
        self.field.discard_unplaced();
        self.tray.clear();
        self.pump_events();
        self.director.end_player_phase()
    }

    /// The wave runner is done; move to the next turn
    pub fn finish_wave(&mut self) -> bool {
        if !self.director.finish_enemy_phase() {
            return false;
        }
        self.deal();
        true
    }

    /// Advance enemies and turrets by `dt` seconds
    ///
    /// When the wave runner holds the roster the frame is skipped and its
    /// time is applied on the next tick that gets the lock.
    pub fn tick(&mut self, dt: f32) {
        if self.phase() != Phase::Enemy {
            self.pending_dt = 0.0;
            return;
        }
        let Ok(mut roster) = self.roster.try_lock() else {
            self.pending_dt += dt;
            return;
        };
        let dt = dt + std::mem::take(&mut self.pending_dt);
        let dealt = roster.advance(dt);
        if dealt > 0.0 {
            self.base.take_damage(dealt);
        }
        self.kills += self.turrets.fire(dt, &mut roster);
        if self.base.is_destroyed() {
            roster.clear();
            drop(roster);
            self.director.base_destroyed();
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TurnConfig;
    use crate::enemy::EnemyStats;
    use crate::types::{BlockKind, GridCoord, GridId};

    fn all_blocks() -> Session {
        Session::new(GameConfig {
            turn: TurnConfig {
                block_chance: 1.0,
                ..TurnConfig::default()
            },
            ..GameConfig::default()
        })
    }

    fn first_block(s: &Session) -> BlockId {
        match s.tray()[0] {
            TrayItem::Block(id) => id,
            TrayItem::Expand(_) => panic!("expected a block"),
        }
    }

    fn cell_world(s: &Session, grid: GridId, x: i32, y: i32) -> WorldPos {
        s.field().grids().grid_to_world(grid, GridCoord::new(x, y))
    }

    #[test]
    fn test_drag_from_tray_places_and_spawns_turret() {
        let mut s = all_blocks();
        let id = first_block(&s);
        let home = s.field().block(id).unwrap().position;
        let target = cell_world(&s, GridId::A, 0, 0);

        s.pointer_down(home, 0);
        assert_eq!(s.grab(), Some(Grab::Block(id)));
        s.pointer_move(target);
        let out = s.pointer_up(target, 500);
        assert!(matches!(out, Some(Interaction::Dropped(DropOutcome::Placed { .. }))));
        assert_eq!(s.turrets().len(), 1);
        assert_eq!(s.tray().len(), 2);
    }

    #[test]
    fn test_quick_tap_rotates_tray_block() {
        let mut s = all_blocks();
        let id = first_block(&s);
        let home = s.field().block(id).unwrap().position;
        s.pointer_down(home, 1000);
        assert_eq!(s.pointer_up(home, 1100), Some(Interaction::TrayRotated(1)));
    }

    #[test]
    fn test_drag_placed_block_shows_delete_zone() {
        let mut s = all_blocks();
        let id = first_block(&s);
        let home = s.field().block(id).unwrap().position;
        let target = cell_world(&s, GridId::B, 0, 0);
        s.pointer_down(home, 0);
        s.pointer_move(target);
        s.pointer_up(target, 400);

        s.pointer_down(target, 1000);
        s.pointer_move(WorldPos::new(9.5, 0.0));
        assert!(s.delete_zone_visible());
        let out = s.pointer_up(WorldPos::new(9.5, 0.0), 1500);
        assert_eq!(out, Some(Interaction::Dropped(DropOutcome::Deleted)));
        assert!(!s.delete_zone_visible());
        assert!(s.turrets().is_empty());
        assert!(s.field().block(id).is_none());
    }

    #[test]
    fn test_end_turn_discards_tray() {
        let mut s = all_blocks();
        let plan = s.end_turn().unwrap();
        assert_eq!(plan.count, 3);
        assert_eq!(s.field().block_count(), 0);
        assert!(s.tray().is_empty());
        assert_eq!(s.phase(), Phase::Enemy);

        assert!(s.finish_wave());
        assert_eq!(s.turn(), 2);
        assert_eq!(s.tray().len(), 3);
    }

    #[test]
    fn test_tick_damages_base_until_lost() {
        let mut s = Session::new(GameConfig {
            base_health: 10.0,
            ..GameConfig::default()
        });
        s.end_turn().unwrap();
        {
            let roster = s.roster();
            let mut r = roster.try_lock().unwrap();
            r.spawn(EnemyStats {
                health: 50.0,
                damage: 12.0,
                speed: 100.0,
            });
        }
        s.tick(1.0);
        assert!(s.base().is_destroyed());
        assert_eq!(s.phase(), Phase::Lost);
        assert!(s.roster().try_lock().unwrap().is_clear());
    }

    #[test]
    fn test_press_without_release_settles_lifted_block() {
        let mut s = all_blocks();
        let first = first_block(&s);
        let home = s.field().block(first).unwrap().position;
        let target = cell_world(&s, GridId::A, 0, 0);
        s.pointer_down(home, 0);
        s.pointer_move(target);
        s.pointer_up(target, 400);
        assert!(s.field().block(first).unwrap().is_placed());

        // Lift it again; the release never arrives
        s.pointer_down(target, 1000);
        s.pointer_move(WorldPos::new(0.0, -20.0));
        assert!(s.field().block(first).unwrap().is_dragging());
        assert!(s.delete_zone_visible());

        let second = first_block(&s);
        let home = s.field().block(second).unwrap().position;
        s.pointer_down(home, 2000);
        assert!(s.field().block(first).unwrap().is_placed());
        assert!(!s.delete_zone_visible());
        assert_eq!(s.grab(), Some(Grab::Block(second)));

        s.pointer_move(target);
        let out = s.pointer_up(target, 2500);
        assert!(!matches!(
            out,
            Some(Interaction::Dropped(DropOutcome::Placed { .. }))
        ));
        assert!(s.field().occupancy_consistent());

        assert!(s.end_turn().is_some());
        assert!(s.field().block(first).unwrap().is_placed());
        assert!(s.field().occupancy_consistent());
    }

    #[test]
    fn test_tick_skipped_while_locked_is_carried_over() {
        let mut s = Session::default();
        s.end_turn().unwrap();
        let roster = s.roster();
        {
            let mut r = roster.try_lock().unwrap();
            r.spawn(EnemyStats {
                health: 50.0,
                damage: 1.0,
                speed: 2.0,
            });
            s.tick(1.0);
            assert_eq!(r.enemies()[0].position, PATH[0]);
        }
        s.tick(0.5);
        let r = roster.try_lock().unwrap();
        assert!((r.enemies()[0].position.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_press_elsewhere_reverts_ghost() {
        let mut s = all_blocks();
        let id = first_block(&s);
        // Force a known shape so the ghost setup is deterministic
        let field = &mut s.field;
        let i = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
        field.place_at(i, GridId::A, GridCoord::new(-1, 2)).unwrap();
        assert_eq!(field.tap_rotate_if_placed(i), Ok(RotateOutcome::Ghosted));
        s.pump_events();

        let home = s.field().block(id).unwrap().position;
        s.pointer_down(home, 0);
        assert!(!s.field().block(i).unwrap().is_ghost());
    }
}
