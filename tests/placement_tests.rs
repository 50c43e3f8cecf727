//! Placement tests - drag lifecycle, recovery and the delete zone

use tetromerge::core::{BlockError, DropOutcome, Field, FieldConfig, FieldEvent, RectZone};
use tetromerge::types::{BlockKind, GridCoord, GridId, WorldPos};

fn c(x: i32, y: i32) -> GridCoord {
    GridCoord::new(x, y)
}

fn zoned_field() -> Field {
    Field::new(FieldConfig::default())
        .with_delete_zone(RectZone::new(WorldPos::new(20.0, -1.0), WorldPos::new(22.0, 1.0)))
}

fn world(field: &Field, grid: GridId, coord: GridCoord) -> WorldPos {
    field.grids().grid_to_world(grid, coord)
}

#[test]
fn test_drop_from_tray_places_block() {
    let mut field = Field::default();
    let id = field.spawn_block(BlockKind::L, 1, WorldPos::new(0.0, -8.0));
    field.begin_drag(id).unwrap();
    field.drag_to(id, WorldPos::new(4.0, 0.0)).unwrap();

    let target = world(&field, GridId::B, c(0, -1));
    assert_eq!(
        field.end_drag(id, target),
        Ok(DropOutcome::Placed {
            grid: GridId::B,
            anchor: c(0, -1)
        })
    );
    let block = field.block(id).unwrap();
    assert!(block.is_placed());
    assert_eq!(field.grids().occupied_count(GridId::B), 4);
    assert!(field.occupancy_consistent());

    let events = field.take_events();
    assert!(matches!(events.as_slice(), [FieldEvent::Placed { grid: GridId::B, level: 1, .. }]));
}

#[test]
fn test_failed_drop_returns_to_tray() {
    let mut field = Field::default();
    let home = WorldPos::new(-6.0, -8.0);
    let id = field.spawn_block(BlockKind::I, 1, home);
    field.begin_drag(id).unwrap();
    // I at anchor (2, 0) needs x = 4
    let target = world(&field, GridId::A, c(2, 0));
    assert_eq!(field.end_drag(id, target), Ok(DropOutcome::Returned));

    let block = field.block(id).unwrap();
    assert!(!block.is_placed());
    assert_eq!(block.position, home);
    assert_eq!(field.grids().occupied_count(GridId::A), 0);
}

#[test]
fn test_lifted_block_frees_cells_immediately() {
    let mut field = Field::default();
    let id = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
    field.place_at(id, GridId::A, c(0, 0)).unwrap();
    assert!(!field.grids().is_free(GridId::A, c(0, 0)));

    field.begin_drag(id).unwrap();
    assert!(field.grids().is_free(GridId::A, c(0, 0)));
    assert_eq!(field.block_at(GridId::A, c(0, 0)), None);
}

#[test]
fn test_lifted_block_moves_to_new_spot() {
    let mut field = Field::default();
    let id = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
    field.place_at(id, GridId::A, c(-2, -2)).unwrap();
    field.begin_drag(id).unwrap();

    let out = field.end_drag(id, world(&field, GridId::B, c(1, 1))).unwrap();
    assert_eq!(out, DropOutcome::Placed { grid: GridId::B, anchor: c(1, 1) });
    assert_eq!(field.grids().occupied_count(GridId::A), 0);
    assert_eq!(field.grids().occupied_count(GridId::B), 4);
    assert!(field.occupancy_consistent());
}

#[test]
fn test_failed_drop_restores_exact_cells() {
    let mut field = Field::default();
    let id = field.spawn_block(BlockKind::S, 1, WorldPos::ZERO);
    field.place_at(id, GridId::B, c(0, 0)).unwrap();
    let before = field.block(id).unwrap().placement().unwrap();

    field.begin_drag(id).unwrap();
    // Far above grid B: rounds to a cell that is not land
    assert_eq!(field.end_drag(id, WorldPos::new(5.0, 30.0)), Ok(DropOutcome::Restored));

    let after = field.block(id).unwrap().placement().unwrap();
    assert_eq!(before, after);
    for cell in after.cells() {
        assert_eq!(field.block_at(GridId::B, cell), Some(id));
    }
    assert!(field.occupancy_consistent());
}

#[test]
fn test_drop_on_blocked_cells_restores() {
    let mut field = Field::default();
    let blocker = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
    field.place_at(blocker, GridId::A, c(0, 0)).unwrap();
    let id = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);
    field.place_at(id, GridId::A, c(0, -2)).unwrap();

    field.begin_drag(id).unwrap();
    let out = field.end_drag(id, world(&field, GridId::A, c(0, 0))).unwrap();
    assert_eq!(out, DropOutcome::Restored);
    assert_eq!(field.block(id).unwrap().placement().map(|p| p.anchor), Some(c(0, -2)));
    assert!(field.occupancy_consistent());
}

#[test]
fn test_delete_zone_removes_lifted_block() {
    let mut field = zoned_field();
    let id = field.spawn_block(BlockKind::Z, 1, WorldPos::ZERO);
    field.place_at(id, GridId::A, c(0, 0)).unwrap();
    field.take_events();

    field.begin_drag(id).unwrap();
    assert_eq!(field.take_events(), vec![FieldEvent::DeleteZoneShown]);

    assert_eq!(field.end_drag(id, WorldPos::new(21.0, 0.0)), Ok(DropOutcome::Deleted));
    assert!(field.block(id).is_none());
    assert_eq!(field.grids().occupied_count(GridId::A), 0);
    assert_eq!(
        field.take_events(),
        vec![FieldEvent::DeleteZoneHidden, FieldEvent::Removed { block: id }]
    );
}

#[test]
fn test_delete_zone_ignores_tray_blocks() {
    let mut field = zoned_field();
    let id = field.spawn_block(BlockKind::Z, 1, WorldPos::new(0.0, -8.0));
    field.begin_drag(id).unwrap();
    assert!(field.take_events().is_empty());

    assert_eq!(field.end_drag(id, WorldPos::new(21.0, 0.0)), Ok(DropOutcome::Returned));
    assert!(field.block(id).is_some());
    assert!(field.take_events().is_empty());
}

#[test]
fn test_wrong_state_calls_are_rejected() {
    let mut field = Field::default();
    let id = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
    assert_eq!(field.end_drag(id, WorldPos::ZERO), Err(BlockError::NotDragging));
    assert_eq!(field.drag_to(id, WorldPos::ZERO), Err(BlockError::NotDragging));
    field.begin_drag(id).unwrap();
    assert_eq!(field.begin_drag(id), Err(BlockError::AlreadyDragging));
    assert_eq!(field.rotate(id), Err(BlockError::AlreadyDragging));

    let ghost = tetromerge::types::BlockId(999);
    assert_eq!(field.begin_drag(ghost), Err(BlockError::UnknownBlock(ghost)));
}

#[test]
fn test_tray_rotation_only_before_placement() {
    let mut field = Field::default();
    let id = field.spawn_block(BlockKind::J, 1, WorldPos::ZERO);
    assert_eq!(field.rotate(id), Ok(1));
    assert_eq!(field.rotate(id), Ok(2));
    field.place_at(id, GridId::A, c(0, 0)).unwrap();
    assert_eq!(field.block(id).unwrap().rotation, 2);
    assert_eq!(field.rotate(id), Err(BlockError::AlreadyPlaced));
}

#[test]
fn test_discard_unplaced_keeps_board() {
    let mut field = Field::default();
    let placed = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
    field.place_at(placed, GridId::A, c(0, 0)).unwrap();
    let tray = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);
    let spare = field.spawn_block(BlockKind::I, 1, WorldPos::ZERO);
    let lifted = field.spawn_block(BlockKind::S, 1, WorldPos::ZERO);
    field.place_at(lifted, GridId::B, c(0, 0)).unwrap();
    field.begin_drag(lifted).unwrap();

    let mut removed = field.discard_unplaced();
    removed.sort();
    assert_eq!(removed, vec![tray, spare]);
    assert!(field.block(placed).unwrap().is_placed());
    assert!(field.block(lifted).unwrap().is_placed());
    assert!(field.occupancy_consistent());
}

#[test]
fn test_only_one_drag_at_a_time() {
    let mut field = Field::default();
    let o = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
    field.place_at(o, GridId::A, c(0, 0)).unwrap();
    let t = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);

    field.begin_drag(o).unwrap();
    assert_eq!(field.begin_drag(t), Err(BlockError::DragInProgress(o)));
    assert_eq!(
        field.end_drag(o, WorldPos::new(-5.0, 30.0)),
        Ok(DropOutcome::Restored)
    );
    assert_eq!(field.block_at(GridId::A, c(1, 1)), Some(o));
    assert!(field.occupancy_consistent());
}

#[test]
fn test_restore_onto_taken_cells_destroys_lifted_block() {
    let mut field = Field::default();
    let o = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
    field.place_at(o, GridId::A, c(0, 0)).unwrap();
    let t = field.spawn_block(BlockKind::T, 1, WorldPos::ZERO);

    field.begin_drag(o).unwrap();
    // Direct placement may still claim the freed cells mid-drag
    assert!(field.place_at(t, GridId::A, c(0, 0)).unwrap());
    field.take_events();

    assert_eq!(
        field.end_drag(o, WorldPos::new(-5.0, 30.0)),
        Ok(DropOutcome::Deleted)
    );
    assert!(field.block(o).is_none());
    assert_eq!(field.block_at(GridId::A, c(0, 0)), Some(t));
    assert_eq!(
        field.take_events(),
        vec![FieldEvent::DeleteZoneHidden, FieldEvent::Removed { block: o }]
    );
    assert!(field.occupancy_consistent());
}

#[test]
fn test_discard_with_taken_cells_destroys_lifted_block() {
    let mut field = Field::default();
    let o = field.spawn_block(BlockKind::O, 1, WorldPos::ZERO);
    field.place_at(o, GridId::B, c(-1, -1)).unwrap();
    let s = field.spawn_block(BlockKind::S, 1, WorldPos::ZERO);

    field.begin_drag(o).unwrap();
    assert!(field.place_at(s, GridId::B, c(0, -1)).unwrap());

    assert_eq!(field.discard_unplaced(), vec![o]);
    assert!(field.block(s).unwrap().is_placed());
    assert!(field.occupancy_consistent());
}
