//! Grid module - two sparse, growable cell maps
//!
//! Each grid maps a [`GridCoord`] to a free flag. A coordinate that is not a
//! key is not land at all, which is different from a present but occupied
//! cell. Both cases make a placement fail; [`GridStore::check_place`] says
//! which one applied.
//!
//! Grids start as a rectangle of `seed_width x seed_height` cells centred on
//! their origin and only ever grow by adding cells 4-adjacent to existing
//! ones, so a grid never splits into islands.
//!
//! Occupied cells can also record the [`BlockId`] that owns them. Merge and
//! hit-test lookups read this index instead of scanning every block.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use arrayvec::ArrayVec;
use tracing::{debug, info};

use crate::config::FieldConfig;
use crate::error::{ExpandRejection, PlaceRejection};
use crate::rng::SimpleRng;
use crate::shapes::{footprint, Shape};
use crate::types::{BlockId, GridCoord, GridId, WorldPos};

/// Cells added by one expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandReport {
    pub grid: GridId,
    /// The target cell first, then any extra cells
    pub cells: ArrayVec<GridCoord, 4>,
}

#[derive(Debug, Clone)]
pub struct GridStore {
    cells: [BTreeMap<GridCoord, bool>; 2],
    owners: [HashMap<GridCoord, BlockId>; 2],
    origins: [WorldPos; 2],
    cell_size: f32,
}

impl GridStore {
    /// Build both grids from the seed rectangle in `config`
    pub fn new(config: &FieldConfig) -> Self {
        let half = config.grid_separation / 2.0;
        let mut store = Self {
            cells: [BTreeMap::new(), BTreeMap::new()],
            owners: [HashMap::new(), HashMap::new()],
            origins: [WorldPos::new(-half, 0.0), WorldPos::new(half, 0.0)],
            cell_size: config.cell_size,
        };
        store.initialize(config.seed_width, config.seed_height);
        store
    }

    /// Reset both grids to a free `w x h` rectangle spanning `[-w/2, w/2] x [-h/2, h/2]`
    pub fn initialize(&mut self, width: u32, height: u32) {
        let hw = (width / 2) as i32;
        let hh = (height / 2) as i32;
        for grid in GridId::ALL {
            let map = &mut self.cells[grid.index()];
            map.clear();
            self.owners[grid.index()].clear();
            for x in -hw..=hw {
                for y in -hh..=hh {
                    map.insert(GridCoord::new(x, y), true);
                }
            }
        }
        debug!(width, height, "grids initialized");
    }

    pub fn origin(&self, grid: GridId) -> WorldPos {
        self.origins[grid.index()]
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    // ---- spatial transforms ----

    /// Pick the grid whose origin is nearer, then round to the nearest cell
    ///
    /// An exact tie goes to grid B.
    pub fn world_to_grid(&self, pos: WorldPos) -> (GridId, GridCoord) {
        let da = pos.distance(self.origins[0]);
        let db = pos.distance(self.origins[1]);
        let grid = if da < db { GridId::A } else { GridId::B };
        let local = pos - self.origin(grid);
        let coord = GridCoord::new(
            (local.x / self.cell_size).round() as i32,
            (local.y / self.cell_size).round() as i32,
        );
        (grid, coord)
    }

    pub fn grid_to_world(&self, grid: GridId, coord: GridCoord) -> WorldPos {
        let o = self.origin(grid);
        WorldPos::new(
            o.x + coord.x as f32 * self.cell_size,
            o.y + coord.y as f32 * self.cell_size,
        )
    }

    /// World-space centre of the cells `shape` covers at `anchor`
    pub fn centroid(&self, grid: GridId, anchor: GridCoord, shape: &Shape) -> WorldPos {
        let mut sum = WorldPos::ZERO;
        for cell in footprint(anchor, shape) {
            sum = sum + self.grid_to_world(grid, cell);
        }
        sum.scale(1.0 / shape.len() as f32)
    }

    // ---- queries ----

    pub fn is_member(&self, grid: GridId, coord: GridCoord) -> bool {
        self.cells[grid.index()].contains_key(&coord)
    }

    /// Present and not occupied
    pub fn is_free(&self, grid: GridId, coord: GridCoord) -> bool {
        self.cells[grid.index()].get(&coord).copied().unwrap_or(false)
    }

    pub fn cell_count(&self, grid: GridId) -> usize {
        self.cells[grid.index()].len()
    }

    /// All member cells with their free flag, in coordinate order
    pub fn cells(&self, grid: GridId) -> impl Iterator<Item = (GridCoord, bool)> + '_ {
        self.cells[grid.index()].iter().map(|(c, free)| (*c, *free))
    }

    pub fn available_cells(&self, grid: GridId) -> Vec<GridCoord> {
        self.cells(grid)
            .filter_map(|(c, free)| free.then_some(c))
            .collect()
    }

    /// Number of occupied cells in one grid
    pub fn occupied_count(&self, grid: GridId) -> usize {
        self.cells[grid.index()].values().filter(|free| !**free).count()
    }

    pub fn owner_at(&self, grid: GridId, coord: GridCoord) -> Option<BlockId> {
        self.owners[grid.index()].get(&coord).copied()
    }

    /// Check every covered cell, reporting the first one that fails
    pub fn check_place(
        &self,
        grid: GridId,
        anchor: GridCoord,
        shape: &Shape,
    ) -> Result<(), PlaceRejection> {
        let map = &self.cells[grid.index()];
        for cell in footprint(anchor, shape) {
            match map.get(&cell) {
                None => return Err(PlaceRejection::OffGrid(cell)),
                Some(false) => return Err(PlaceRejection::Occupied(cell)),
                Some(true) => {}
            }
        }
        Ok(())
    }

    #[inline]
    pub fn can_place(&self, grid: GridId, anchor: GridCoord, shape: &Shape) -> bool {
        self.check_place(grid, anchor, shape).is_ok()
    }

    // ---- mutations ----

    /// Mark covered cells occupied; cells that are not land are skipped
    pub fn occupy(&mut self, grid: GridId, anchor: GridCoord, shape: &Shape) {
        self.mark(grid, anchor, shape, false, None);
    }

    /// Like [`occupy`](Self::occupy), also recording `owner` for each cell
    pub fn occupy_owned(&mut self, grid: GridId, anchor: GridCoord, shape: &Shape, owner: BlockId) {
        self.mark(grid, anchor, shape, false, Some(owner));
    }

    /// Mark covered cells free and forget their owner
    pub fn free(&mut self, grid: GridId, anchor: GridCoord, shape: &Shape) {
        self.mark(grid, anchor, shape, true, None);
    }

    fn mark(
        &mut self,
        grid: GridId,
        anchor: GridCoord,
        shape: &Shape,
        free: bool,
        owner: Option<BlockId>,
    ) {
        let map = &mut self.cells[grid.index()];
        let owners = &mut self.owners[grid.index()];
        for cell in footprint(anchor, shape) {
            let Some(flag) = map.get_mut(&cell) else {
                continue;
            };
            *flag = free;
            if free {
                owners.remove(&cell);
            } else if let Some(id) = owner {
                owners.insert(cell, id);
            }
        }
    }

    // ---- dual-grid convenience ----

    /// First grid (A, then B) that can take the shape
    pub fn can_place_any(&self, anchor: GridCoord, shape: &Shape) -> Option<GridId> {
        GridId::ALL
            .into_iter()
            .find(|g| self.can_place(*g, anchor, shape))
    }

    /// Occupy on the first grid that can take the shape; only that grid is touched
    pub fn occupy_any(&mut self, anchor: GridCoord, shape: &Shape) -> Option<GridId> {
        let grid = self.can_place_any(anchor, shape)?;
        self.occupy(grid, anchor, shape);
        Some(grid)
    }

    /// Free on the first grid where every covered cell is occupied
    pub fn free_any(&mut self, anchor: GridCoord, shape: &Shape) -> Option<GridId> {
        let grid = GridId::ALL.into_iter().find(|g| {
            footprint(anchor, shape)
                .iter()
                .all(|c| self.cells[g.index()].get(c) == Some(&false))
        })?;
        self.free(grid, anchor, shape);
        Some(grid)
    }

    // ---- expansion ----

    /// Add `target` and up to `count - 1` of its absent neighbours
    ///
    /// `target` must touch the grid. Rejection leaves the grid untouched.
    pub fn try_expand(
        &mut self,
        grid: GridId,
        target: GridCoord,
        count: usize,
        rng: &mut SimpleRng,
    ) -> Result<ExpandReport, ExpandRejection> {
        let map = &mut self.cells[grid.index()];
        if !target.neighbors().iter().any(|n| map.contains_key(n)) {
            return Err(ExpandRejection::NotAdjacent(target));
        }
        if map.contains_key(&target) {
            return Err(ExpandRejection::AlreadyPresent(target));
        }

        map.insert(target, true);
        let mut cells = ArrayVec::new();
        cells.push(target);

        if count > 1 {
            // Every absent neighbour now touches `target`
            let mut candidates: Vec<GridCoord> = target
                .neighbors()
                .into_iter()
                .filter(|n| !map.contains_key(n))
                .collect();
            for _ in 1..count {
                let Some(extra) = rng.take_one(&mut candidates) else {
                    break;
                };
                map.insert(extra, true);
                cells.push(extra);
            }
        }

        info!(grid = ?grid, target = %target, added = cells.len(), "grid expanded");
        Ok(ExpandReport { grid, cells })
    }

    /// Boolean view of [`try_expand`](Self::try_expand)
    pub fn expand(
        &mut self,
        grid: GridId,
        target: GridCoord,
        count: usize,
        rng: &mut SimpleRng,
    ) -> bool {
        self.try_expand(grid, target, count, rng).is_ok()
    }

    /// Resolve `pos` to a grid cell and expand there
    pub fn expand_at_world(
        &mut self,
        pos: WorldPos,
        count: usize,
        rng: &mut SimpleRng,
    ) -> Result<ExpandReport, ExpandRejection> {
        let (grid, coord) = self.world_to_grid(pos);
        self.try_expand(grid, coord, count, rng)
    }

    /// Absent cells 4-adjacent to a member, in coordinate order
    pub fn frontier(&self, grid: GridId) -> Vec<GridCoord> {
        let map = &self.cells[grid.index()];
        let mut out = BTreeSet::new();
        for c in map.keys() {
            for n in c.neighbors() {
                if !map.contains_key(&n) {
                    out.insert(n);
                }
            }
        }
        out.into_iter().collect()
    }

    /// Grow by up to `count` random frontier cells
    pub fn expand_frontier(
        &mut self,
        grid: GridId,
        count: usize,
        rng: &mut SimpleRng,
    ) -> Result<Vec<GridCoord>, ExpandRejection> {
        let mut candidates = self.frontier(grid);
        let mut added = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(cell) = rng.take_one(&mut candidates) else {
                break;
            };
            self.cells[grid.index()].insert(cell, true);
            added.push(cell);
        }
        if added.is_empty() {
            return Err(ExpandRejection::Exhausted);
        }
        info!(grid = ?grid, added = added.len(), "frontier expanded");
        Ok(added)
    }

    /// [`expand_frontier`](Self::expand_frontier) on both grids; true if either grew
    pub fn expand_frontier_both(&mut self, count: usize, rng: &mut SimpleRng) -> bool {
        let a = self.expand_frontier(GridId::A, count, rng).is_ok();
        let b = self.expand_frontier(GridId::B, count, rng).is_ok();
        a || b
    }
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new(&FieldConfig::default())
    }
}
