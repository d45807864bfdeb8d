use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::grid::{CollisionGrid, OccupancyLayers};
use crate::types::{Cell, GridObject, NEIGHBOR_STEPS};

/// 8-directional A* over the fine grid.
///
/// Octile step costs (10 orthogonal, 14 diagonal) with the battlefield's
/// fixed greedy heuristic: squared Euclidean distance scaled by 10. The
/// heuristic overestimates, which keeps searches tight around the straight
/// line at the cost of global optimality. The contract is a reachable,
/// collision-free path, not a shortest one.
///
/// # Contract
///
/// - The open set pops the **lowest** f-cost entry first (insertion order
///   breaks ties deterministically).
/// - An exhausted open set returns `None`. No partial path toward the
///   closest explored cell is ever fabricated.
///
/// The score, parent and visited tables are arena buffers stamped with a
/// search generation and reused across calls: no per-search O(grid)
/// allocation, and safely reentrant within the one-thread-per-room model.
#[derive(Debug)]
pub struct FineGridPathfinder {
    rows: i32,
    cols: i32,
    generation: u32,
    /// Generation at which `g`/`parent` were last written per cell.
    touched: Vec<u32>,
    /// Generation at which a cell was expanded (closed set).
    closed: Vec<u32>,
    g: Vec<u32>,
    parent: Vec<Cell>,
    open: BinaryHeap<Reverse<(u32, u32, i32, i32)>>,
    expanded: usize,
}

impl FineGridPathfinder {
    pub fn new(rows: i32, cols: i32) -> Self {
        let cell_count = (rows as usize) * (cols as usize);
        Self {
            rows,
            cols,
            generation: 0,
            touched: vec![0; cell_count],
            closed: vec![0; cell_count],
            g: vec![0; cell_count],
            parent: vec![Cell::new(0, 0); cell_count],
            open: BinaryHeap::new(),
            expanded: 0,
        }
    }

    pub fn for_grid(grid: &CollisionGrid) -> Self {
        Self::new(grid.rows(), grid.cols())
    }

    /// Cells expanded since construction, across all searches. Callers
    /// meter one request by snapshotting before and after.
    pub fn total_expanded(&self) -> usize {
        self.expanded
    }

    #[inline]
    fn idx(&self, cell: Cell) -> usize {
        (cell.row as usize) * (self.cols as usize) + cell.col as usize
    }

    #[inline]
    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    fn heuristic(from: Cell, to: Cell) -> u32 {
        let dx = (from.col - to.col).unsigned_abs();
        let dz = (from.row - to.row).unsigned_abs();
        10 * (dx * dx + dz * dz)
    }

    /// Search a cell path from `start` to `dest` for `obj`.
    ///
    /// Passability delegates to the occupancy layers with the object's
    /// oriented footprint (self and current target exempt). When
    /// `ignore_dest_collision` is set the destination cell itself skips all
    /// passability checks, to allow pathing onto a cell that will be
    /// vacated or struck on arrival.
    ///
    /// Returns the full cell-by-cell path including both endpoints, or
    /// `None` when no path exists.
    pub fn search(
        &mut self,
        grid: &CollisionGrid,
        occupancy: &OccupancyLayers,
        obj: &GridObject,
        start: Cell,
        dest: Cell,
        check_occupants: bool,
        ignore_dest_collision: bool,
    ) -> Option<Vec<Cell>> {
        if !self.in_bounds(start) || !self.in_bounds(dest) {
            return None;
        }
        if start == dest {
            return Some(vec![start]);
        }
        if !ignore_dest_collision && !occupancy.can_stand(grid, obj, dest, check_occupants) {
            return None;
        }

        self.begin_generation();
        let generation = self.generation;
        let mut seq: u32 = 0;

        let start_idx = self.idx(start);
        self.touched[start_idx] = generation;
        self.g[start_idx] = 0;
        self.parent[start_idx] = start;
        self.open
            .push(Reverse((Self::heuristic(start, dest), seq, start.row, start.col)));

        while let Some(Reverse((_f, _seq, row, col))) = self.open.pop() {
            let current = Cell::new(row, col);
            let current_idx = self.idx(current);
            if self.closed[current_idx] == generation {
                continue;
            }
            self.closed[current_idx] = generation;
            self.expanded += 1;

            if current == dest {
                return Some(self.reconstruct(start, dest));
            }

            for (d_row, d_col, step) in NEIGHBOR_STEPS {
                let next = current.offset(d_row, d_col);
                if !self.in_bounds(next) {
                    continue;
                }
                let next_idx = self.idx(next);
                if self.closed[next_idx] == generation {
                    continue;
                }
                let passable = (ignore_dest_collision && next == dest)
                    || occupancy.can_stand(grid, obj, next, check_occupants);
                if !passable {
                    continue;
                }

                let tentative = self.g[current_idx] + step;
                if self.touched[next_idx] != generation || tentative < self.g[next_idx] {
                    self.touched[next_idx] = generation;
                    self.g[next_idx] = tentative;
                    self.parent[next_idx] = current;
                    seq += 1;
                    self.open.push(Reverse((
                        tentative + Self::heuristic(next, dest),
                        seq,
                        next.row,
                        next.col,
                    )));
                }
            }
        }

        None
    }

    /// Walk the parent table from `dest` back to `start` and reverse into
    /// forward order.
    fn reconstruct(&self, start: Cell, dest: Cell) -> Vec<Cell> {
        let mut path = Vec::new();
        let mut cursor = dest;
        path.push(cursor);
        while cursor != start {
            cursor = self.parent[self.idx(cursor)];
            path.push(cursor);
        }
        path.reverse();
        path
    }

    fn begin_generation(&mut self) {
        self.open.clear();
        if self.generation == u32::MAX {
            // one reset per 2^32 searches keeps the stamps sound
            self.touched.fill(0);
            self.closed.fill(0);
            self.generation = 0;
        }
        self.generation += 1;
    }
}
