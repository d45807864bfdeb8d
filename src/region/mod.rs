pub mod graph;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, info};

use crate::config::EnclosureBounds;
use crate::grid::CollisionGrid;
use crate::types::{square_ring, Cell, RegionId, CELLS_PER_UNIT};

/// Cell-space rectangle, max edges exclusive. Region polygons put their
/// vertices on the cell-corner lattice, so two slices that touch share the
/// corner vertices along their common edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub min_row: i32,
    pub min_col: i32,
    pub max_row: i32,
    pub max_col: i32,
}

impl CellRect {
    pub fn width(&self) -> i32 {
        self.max_col - self.min_col
    }

    pub fn height(&self) -> i32 {
        self.max_row - self.min_row
    }

    pub fn contains_cell(&self, cell: Cell) -> bool {
        cell.row >= self.min_row
            && cell.row < self.max_row
            && cell.col >= self.min_col
            && cell.col < self.max_col
    }
}

/// One coarse routing region: a convex polygon over the fine grid, immutable
/// once built. `center` is the interior cell macro routes pass through;
/// `None` means no statically walkable cell was found inside the polygon and
/// no macro route may use this region as a waypoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Corner-lattice vertices in CCW order around the centroid.
    pub vertices: SmallVec<[Cell; 8]>,
    pub bounds: CellRect,
    pub center: Option<Cell>,
}

impl Region {
    /// Membership by ray-cast parity, evaluated at the cell's center so
    /// lattice-edge cells resolve to exactly one of two touching regions.
    pub fn contains_cell(&self, cell: Cell) -> bool {
        let px = cell.col as f32 + 0.5;
        let pz = cell.row as f32 + 0.5;
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, zi) = (self.vertices[i].col as f32, self.vertices[i].row as f32);
            let (xj, zj) = (self.vertices[j].col as f32, self.vertices[j].row as f32);
            if (zi > pz) != (zj > pz) && px < (xj - xi) * (pz - zi) / (zj - zi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Decompose the battlefield into routing regions: the enclosure region
/// first (id 0), then each quadrant recursively halved until no side
/// exceeds `side_limit` cells. The last slice on each axis absorbs the
/// integer remainder, so the quadrant is covered with no gaps.
pub fn partition(grid: &CollisionGrid, enclosure: &EnclosureBounds, side_limit: i32) -> Vec<Region> {
    let mut regions = Vec::new();
    regions.push(build_region(
        RegionId(0),
        enclosure_rect(grid, enclosure),
        grid,
    ));

    let (rows, cols) = (grid.rows(), grid.cols());
    let (mid_row, mid_col) = (rows / 2, cols / 2);
    let quadrants = [
        CellRect { min_row: 0, min_col: 0, max_row: mid_row, max_col: mid_col },
        CellRect { min_row: 0, min_col: mid_col, max_row: mid_row, max_col: cols },
        CellRect { min_row: mid_row, min_col: 0, max_row: rows, max_col: mid_col },
        CellRect { min_row: mid_row, min_col: mid_col, max_row: rows, max_col: cols },
    ];

    for quad in quadrants {
        let row_slices = slice_axis(quad.min_row, quad.height(), side_limit);
        let col_slices = slice_axis(quad.min_col, quad.width(), side_limit);
        for &(row0, height) in &row_slices {
            for &(col0, width) in &col_slices {
                let rect = CellRect {
                    min_row: row0,
                    min_col: col0,
                    max_row: row0 + height,
                    max_col: col0 + width,
                };
                let id = RegionId(regions.len() as u16);
                regions.push(build_region(id, rect, grid));
            }
        }
    }

    let without_center = regions.iter().filter(|r| r.center.is_none()).count();
    info!(
        "[PARTITION] built {} regions (side limit {} cells), {} without a walkable center",
        regions.len(),
        side_limit,
        without_center
    );
    regions
}

/// Split `extent` cells starting at `start` by repeated halving until the
/// slice length no longer exceeds `limit`. Slice count is a power of two;
/// the final slice takes whatever division left over.
fn slice_axis(start: i32, extent: i32, limit: i32) -> Vec<(i32, i32)> {
    if extent <= 0 {
        return Vec::new();
    }
    let mut halves = 1;
    let mut span = extent;
    while span > limit {
        span /= 2;
        halves *= 2;
    }
    let base = extent / halves;
    (0..halves)
        .map(|i| {
            let len = if i == halves - 1 { extent - base * (halves - 1) } else { base };
            (start + i * base, len)
        })
        .collect()
}

/// Enclosure rectangle in cell space, clamped to the grid. A fence pushed
/// entirely off-grid degenerates to a single clamped cell.
fn enclosure_rect(grid: &CollisionGrid, enclosure: &EnclosureBounds) -> CellRect {
    let bounds = grid.bounds();
    let center_col = ((enclosure.center_x - bounds.min_x) * CELLS_PER_UNIT as f32).floor() as i32;
    let center_row = ((enclosure.center_z - bounds.min_z) * CELLS_PER_UNIT as f32).floor() as i32;
    let width = ((enclosure.size_x * CELLS_PER_UNIT as f32).round() as i32).max(1);
    let depth = ((enclosure.size_z * CELLS_PER_UNIT as f32).round() as i32).max(1);

    let min_col = (center_col - width / 2).clamp(0, grid.cols() - 1);
    let min_row = (center_row - depth / 2).clamp(0, grid.rows() - 1);
    let max_col = (min_col + width).min(grid.cols()).max(min_col + 1);
    let max_row = (min_row + depth).min(grid.rows()).max(min_row + 1);
    CellRect { min_row, min_col, max_row, max_col }
}

fn build_region(id: RegionId, rect: CellRect, grid: &CollisionGrid) -> Region {
    let mut vertices: SmallVec<[Cell; 8]> = smallvec![
        Cell::new(rect.min_row, rect.min_col),
        Cell::new(rect.min_row, rect.max_col),
        Cell::new(rect.max_row, rect.max_col),
        Cell::new(rect.max_row, rect.min_col),
    ];
    sort_ccw(&mut vertices);
    let center = resolve_center(&rect, grid);
    if center.is_none() {
        debug!("[PARTITION] region {:?} has no walkable center cell", id);
    }
    Region { id, vertices, bounds: rect, center }
}

/// Sort polygon vertices counter-clockwise around their centroid, by angle
/// with centroid distance as the tie-break, so adjacency and membership
/// tests are well-defined regardless of construction order.
fn sort_ccw(vertices: &mut SmallVec<[Cell; 8]>) {
    let n = vertices.len() as f32;
    let cx = vertices.iter().map(|v| v.col as f32).sum::<f32>() / n;
    let cz = vertices.iter().map(|v| v.row as f32).sum::<f32>() / n;
    vertices.sort_by(|a, b| {
        let angle_a = (a.row as f32 - cz).atan2(a.col as f32 - cx);
        let angle_b = (b.row as f32 - cz).atan2(b.col as f32 - cx);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let da = (a.row as f32 - cz).powi(2) + (a.col as f32 - cx).powi(2);
                let db = (b.row as f32 - cz).powi(2) + (b.col as f32 - cx).powi(2);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

/// Spiral outward in growing square rings from the bounding-box midpoint
/// until a statically walkable cell is found. Gives up once the ring lies
/// entirely outside the polygon bounds.
fn resolve_center(rect: &CellRect, grid: &CollisionGrid) -> Option<Cell> {
    let mid = Cell::new(
        rect.min_row + (rect.height() - 1) / 2,
        rect.min_col + (rect.width() - 1) / 2,
    );
    let max_radius = rect.height().max(rect.width());
    for radius in 0..=max_radius {
        for cell in square_ring(mid, radius) {
            if !rect.contains_cell(cell) {
                continue;
            }
            if !grid.is_ground_blocked(cell) {
                return Some(cell);
            }
        }
    }
    None
}
