mod occupancy;
mod placement;

pub use occupancy::OccupancyLayers;
pub use placement::find_spawn_cell;

use std::path::Path;

use fixedbitset::FixedBitSet;
use tracing::info;

use crate::config::{BattlefieldConfig, WorldBounds};
use crate::error::{MapAssetError, MapAssetErrorKind};
use crate::types::{Cell, WorldPoint, CELLS_PER_UNIT};

/// Map-asset byte marking a cell that blocks ground movement only.
const CHAR_GROUND_BLOCK: u8 = b'1';
/// Map-asset byte marking a cell that blocks both ground and air movement.
const CHAR_FULL_BLOCK: u8 = b'2';

/// Static per-cell walkability for one battlefield, derived from a map
/// asset at room creation and immutable afterwards.
///
/// The fine grid spans the configured world bounds at 4 cells per world
/// unit. Row 0 is the northernmost row (minimum z), column 0 the westernmost
/// (minimum x). Two bitmaps carry the static state: ground-blocking cells
/// and the subset that additionally blocks air movement.
#[derive(Clone, Debug)]
pub struct CollisionGrid {
    rows: i32,
    cols: i32,
    bounds: WorldBounds,
    ground_blocked: FixedBitSet,
    air_blocked: FixedBitSet,
}

impl CollisionGrid {
    /// Load the map asset for `map_id`, resolved as `<map_dir>/<map_id>.map`.
    ///
    /// The asset is a plain-text grid, one line per grid row. A missing
    /// file, fewer lines than the grid height, or a line shorter than the
    /// grid width aborts room creation.
    pub fn load(map_id: &str, config: &BattlefieldConfig) -> Result<Self, MapAssetError> {
        let path = config.map_dir.join(format!("{map_id}.map"));
        Self::load_path(&path, config.bounds)
    }

    pub fn load_path(path: &Path, bounds: WorldBounds) -> Result<Self, MapAssetError> {
        let text = std::fs::read_to_string(path).map_err(|e| MapAssetError {
            path: path.to_path_buf(),
            kind: MapAssetErrorKind::Io(e),
        })?;
        let grid = Self::from_ascii(&text, bounds).map_err(|kind| MapAssetError {
            path: path.to_path_buf(),
            kind,
        })?;
        info!(
            "[MAP] loaded {:?}: {}x{} cells, {} ground-blocked, {} air-blocked",
            path,
            grid.rows,
            grid.cols,
            grid.ground_blocked.count_ones(..),
            grid.air_blocked.count_ones(..)
        );
        Ok(grid)
    }

    /// Build a grid from in-memory map text. `load` delegates here; tests
    /// and procedural rooms feed strings directly.
    pub fn from_ascii(text: &str, bounds: WorldBounds) -> Result<Self, MapAssetErrorKind> {
        let rows = (bounds.depth() * CELLS_PER_UNIT as f32).round() as i32;
        let cols = (bounds.width() * CELLS_PER_UNIT as f32).round() as i32;
        let cell_count = (rows as usize) * (cols as usize);

        let mut ground_blocked = FixedBitSet::with_capacity(cell_count);
        let mut air_blocked = FixedBitSet::with_capacity(cell_count);

        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < rows as usize {
            return Err(MapAssetErrorKind::Truncated {
                expected: rows as usize,
                found: lines.len(),
            });
        }
        for (row, line) in lines.iter().take(rows as usize).enumerate() {
            let bytes = line.as_bytes();
            if bytes.len() < cols as usize {
                return Err(MapAssetErrorKind::RowTooShort {
                    row,
                    expected: cols as usize,
                    found: bytes.len(),
                });
            }
            for (col, &byte) in bytes.iter().take(cols as usize).enumerate() {
                let idx = row * cols as usize + col;
                match byte {
                    CHAR_GROUND_BLOCK => ground_blocked.insert(idx),
                    CHAR_FULL_BLOCK => {
                        ground_blocked.insert(idx);
                        air_blocked.insert(idx);
                    }
                    _ => {}
                }
            }
        }

        Ok(Self {
            rows,
            cols,
            bounds,
            ground_blocked,
            air_blocked,
        })
    }

    /// Fully open grid over `bounds`; obstacles come only from occupants.
    pub fn open(bounds: WorldBounds) -> Self {
        let rows = (bounds.depth() * CELLS_PER_UNIT as f32).round() as i32;
        let cols = (bounds.width() * CELLS_PER_UNIT as f32).round() as i32;
        let cell_count = (rows as usize) * (cols as usize);
        Self {
            rows,
            cols,
            bounds,
            ground_blocked: FixedBitSet::with_capacity(cell_count),
            air_blocked: FixedBitSet::with_capacity(cell_count),
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    #[inline]
    pub(crate) fn idx(&self, cell: Cell) -> usize {
        (cell.row as usize) * (self.cols as usize) + cell.col as usize
    }

    #[inline]
    pub fn is_ground_blocked(&self, cell: Cell) -> bool {
        !self.in_bounds(cell) || self.ground_blocked.contains(self.idx(cell))
    }

    #[inline]
    pub fn is_air_blocked(&self, cell: Cell) -> bool {
        !self.in_bounds(cell) || self.air_blocked.contains(self.idx(cell))
    }

    /// Quantize a world point onto the grid. Points outside the world bounds
    /// resolve to `None` (invalid input, never a panic).
    pub fn world_to_cell(&self, point: WorldPoint) -> Option<Cell> {
        let col = ((point.x - self.bounds.min_x) * CELLS_PER_UNIT as f32).floor() as i32;
        let row = ((point.z - self.bounds.min_z) * CELLS_PER_UNIT as f32).floor() as i32;
        let cell = Cell::new(row, col);
        self.in_bounds(cell).then_some(cell)
    }

    /// World position of a cell's center, with the caller-supplied height.
    pub fn cell_to_world(&self, cell: Cell, y: f32) -> WorldPoint {
        WorldPoint::new(
            self.bounds.min_x + (cell.col as f32 + 0.5) / CELLS_PER_UNIT as f32,
            y,
            self.bounds.min_z + (cell.row as f32 + 0.5) / CELLS_PER_UNIT as f32,
        )
    }
}
