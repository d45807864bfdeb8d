use serde::{Deserialize, Serialize};

/// Fine-grid resolution: 4 cells per world-space unit on each axis.
///
/// Map assets, footprints and all search work operate in cell space; world
/// coordinates are quantized on entry and reconstructed at cell centers on
/// exit.
pub const CELLS_PER_UNIT: i32 = 4;

/// Movement cost for an orthogonal step (octile model).
pub const ORTHO_COST: u32 = 10;

/// Movement cost for a diagonal step (octile model).
pub const DIAG_COST: u32 = 14;

/// Two headings closer than this (degrees) are treated as equal when
/// detecting turn points.
pub const HEADING_TOLERANCE_DEG: f32 = 0.001;

/// The eight neighbor offsets with their step costs, cardinals first.
pub const NEIGHBOR_STEPS: [(i32, i32, u32); 8] = [
    (-1, 0, ORTHO_COST),
    (1, 0, ORTHO_COST),
    (0, -1, ORTHO_COST),
    (0, 1, ORTHO_COST),
    (-1, -1, DIAG_COST),
    (-1, 1, DIAG_COST),
    (1, -1, DIAG_COST),
    (1, 1, DIAG_COST),
];

/// Address of one fine-grid cell. Row grows southward (+z), col eastward (+x).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }

    /// Chebyshev distance, the ring index at which `other` appears when
    /// spiraling outward from `self`.
    pub fn ring_distance(self, other: Cell) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }
}

/// A point in world space. `y` is cosmetic for ground units and a fixed
/// configured offset for air units; pathfinding ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Identifier of a live object as far as the grid is concerned. Allocation
/// and reuse policy belong to the owning object model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Identifier of a coarse routing region within one battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u16);

impl RegionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which occupancy layer an object lives on and which passability variant
/// applies to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Ground,
    Air,
    Player,
}

/// Rectangular footprint in cells, before orientation is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub size_x: i32,
    pub size_z: i32,
}

impl Footprint {
    pub fn new(size_x: i32, size_z: i32) -> Self {
        Self { size_x, size_z }
    }

    /// Footprint with the facing direction applied: axis extents swap when
    /// the facing falls in the 45°–135° or 225°–315° bands.
    pub fn oriented(self, facing_deg: f32) -> Footprint {
        let f = facing_deg.rem_euclid(360.0);
        if (45.0..135.0).contains(&f) || (225.0..315.0).contains(&f) {
            Footprint {
                size_x: self.size_z,
                size_z: self.size_x,
            }
        } else {
            self
        }
    }

    /// Cells covered when anchored (centered) on `anchor`. Even extents bias
    /// one cell toward the north-west: the covered range per axis is
    /// `anchor - size/2 .. anchor - size/2 + size`.
    pub fn cells(self, anchor: Cell) -> impl Iterator<Item = Cell> {
        let row0 = anchor.row - self.size_z / 2;
        let col0 = anchor.col - self.size_x / 2;
        let (size_x, size_z) = (self.size_x, self.size_z);
        (0..size_z).flat_map(move |dz| (0..size_x).map(move |dx| Cell::new(row0 + dz, col0 + dx)))
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self { size_x: 1, size_z: 1 }
    }
}

/// The slice of the unit/object model this core consumes: everything the
/// grid needs to know about one movable object. Owned by the caller and
/// passed by reference into grid operations; `cell` is kept current by
/// `apply_footprint`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GridObject {
    pub id: ObjectId,
    pub domain: Domain,
    pub footprint: Footprint,
    /// Facing in degrees; only the 90° orientation bands matter here.
    pub facing_deg: f32,
    /// Current anchor cell on the owning battlefield.
    pub cell: Cell,
    /// Current attack/interaction target. Occupancy checks exempt this
    /// object so a unit can path onto the cell it intends to strike.
    pub target: Option<ObjectId>,
}

impl GridObject {
    pub fn new(id: ObjectId, domain: Domain, footprint: Footprint, cell: Cell) -> Self {
        Self {
            id,
            domain,
            footprint,
            facing_deg: 0.0,
            cell,
            target: None,
        }
    }

    /// Footprint with the current facing applied.
    pub fn oriented_footprint(&self) -> Footprint {
        self.footprint.oriented(self.facing_deg)
    }
}

/// Cells of the square ring at Chebyshev distance `radius` around `center`,
/// walked deterministically (top row, bottom row, then the side columns).
/// Radius 0 yields the center itself. Used by the spiral searches for
/// region centers and spawn placement.
pub fn square_ring(center: Cell, radius: i32) -> Vec<Cell> {
    if radius == 0 {
        return vec![center];
    }
    let mut cells = Vec::with_capacity((radius as usize) * 8);
    let (top, bottom) = (center.row - radius, center.row + radius);
    let (left, right) = (center.col - radius, center.col + radius);
    for col in left..=right {
        cells.push(Cell::new(top, col));
    }
    for col in left..=right {
        cells.push(Cell::new(bottom, col));
    }
    for row in (top + 1)..bottom {
        cells.push(Cell::new(row, left));
    }
    for row in (top + 1)..bottom {
        cells.push(Cell::new(row, right));
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oriented_footprint_swaps_in_rotated_bands() {
        let fp = Footprint::new(3, 1);
        assert_eq!(fp.oriented(0.0), fp);
        assert_eq!(fp.oriented(44.9), fp);
        assert_eq!(fp.oriented(90.0), Footprint::new(1, 3));
        assert_eq!(fp.oriented(134.9), Footprint::new(1, 3));
        assert_eq!(fp.oriented(180.0), fp);
        assert_eq!(fp.oriented(270.0), Footprint::new(1, 3));
        assert_eq!(fp.oriented(-90.0), Footprint::new(1, 3));
    }

    #[test]
    fn footprint_cells_are_centered() {
        let fp = Footprint::new(3, 3);
        let cells: Vec<_> = fp.cells(Cell::new(5, 5)).collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&Cell::new(4, 4)));
        assert!(cells.contains(&Cell::new(6, 6)));
        assert!(cells.contains(&Cell::new(5, 5)));
    }

    #[test]
    fn square_ring_sizes() {
        assert_eq!(square_ring(Cell::new(0, 0), 0).len(), 1);
        assert_eq!(square_ring(Cell::new(0, 0), 1).len(), 8);
        assert_eq!(square_ring(Cell::new(0, 0), 2).len(), 16);
        let ring = square_ring(Cell::new(3, 3), 2);
        assert!(ring.iter().all(|c| c.ring_distance(Cell::new(3, 3)) == 2));
    }
}
