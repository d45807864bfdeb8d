use rustc_hash::FxHashMap;
use tracing::warn;

use super::CollisionGrid;
use crate::error::PlacementError;
use crate::types::{Cell, Domain, Footprint, GridObject, ObjectId};

/// Exactly what an object currently marks on this grid: anchor, oriented
/// extents and the layer it went to. Clearing replays the stamp, so an
/// apply/clear round-trip restores the layers bit for bit.
#[derive(Clone, Copy, Debug)]
struct FootprintStamp {
    anchor: Cell,
    size: Footprint,
    domain: Domain,
}

/// Dynamic per-cell occupancy for one battlefield: three independent layers
/// (ground units, air units, player avatars) recording which live object
/// blocks each cell.
///
/// Mutation happens only through `apply_footprint` / `clear_footprint`, and
/// only from the owning room's logical thread; there is no interior locking.
#[derive(Debug)]
pub struct OccupancyLayers {
    rows: i32,
    cols: i32,
    ground: Vec<Option<ObjectId>>,
    air: Vec<Option<ObjectId>>,
    player: Vec<Option<ObjectId>>,
    stamps: FxHashMap<ObjectId, FootprintStamp>,
}

impl OccupancyLayers {
    pub fn new(rows: i32, cols: i32) -> Self {
        let cell_count = (rows as usize) * (cols as usize);
        Self {
            rows,
            cols,
            ground: vec![None; cell_count],
            air: vec![None; cell_count],
            player: vec![None; cell_count],
            stamps: FxHashMap::default(),
        }
    }

    pub fn for_grid(grid: &CollisionGrid) -> Self {
        Self::new(grid.rows(), grid.cols())
    }

    #[inline]
    fn idx(&self, cell: Cell) -> usize {
        (cell.row as usize) * (self.cols as usize) + cell.col as usize
    }

    #[inline]
    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.row < self.rows && cell.col >= 0 && cell.col < self.cols
    }

    fn layer(&self, domain: Domain) -> &[Option<ObjectId>] {
        match domain {
            Domain::Ground => &self.ground,
            Domain::Air => &self.air,
            Domain::Player => &self.player,
        }
    }

    fn layer_mut(&mut self, domain: Domain) -> &mut [Option<ObjectId>] {
        match domain {
            Domain::Ground => &mut self.ground,
            Domain::Air => &mut self.air,
            Domain::Player => &mut self.player,
        }
    }

    /// Occupant recorded on `domain`'s layer at `cell`, if any.
    pub fn occupant(&self, domain: Domain, cell: Cell) -> Option<ObjectId> {
        if !self.in_bounds(cell) {
            return None;
        }
        self.layer(domain)[self.idx(cell)]
    }

    /// True when `occupant` does not block `obj`: empty, the object itself,
    /// or the object's current target (a unit may path onto the cell of the
    /// thing it intends to strike).
    #[inline]
    fn exempt(obj: &GridObject, occupant: Option<ObjectId>) -> bool {
        match occupant {
            None => true,
            Some(id) => id == obj.id || obj.target == Some(id),
        }
    }

    /// Ground-movement passability: every cell of `footprint` centered on
    /// `cell` must be inside the grid, statically clear for ground movement
    /// and, when `check_occupants` is set, free of ground units and player
    /// avatars other than the querying object or its target.
    pub fn can_go(
        &self,
        grid: &CollisionGrid,
        obj: &GridObject,
        cell: Cell,
        check_occupants: bool,
        footprint: Footprint,
    ) -> bool {
        for fc in footprint.cells(cell) {
            if grid.is_ground_blocked(fc) {
                return false;
            }
            if check_occupants {
                let idx = self.idx(fc);
                if !Self::exempt(obj, self.ground[idx]) || !Self::exempt(obj, self.player[idx]) {
                    return false;
                }
            }
        }
        true
    }

    /// Air-movement passability: statically clear for air movement and,
    /// when `check_occupants` is set, free of other air units.
    pub fn can_go_air(
        &self,
        grid: &CollisionGrid,
        obj: &GridObject,
        cell: Cell,
        check_occupants: bool,
        footprint: Footprint,
    ) -> bool {
        for fc in footprint.cells(cell) {
            if grid.is_air_blocked(fc) {
                return false;
            }
            if check_occupants && !Self::exempt(obj, self.air[self.idx(fc)]) {
                return false;
            }
        }
        true
    }

    /// Passability for `obj` at `cell` with its current oriented footprint,
    /// dispatched on the object's domain.
    pub fn can_stand(
        &self,
        grid: &CollisionGrid,
        obj: &GridObject,
        cell: Cell,
        check_occupants: bool,
    ) -> bool {
        let footprint = obj.oriented_footprint();
        match obj.domain {
            Domain::Air => self.can_go_air(grid, obj, cell, check_occupants, footprint),
            Domain::Ground | Domain::Player => {
                self.can_go(grid, obj, cell, check_occupants, footprint)
            }
        }
    }

    /// Move `obj`'s footprint to `new_cell` (or re-stamp at its current
    /// cell). Validates the candidate first; on rejection nothing is
    /// mutated and the object stays where it was.
    pub fn apply_footprint(
        &mut self,
        grid: &CollisionGrid,
        obj: &mut GridObject,
        new_cell: Option<Cell>,
    ) -> Result<(), PlacementError> {
        let footprint = obj.oriented_footprint();
        let dest = new_cell.unwrap_or(obj.cell);

        if footprint.cells(dest).any(|c| !grid.in_bounds(c)) {
            return Err(PlacementError::OutOfBounds);
        }
        let passable = match obj.domain {
            Domain::Air => self.can_go_air(grid, obj, dest, true, footprint),
            Domain::Ground | Domain::Player => self.can_go(grid, obj, dest, true, footprint),
        };
        if !passable {
            return Err(PlacementError::Blocked);
        }

        if let Some(old) = self.stamps.remove(&obj.id) {
            self.clear_stamp(obj.id, &old);
        }
        let cells: Vec<Cell> = footprint.cells(dest).collect();
        let cols = self.cols as usize;
        let layer = self.layer_mut(obj.domain);
        for c in cells {
            layer[(c.row as usize) * cols + c.col as usize] = Some(obj.id);
        }
        self.stamps.insert(
            obj.id,
            FootprintStamp {
                anchor: dest,
                size: footprint,
                domain: obj.domain,
            },
        );
        obj.cell = dest;
        Ok(())
    }

    /// Remove `obj`'s footprint from the layers. Fails without mutating when
    /// this grid holds no stamp for the object (stale room association).
    pub fn clear_footprint(&mut self, obj: &GridObject) -> Result<(), PlacementError> {
        match self.stamps.remove(&obj.id) {
            Some(stamp) => {
                self.clear_stamp(obj.id, &stamp);
                Ok(())
            }
            None => {
                warn!(
                    "[OCCUPANCY] clear_footprint for {:?} with no stamp on this grid",
                    obj.id
                );
                Err(PlacementError::StaleObject)
            }
        }
    }

    fn clear_stamp(&mut self, id: ObjectId, stamp: &FootprintStamp) {
        let cells: Vec<Cell> = stamp.size.cells(stamp.anchor).collect();
        let cols = self.cols as usize;
        let layer = self.layer_mut(stamp.domain);
        for c in cells {
            let slot = &mut layer[(c.row as usize) * cols + c.col as usize];
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }
}
