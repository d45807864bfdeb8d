use super::{CollisionGrid, OccupancyLayers};
use crate::types::{square_ring, Cell, GridObject};

/// Nearest cell around `candidate` where `obj` can stand with its full
/// footprint, occupants considered. Searches outward in square rings, so
/// the candidate itself wins when it is free. Used for initial spawn
/// placement; `None` when no free cell exists within `max_radius` rings.
pub fn find_spawn_cell(
    grid: &CollisionGrid,
    occupancy: &OccupancyLayers,
    obj: &GridObject,
    candidate: Cell,
    max_radius: i32,
) -> Option<Cell> {
    for radius in 0..=max_radius {
        for cell in square_ring(candidate, radius) {
            if !grid.in_bounds(cell) {
                continue;
            }
            if occupancy.can_stand(grid, obj, cell, true) {
                return Some(cell);
            }
        }
    }
    None
}
