//! Battlefield spatial core: the occupancy grid and hierarchical pathfinder
//! shared by every unit on one game room's battlefield.
//!
//! # Architecture
//!
//! 1. **CollisionGrid:** static walkability from a map asset, 4 cells per
//!    world unit
//! 2. **OccupancyLayers:** ground/air/player layers tracking which live
//!    object blocks each cell
//! 3. **Regions:** the fenced enclosure plus recursively halved quadrant
//!    slices, with all-pairs macro routes precomputed at room init
//! 4. **FineGridPathfinder:** 8-directional A* stitching macro segments
//!    into a cell-by-cell path
//! 5. **PathPlan:** the compressed turn-point list movement actually follows
//!
//! Every structure is owned by exactly one room and mutated only from that
//! room's logical thread; there are no process-wide singletons and no
//! internal locks.

mod astar;
mod config;
mod error;
mod grid;
mod path;
mod region;
mod router;
mod types;

#[cfg(test)]
mod tests;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use astar::FineGridPathfinder;
pub use config::{BattlefieldConfig, EnclosureBounds, WorldBounds};
pub use error::{ConfigError, MapAssetError, MapAssetErrorKind, PlacementError};
pub use grid::{find_spawn_cell, CollisionGrid, OccupancyLayers};
pub use path::{compress_turn_points, heading_deg, PathPlan};
pub use region::graph::RegionGraph;
pub use region::{partition, CellRect, Region};
pub use router::Battlefield;
pub use types::{
    Cell, Domain, Footprint, GridObject, ObjectId, RegionId, WorldPoint, CELLS_PER_UNIT,
    DIAG_COST, HEADING_TOLERANCE_DEG, ORTHO_COST,
};
