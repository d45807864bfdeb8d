use tracing::{debug, info};

use crate::astar::FineGridPathfinder;
use crate::config::{BattlefieldConfig, EnclosureBounds};
use crate::error::{MapAssetError, PlacementError};
use crate::grid::{find_spawn_cell, CollisionGrid, OccupancyLayers};
use crate::path::{compress_turn_points, dedup_consecutive, PathPlan};
use crate::region::graph::RegionGraph;
use crate::region::partition;
use crate::types::{Cell, Domain, Footprint, GridObject, RegionId, WorldPoint};

/// Rings searched around a spawn candidate before giving up.
const SPAWN_SEARCH_RADIUS: i32 = 16;

/// The spatial core of one battlefield (game room): collision grid,
/// occupancy layers, region routing graph and the fine-grid pathfinder,
/// composed behind the movement API the unit model consumes.
///
/// One instance per room, owned by that room and mutated only from its
/// logical execution context. Instances share nothing: rooms on different
/// worker threads never contend.
#[derive(Debug)]
pub struct Battlefield {
    config: BattlefieldConfig,
    grid: CollisionGrid,
    occupancy: OccupancyLayers,
    graph: RegionGraph,
    pathfinder: FineGridPathfinder,
}

impl Battlefield {
    /// Load the map asset for `map_id`, partition the routing regions and
    /// build the APSP tables. Runs once at room creation, before any unit
    /// pathing request; a bad map asset aborts the room.
    pub fn new(map_id: &str, config: BattlefieldConfig) -> Result<Self, MapAssetError> {
        let grid = CollisionGrid::load(map_id, &config)?;
        Ok(Self::from_grid(grid, config))
    }

    /// Assemble a battlefield around an already-built grid. Used by tests
    /// and procedurally generated rooms.
    pub fn from_grid(grid: CollisionGrid, config: BattlefieldConfig) -> Self {
        let occupancy = OccupancyLayers::for_grid(&grid);
        let regions = partition(&grid, &config.enclosure, config.region_side_limit);
        let graph = RegionGraph::build(regions);
        let pathfinder = FineGridPathfinder::for_grid(&grid);
        info!(
            "[BATTLEFIELD] ready: {}x{} cells, {} regions",
            grid.rows(),
            grid.cols(),
            graph.len()
        );
        Self { config, grid, occupancy, graph, pathfinder }
    }

    pub fn grid(&self) -> &CollisionGrid {
        &self.grid
    }

    pub fn occupancy(&self) -> &OccupancyLayers {
        &self.occupancy
    }

    pub fn graph(&self) -> &RegionGraph {
        &self.graph
    }

    pub fn config(&self) -> &BattlefieldConfig {
        &self.config
    }

    /// Plan a movement for `obj` from `start` to `dest`.
    ///
    /// Both points resolve to regions; in the same or no region the plan is
    /// one direct fine search, otherwise the precomputed macro route is
    /// walked through the region centers and the per-segment fine paths are
    /// stitched together. `None` means no path: the unit stays idle, nothing
    /// is surfaced to clients.
    pub fn plan_move(
        &mut self,
        obj: &GridObject,
        start: WorldPoint,
        dest: WorldPoint,
        check_occupants: bool,
    ) -> Option<PathPlan> {
        let start_cell = self.grid.world_to_cell(start)?;
        let dest_cell = self.grid.world_to_cell(dest)?;

        #[cfg(feature = "perf_stats")]
        let expanded_before = self.pathfinder.total_expanded();

        let mut cells = self.route_cells(obj, start_cell, dest_cell, check_occupants)?;
        dedup_consecutive(&mut cells);

        let y = self.travel_height(obj.domain);
        let raw: Vec<WorldPoint> = cells.iter().map(|&c| self.grid.cell_to_world(c, y)).collect();
        let (waypoints, headings) = compress_turn_points(&raw);

        #[cfg(feature = "perf_stats")]
        info!(
            "[BATTLEFIELD] move planned: {} raw cells, {} waypoints, {} nodes expanded",
            raw.len(),
            waypoints.len(),
            self.pathfinder.total_expanded() - expanded_before
        );

        Some(PathPlan { raw, waypoints, headings })
    }

    /// Re-partition after the fenced enclosure changes center or size:
    /// rebuilds the enclosure region, the connectivity matrix and the full
    /// APSP table. Must be called for every fence upgrade.
    pub fn resize_enclosure(&mut self, enclosure: EnclosureBounds) {
        self.config.enclosure = enclosure;
        let regions = partition(&self.grid, &self.config.enclosure, self.config.region_side_limit);
        self.graph = RegionGraph::build(regions);
        info!(
            "[BATTLEFIELD] enclosure resized to {}x{} units, {} regions rebuilt",
            enclosure.size_x,
            enclosure.size_z,
            self.graph.len()
        );
    }

    /// Move `obj`'s footprint to `new_position` (or re-stamp in place).
    /// Rejection leaves the grid untouched; the caller keeps the object at
    /// its last valid position and tells it to re-broadcast.
    pub fn apply_footprint(
        &mut self,
        obj: &mut GridObject,
        new_position: Option<WorldPoint>,
    ) -> Result<(), PlacementError> {
        let cell = match new_position {
            Some(point) => Some(
                self.grid
                    .world_to_cell(point)
                    .ok_or(PlacementError::OutOfBounds)?,
            ),
            None => None,
        };
        self.occupancy.apply_footprint(&self.grid, obj, cell)
    }

    pub fn clear_footprint(&mut self, obj: &GridObject) -> Result<(), PlacementError> {
        self.occupancy.clear_footprint(obj)
    }

    pub fn can_go(
        &self,
        obj: &GridObject,
        cell: Cell,
        check_occupants: bool,
        footprint: Footprint,
    ) -> bool {
        self.occupancy.can_go(&self.grid, obj, cell, check_occupants, footprint)
    }

    pub fn can_go_air(
        &self,
        obj: &GridObject,
        cell: Cell,
        check_occupants: bool,
        footprint: Footprint,
    ) -> bool {
        self.occupancy.can_go_air(&self.grid, obj, cell, check_occupants, footprint)
    }

    /// Nearest free spawn position around `candidate` for initial
    /// placement, or `None` when the neighborhood is packed solid.
    pub fn find_spawn_point(&self, obj: &GridObject, candidate: WorldPoint) -> Option<WorldPoint> {
        let anchor = self.grid.world_to_cell(candidate)?;
        let cell = find_spawn_cell(&self.grid, &self.occupancy, obj, anchor, SPAWN_SEARCH_RADIUS)?;
        Some(self.grid.cell_to_world(cell, self.travel_height(obj.domain)))
    }

    fn travel_height(&self, domain: Domain) -> f32 {
        match domain {
            Domain::Air => self.config.air_height,
            Domain::Ground | Domain::Player => 0.0,
        }
    }

    fn route_cells(
        &mut self,
        obj: &GridObject,
        start: Cell,
        dest: Cell,
        check_occupants: bool,
    ) -> Option<Vec<Cell>> {
        let start_region = self.graph.region_of(start);
        let dest_region = self.graph.region_of(dest);

        if let (Some(a), Some(b)) = (start_region, dest_region) {
            if a != b {
                if let Some(cells) = self.stitch_macro_route(obj, start, dest, a, b, check_occupants)
                {
                    return Some(cells);
                }
                debug!(
                    "[BATTLEFIELD] macro route {:?} -> {:?} unavailable, trying direct search",
                    a, b
                );
            }
        }

        self.pathfinder
            .search(&self.grid, &self.occupancy, obj, start, dest, check_occupants, false)
    }

    /// Walk the macro route through the region centers and stitch the
    /// per-segment fine paths. `None` (fall back to a direct search) when
    /// the route is unreachable, a region has no resolved center, or any
    /// segment search comes up empty; an unresolved center must never leak
    /// into a path as a waypoint.
    fn stitch_macro_route(
        &mut self,
        obj: &GridObject,
        start: Cell,
        dest: Cell,
        start_region: RegionId,
        dest_region: RegionId,
        check_occupants: bool,
    ) -> Option<Vec<Cell>> {
        let route = self.graph.macro_route(start_region, dest_region)?;
        let mut waypoints = Vec::with_capacity(route.len() + 1);
        for region_id in &route {
            waypoints.push(self.graph.region(*region_id)?.center?);
        }
        waypoints.push(dest);

        let mut full: Vec<Cell> = Vec::new();
        let mut cursor = start;
        for waypoint in waypoints {
            let segment = self.pathfinder.search(
                &self.grid,
                &self.occupancy,
                obj,
                cursor,
                waypoint,
                check_occupants,
                false,
            )?;
            if full.is_empty() {
                full.extend(segment);
            } else {
                full.extend(segment.into_iter().skip(1));
            }
            cursor = waypoint;
        }
        Some(full)
    }
}
