//! Tests for movement-planning correctness across the whole core: region
//! routing, fine search, occupancy interaction and path compression working
//! together the way one room's simulation loop drives them.

use crate::config::{BattlefieldConfig, EnclosureBounds, WorldBounds};
use crate::grid::CollisionGrid;
use crate::router::Battlefield;
use crate::types::{Cell, Domain, Footprint, GridObject, ObjectId, RegionId, WorldPoint};

fn square_bounds(units: f32) -> WorldBounds {
    WorldBounds { min_x: 0.0, min_z: 0.0, max_x: units, max_z: units }
}

fn config_for(units: f32, enclosure: EnclosureBounds) -> BattlefieldConfig {
    BattlefieldConfig {
        bounds: square_bounds(units),
        enclosure,
        ..BattlefieldConfig::default()
    }
}

fn corner_enclosure() -> EnclosureBounds {
    EnclosureBounds { center_x: 0.5, center_z: 0.5, size_x: 0.5, size_z: 0.5 }
}

/// Map text for a square grid; `blocked` returns the asset byte per cell.
fn ascii_map(cells: i32, mut blocked: impl FnMut(i32, i32) -> char) -> String {
    let mut text = String::new();
    for row in 0..cells {
        for col in 0..cells {
            text.push(blocked(row, col));
        }
        text.push('\n');
    }
    text
}

fn battlefield_from(text: &str, units: f32, enclosure: EnclosureBounds) -> Battlefield {
    let config = config_for(units, enclosure);
    let grid = CollisionGrid::from_ascii(text, config.bounds).expect("grid");
    Battlefield::from_grid(grid, config)
}

fn ground_unit(id: u32, cell: Cell) -> GridObject {
    GridObject::new(ObjectId(id), Domain::Ground, Footprint::default(), cell)
}

fn cell_center(bf: &Battlefield, cell: Cell) -> WorldPoint {
    bf.grid().cell_to_world(cell, 0.0)
}

fn raw_path_cells(bf: &Battlefield, raw: &[WorldPoint]) -> Vec<Cell> {
    raw.iter()
        .map(|&p| bf.grid().world_to_cell(p).expect("path point on grid"))
        .collect()
}

fn assert_octile_steps(cells: &[Cell]) {
    for pair in cells.windows(2) {
        let dr = (pair[1].row - pair[0].row).abs();
        let dc = (pair[1].col - pair[0].col).abs();
        assert!(
            dr <= 1 && dc <= 1 && dr + dc > 0,
            "step {:?} -> {:?} is not one of the 8 allowed deltas",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn move_detours_around_centered_obstacle() {
    // 21x21 cells (5.25 world units), one 3x3 obstacle dead center
    let text = ascii_map(21, |row, col| {
        if (9..=11).contains(&row) && (9..=11).contains(&col) { '1' } else { '0' }
    });
    let mut bf = battlefield_from(&text, 5.25, corner_enclosure());
    let unit = ground_unit(1, Cell::new(0, 0));

    let start = cell_center(&bf, Cell::new(0, 0));
    let dest = cell_center(&bf, Cell::new(20, 20));
    let plan = bf.plan_move(&unit, start, dest, true).expect("path exists");

    assert!(!plan.raw.is_empty());
    let cells = raw_path_cells(&bf, &plan.raw);
    assert_eq!(cells.first(), Some(&Cell::new(0, 0)));
    assert_eq!(cells.last(), Some(&Cell::new(20, 20)));
    assert_octile_steps(&cells);
    for c in &cells {
        assert!(
            !((9..=11).contains(&c.row) && (9..=11).contains(&c.col)),
            "path crosses the obstacle at {c:?}"
        );
    }
    assert!(plan.waypoints.len() <= plan.raw.len());
    assert_eq!(plan.waypoints.len(), plan.headings.len());
    assert_eq!(plan.waypoints.last(), plan.raw.last());
}

#[test]
fn move_into_obstacle_returns_no_path() {
    let text = ascii_map(21, |row, col| {
        if (9..=11).contains(&row) && (9..=11).contains(&col) { '1' } else { '0' }
    });
    let mut bf = battlefield_from(&text, 5.25, corner_enclosure());
    let unit = ground_unit(1, Cell::new(0, 0));

    let start = cell_center(&bf, Cell::new(0, 0));
    let dest = cell_center(&bf, Cell::new(10, 10)); // center of the 3x3 block
    assert!(bf.plan_move(&unit, start, dest, true).is_none());
}

#[test]
fn macro_route_stitches_across_quadrants() {
    // 32 units = 128 cells: four quadrants of 64, split to 4 slices each
    let text = ascii_map(128, |_, _| '0');
    let enclosure = EnclosureBounds { center_x: 16.0, center_z: 16.0, size_x: 4.0, size_z: 4.0 };
    let mut bf = battlefield_from(&text, 32.0, enclosure);
    let unit = ground_unit(1, Cell::new(4, 4));

    let start = cell_center(&bf, Cell::new(4, 4));
    let dest = cell_center(&bf, Cell::new(123, 123));
    let start_region = bf.graph().region_of(Cell::new(4, 4)).expect("start region");
    let dest_region = bf.graph().region_of(Cell::new(123, 123)).expect("dest region");
    assert_ne!(start_region, dest_region);
    assert!(bf
        .graph()
        .macro_route(start_region, dest_region)
        .map(|r| !r.is_empty())
        .unwrap_or(false));

    let plan = bf.plan_move(&unit, start, dest, true).expect("stitched path");
    let cells = raw_path_cells(&bf, &plan.raw);
    assert_eq!(cells.first(), Some(&Cell::new(4, 4)));
    assert_eq!(cells.last(), Some(&Cell::new(123, 123)));
    assert_octile_steps(&cells);
    // stitching must not leave duplicate junction cells behind
    for pair in cells.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[test]
fn path_avoids_third_party_occupants() {
    let text = ascii_map(32, |_, _| '0');
    let mut bf = battlefield_from(&text, 8.0, corner_enclosure());

    // wall of parked units across most of column 10
    for (i, row) in (4..28).enumerate() {
        let mut parked = ground_unit(100 + i as u32, Cell::new(row, 10));
        bf.apply_footprint(&mut parked, Some(cell_center(&bf, Cell::new(row, 10))))
            .expect("parked unit");
    }

    let mover = ground_unit(1, Cell::new(16, 2));
    let start = cell_center(&bf, Cell::new(16, 2));
    let dest = cell_center(&bf, Cell::new(16, 20));
    let plan = bf.plan_move(&mover, start, dest, true).expect("path");

    let cells = raw_path_cells(&bf, &plan.raw);
    assert_octile_steps(&cells);
    for c in &cells {
        assert!(
            bf.occupancy().occupant(Domain::Ground, *c).is_none(),
            "path crosses an occupied cell at {c:?}"
        );
    }
}

#[test]
fn air_unit_flies_over_ground_obstacles() {
    // ground-blocking wall splits the map; air stays clear
    let text = ascii_map(32, |_, col| if col == 16 { '1' } else { '0' });
    let mut bf = battlefield_from(&text, 8.0, corner_enclosure());
    let air_height = bf.config().air_height;
    let flyer = GridObject::new(ObjectId(2), Domain::Air, Footprint::default(), Cell::new(16, 2));

    let start = cell_center(&bf, Cell::new(16, 2));
    let dest = cell_center(&bf, Cell::new(16, 30));
    let plan = bf.plan_move(&flyer, start, dest, true).expect("air path");
    assert!(plan.raw.iter().all(|p| p.y == air_height));

    // the same trip is impossible on the ground
    let walker = ground_unit(3, Cell::new(16, 2));
    assert!(bf.plan_move(&walker, start, dest, true).is_none());
}

#[test]
fn full_block_grounds_air_units_too() {
    let text = ascii_map(32, |_, col| if col == 16 { '2' } else { '0' });
    let mut bf = battlefield_from(&text, 8.0, corner_enclosure());
    let flyer = GridObject::new(ObjectId(2), Domain::Air, Footprint::default(), Cell::new(16, 2));

    let start = cell_center(&bf, Cell::new(16, 2));
    let dest = cell_center(&bf, Cell::new(16, 30));
    assert!(bf.plan_move(&flyer, start, dest, true).is_none());
}

#[test]
fn out_of_bounds_request_is_rejected_quietly() {
    let text = ascii_map(32, |_, _| '0');
    let mut bf = battlefield_from(&text, 8.0, corner_enclosure());
    let unit = ground_unit(1, Cell::new(0, 0));

    let inside = cell_center(&bf, Cell::new(0, 0));
    let outside = WorldPoint::new(9.0, 0.0, 4.0);
    assert!(bf.plan_move(&unit, inside, outside, true).is_none());
    assert!(bf.plan_move(&unit, outside, inside, true).is_none());
}

#[test]
fn resize_enclosure_rebuilds_regions_and_routes() {
    let text = ascii_map(128, |_, _| '0');
    let enclosure = EnclosureBounds { center_x: 8.0, center_z: 8.0, size_x: 4.0, size_z: 4.0 };
    let mut bf = battlefield_from(&text, 32.0, enclosure);

    let fence_cell_before = Cell::new(32, 32); // inside the original fence
    assert_eq!(bf.graph().region_of(fence_cell_before), Some(RegionId(0)));

    let upgraded = EnclosureBounds { center_x: 24.0, center_z: 24.0, size_x: 8.0, size_z: 8.0 };
    bf.resize_enclosure(upgraded);

    // the old fence area now belongs to a quadrant slice, the new one to the fence
    assert_ne!(bf.graph().region_of(fence_cell_before), Some(RegionId(0)));
    assert_eq!(bf.graph().region_of(Cell::new(96, 96)), Some(RegionId(0)));
    for region in bf.graph().regions() {
        assert_eq!(bf.graph().distance(region.id, region.id), Some(0));
    }

    // routing still works end to end after the rebuild
    let unit = ground_unit(1, Cell::new(4, 4));
    let plan = bf
        .plan_move(
            &unit,
            cell_center(&bf, Cell::new(4, 4)),
            cell_center(&bf, Cell::new(123, 123)),
            true,
        )
        .expect("path after resize");
    assert!(!plan.raw.is_empty());
}

#[test]
fn randomized_obstacles_never_break_path_validity() {
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..8 {
        let text = ascii_map(32, |row, col| {
            // keep the corners open so start and dest stay reachable cells
            let corner = (row < 3 && col < 3) || (row > 28 && col > 28);
            if !corner && rng.u8(0..10) == 0 { '1' } else { '0' }
        });
        let mut bf = battlefield_from(&text, 8.0, corner_enclosure());
        let unit = ground_unit(1, Cell::new(1, 1));
        let plan = bf.plan_move(
            &unit,
            cell_center(&bf, Cell::new(1, 1)),
            cell_center(&bf, Cell::new(30, 30)),
            true,
        );
        // sparse scatter may still wall the route off; when a path comes
        // back it must be fully valid
        if let Some(plan) = plan {
            let cells = raw_path_cells(&bf, &plan.raw);
            assert_octile_steps(&cells);
            assert!(cells.iter().all(|&c| !bf.grid().is_ground_blocked(c)));
            assert_eq!(plan.waypoints.len(), plan.headings.len());
        }
    }
}
