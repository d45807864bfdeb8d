use serde::{Deserialize, Serialize};

use crate::types::{Cell, WorldPoint, HEADING_TOLERANCE_DEG};

/// A planned movement: the full cell-by-cell route in world space plus the
/// compressed turn-point form handed to movement/animation.
///
/// `waypoints` and `headings` have equal length: entry *k* reads "travel at
/// `headings[k]` degrees until `waypoints[k]` is reached". The final path
/// point is always present; the start point is not (the mover already
/// stands there).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PathPlan {
    pub raw: Vec<WorldPoint>,
    pub waypoints: Vec<WorldPoint>,
    pub headings: Vec<f32>,
}

impl PathPlan {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Heading of travel from `from` to `to`: `atan2(Δx, Δz)` in degrees,
/// rounded to two decimals. 0° faces +z (south rows), 90° faces +x.
pub fn heading_deg(from: WorldPoint, to: WorldPoint) -> f32 {
    let raw = (to.x - from.x).atan2(to.z - from.z).to_degrees();
    (raw * 100.0).round() / 100.0
}

/// Drop consecutive duplicate cells left over from stitching macro-route
/// segments end to end.
pub fn dedup_consecutive(cells: &mut Vec<Cell>) {
    cells.dedup();
}

/// Reduce a raw world-space path to its turn points.
///
/// A waypoint is emitted wherever the travel heading changes by more than
/// the tolerance, plus always the final point; the matching heading list
/// carries the heading of the leg arriving at each waypoint. A turn-free
/// path compresses to just the final point with the last raw heading. Paths
/// of fewer than two points have no travel to describe and compress to
/// nothing.
pub fn compress_turn_points(raw: &[WorldPoint]) -> (Vec<WorldPoint>, Vec<f32>) {
    if raw.len() < 2 {
        return (Vec::new(), Vec::new());
    }

    let segment_headings: Vec<f32> = raw
        .windows(2)
        .map(|pair| heading_deg(pair[0], pair[1]))
        .collect();

    let mut waypoints = Vec::new();
    let mut headings = Vec::new();
    for (i, &heading) in segment_headings.iter().enumerate() {
        let last = i + 1 == segment_headings.len();
        if last || (heading - segment_headings[i + 1]).abs() > HEADING_TOLERANCE_DEG {
            waypoints.push(raw[i + 1]);
            headings.push(heading);
        }
    }
    (waypoints, headings)
}
