use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::Region;
use crate::types::{Cell, RegionId, DIAG_COST, ORTHO_COST};

/// Macro-routing graph over the battlefield's regions: shared-vertex
/// adjacency matrix annotated with all-pairs shortest-path tables.
///
/// Region count is tens, not thousands, so the full O(R²) Dijkstra sweep is
/// done eagerly at build time and the tables hold for the lifetime of the
/// owning battlefield. Only an enclosure resize rebuilds them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionGraph {
    regions: Vec<Region>,
    /// `weights[a][b]`: `None` no edge, `Some(0)` identical region,
    /// `Some(10)` even shared-vertex count, `Some(14)` odd.
    weights: Vec<Vec<Option<u32>>>,
    /// `dist[a][b]`: shortest macro distance, `u32::MAX` when unreachable.
    dist: Vec<Vec<u32>>,
    /// `parent[a][b]`: predecessor of `b` on the shortest path from `a`.
    parent: Vec<Vec<Option<usize>>>,
}

impl RegionGraph {
    /// Build the adjacency matrix, then run Dijkstra once per region.
    pub fn build(regions: Vec<Region>) -> Self {
        let n = regions.len();
        let mut weights = vec![vec![None; n]; n];
        let mut edges = 0usize;
        for a in 0..n {
            for b in 0..n {
                weights[a][b] = adjacency_weight(&regions[a], &regions[b], a == b);
                if a != b && weights[a][b].is_some() {
                    edges += 1;
                }
            }
        }

        let mut dist = vec![vec![u32::MAX; n]; n];
        let mut parent = vec![vec![None; n]; n];
        for source in 0..n {
            dijkstra(source, &weights, &mut dist[source], &mut parent[source]);
        }

        info!(
            "[REGION GRAPH] built APSP tables for {} regions, {} directed edges",
            n, edges
        );
        Self { regions, weights, dist, parent }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Edge weight between two regions, `None` when not adjacent.
    pub fn adjacency(&self, a: RegionId, b: RegionId) -> Option<u32> {
        *self.weights.get(a.index())?.get(b.index())?
    }

    /// Shortest macro distance, `None` when no route exists.
    pub fn distance(&self, a: RegionId, b: RegionId) -> Option<u32> {
        let d = *self.dist.get(a.index())?.get(b.index())?;
        (d != u32::MAX).then_some(d)
    }

    /// Region claiming `cell`, resolved by ray-cast parity. The enclosure
    /// region is scanned first, so points inside the fence resolve to it.
    /// `None` means the point sits outside every partition and the caller
    /// should fall back to a direct fine-grained search.
    pub fn region_of(&self, cell: Cell) -> Option<RegionId> {
        self.regions
            .iter()
            .find(|r| r.contains_cell(cell))
            .map(|r| r.id)
    }

    /// Ordered intermediate regions from `start` to `dest`, excluding the
    /// start region and ending with `dest`. Empty when the two are equal
    /// (caller skips macro routing); `None` when the tables hold no route.
    pub fn macro_route(&self, start: RegionId, dest: RegionId) -> Option<Vec<RegionId>> {
        let n = self.regions.len();
        let (s, d) = (start.index(), dest.index());
        if s >= n || d >= n {
            return None;
        }
        if s == d {
            return Some(Vec::new());
        }
        if self.dist[s][d] == u32::MAX {
            return None;
        }
        let mut route = Vec::new();
        let mut cursor = d;
        while cursor != s {
            route.push(RegionId(cursor as u16));
            cursor = self.parent[s][cursor]?;
        }
        route.reverse();
        Some(route)
    }
}

/// Edge cost between two regions from the number of polygon vertices they
/// share: a coarse adjacency heuristic, not true geometric adjacency.
/// Edge-adjacent rectangles share two corners (even, orthogonal cost);
/// corner-touching ones share one (odd, diagonal cost).
fn adjacency_weight(a: &Region, b: &Region, same: bool) -> Option<u32> {
    if same {
        return Some(0);
    }
    let shared = a
        .vertices
        .iter()
        .filter(|&v| b.vertices.contains(v))
        .count();
    match shared {
        0 => None,
        n if n % 2 == 0 => Some(ORTHO_COST),
        _ => Some(DIAG_COST),
    }
}

fn dijkstra(
    source: usize,
    weights: &[Vec<Option<u32>>],
    dist: &mut [u32],
    parent: &mut [Option<usize>],
) {
    let n = weights.len();
    let mut heap: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
    dist[source] = 0;
    heap.push(Reverse((0, source)));

    while let Some(Reverse((cost, current))) = heap.pop() {
        if cost > dist[current] {
            continue;
        }
        for next in 0..n {
            if next == current {
                continue;
            }
            let Some(weight) = weights[current][next] else {
                continue;
            };
            let candidate = cost + weight;
            if candidate < dist[next] {
                dist[next] = candidate;
                parent[next] = Some(current);
                heap.push(Reverse((candidate, next)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnclosureBounds, WorldBounds};
    use crate::grid::CollisionGrid;
    use crate::region::partition;

    fn graph_for(units: f32, side_limit: i32) -> RegionGraph {
        let grid = CollisionGrid::open(WorldBounds {
            min_x: 0.0,
            min_z: 0.0,
            max_x: units,
            max_z: units,
        });
        let enclosure = EnclosureBounds {
            center_x: units / 2.0,
            center_z: units / 2.0,
            size_x: 2.0,
            size_z: 2.0,
        };
        RegionGraph::build(partition(&grid, &enclosure, side_limit))
    }

    #[test]
    fn self_distance_is_zero() {
        let graph = graph_for(16.0, 16);
        for region in graph.regions() {
            assert_eq!(graph.distance(region.id, region.id), Some(0));
        }
    }

    #[test]
    fn adjacency_matrix_is_symmetric() {
        // shared-vertex counting is symmetric by construction; the APSP
        // tables assume it, so pin it down
        let graph = graph_for(16.0, 16);
        for a in graph.regions() {
            for b in graph.regions() {
                assert_eq!(graph.adjacency(a.id, b.id), graph.adjacency(b.id, a.id));
            }
        }
    }

    #[test]
    fn edge_weights_follow_shared_vertex_parity() {
        // 16 units -> 64 cells -> quadrants 32x32, one slice each at limit 32:
        // four quadrant regions sharing edges orthogonally, corners diagonally
        let graph = graph_for(16.0, 32);
        assert_eq!(graph.len(), 5);
        let (q0, q1, q2, q3) = (RegionId(1), RegionId(2), RegionId(3), RegionId(4));
        assert_eq!(graph.adjacency(q0, q1), Some(ORTHO_COST));
        assert_eq!(graph.adjacency(q0, q2), Some(ORTHO_COST));
        // all four quadrant rects meet at the grid midpoint, so even the
        // diagonal pair shares that corner plus nothing else
        assert_eq!(graph.adjacency(q0, q3), Some(DIAG_COST));
        assert_eq!(graph.adjacency(q1, q2), Some(DIAG_COST));
    }

    #[test]
    fn macro_route_walks_to_destination() {
        let graph = graph_for(32.0, 32);
        let regions = graph.regions();
        let first = regions[1].id;
        let last = regions[regions.len() - 1].id;
        let route = graph.macro_route(first, last).expect("route");
        assert!(!route.is_empty());
        assert_eq!(*route.last().unwrap(), last);
        assert!(!route.contains(&first));
        // consecutive hops are adjacent
        let mut prev = first;
        for hop in &route {
            assert!(graph.adjacency(prev, *hop).is_some(), "{prev:?} -> {hop:?}");
            prev = *hop;
        }
    }

    #[test]
    fn macro_route_same_region_is_empty() {
        let graph = graph_for(16.0, 32);
        assert_eq!(graph.macro_route(RegionId(1), RegionId(1)), Some(Vec::new()));
    }

    #[test]
    fn membership_prefers_the_enclosure() {
        let graph = graph_for(16.0, 32);
        // grid center sits inside the fence
        assert_eq!(graph.region_of(Cell::new(32, 32)), Some(RegionId(0)));
        // far corner does not
        let far = graph.region_of(Cell::new(2, 2)).expect("some quadrant");
        assert_ne!(far, RegionId(0));
    }
}
