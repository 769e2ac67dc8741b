#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* search over the 4-connected tile grid and waypoint selection.

use std::{cmp::Ordering, collections::BinaryHeap};

use outbreak_core::{TileCoord, TileMap, Vec2};
use outbreak_system_visibility::has_obstacle;
use tracing::trace;

/// Searches for the shortest 4-connected path between the tiles of `start` and `end`.
///
/// Every step costs one and the heuristic is the Euclidean tile distance.
/// The search gives up, returning `None`, when the goal tile is a wall, when
/// either endpoint lies outside the map, when the goal is unreachable, or when
/// the node about to be expanded costs more than `step_limit`. On success the
/// tile centers from start to goal are returned, both ends included.
#[must_use]
pub fn find_path(map: &TileMap, start: Vec2, end: Vec2, step_limit: u32) -> Option<Vec<Vec2>> {
    let start_tile = map.tile_of(start)?;
    let goal_tile = map.tile_of(end)?;
    if map.is_wall(goal_tile) {
        trace!(
            column = goal_tile.column(),
            row = goal_tile.row(),
            "pathfinding goal is a wall"
        );
        return None;
    }

    let tiles = search(map, start_tile, goal_tile, step_limit)?;
    Some(tiles.into_iter().map(|tile| map.tile_center(tile)).collect())
}

/// Picks the furthest waypoint of `path` that is visible from `from`.
///
/// The path is walked from its far end backward; when no waypoint is visible
/// the first one is returned.
#[must_use]
pub fn furthest_visible_waypoint(
    map: &TileMap,
    from: Vec2,
    path: &[Vec2],
    beam_width: f32,
) -> Option<Vec2> {
    path.iter()
        .rev()
        .copied()
        .find(|waypoint| !has_obstacle(map, from, *waypoint, beam_width))
        .or_else(|| path.first().copied())
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    tile: TileCoord,
    cost: u32,
    estimate: f32,
}

impl OpenNode {
    fn total(&self) -> f32 {
        self.cost as f32 + self.estimate
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    /// Reversed so that the max-heap pops the lowest `g + h`, then the lowest
    /// `h`, then the lowest tile.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .total()
            .total_cmp(&self.total())
            .then_with(|| other.estimate.total_cmp(&self.estimate))
            .then_with(|| other.tile.cmp(&self.tile))
    }
}

fn heuristic(from: TileCoord, to: TileCoord) -> f32 {
    let dx = from.column().abs_diff(to.column()) as f32;
    let dy = from.row().abs_diff(to.row()) as f32;
    dx.hypot(dy)
}

fn search(
    map: &TileMap,
    start: TileCoord,
    goal: TileCoord,
    step_limit: u32,
) -> Option<Vec<TileCoord>> {
    let start_index = map.index(start)?;
    let node_count = map.tile_count();
    let mut closed = vec![false; node_count];
    let mut best_cost = vec![u32::MAX; node_count];
    let mut parent: Vec<Option<usize>> = vec![None; node_count];
    let mut open = BinaryHeap::new();

    best_cost[start_index] = 0;
    open.push(OpenNode {
        tile: start,
        cost: 0,
        estimate: heuristic(start, goal),
    });

    while let Some(node) = open.pop() {
        let Some(index) = map.index(node.tile) else {
            continue;
        };
        if closed[index] {
            continue;
        }
        if node.cost > step_limit {
            trace!(
                step_limit,
                column = goal.column(),
                row = goal.row(),
                "pathfinding exceeded its step limit"
            );
            return None;
        }
        if node.tile == goal {
            return Some(reconstruct_tile_path(map, &parent, index));
        }
        closed[index] = true;

        for neighbor in neighbors(map, node.tile) {
            let Some(neighbor_index) = map.index(neighbor) else {
                continue;
            };
            if closed[neighbor_index] || map.is_wall(neighbor) {
                continue;
            }
            let cost = node.cost + 1;
            if cost < best_cost[neighbor_index] {
                best_cost[neighbor_index] = cost;
                parent[neighbor_index] = Some(index);
                open.push(OpenNode {
                    tile: neighbor,
                    cost,
                    estimate: heuristic(neighbor, goal),
                });
            }
        }
    }

    trace!(
        column = goal.column(),
        row = goal.row(),
        "pathfinding exhausted the open set"
    );
    None
}

fn neighbors(map: &TileMap, tile: TileCoord) -> impl Iterator<Item = TileCoord> {
    let column = tile.column();
    let row = tile.row();
    let columns = map.columns();
    let rows = map.rows();
    [
        row.checked_sub(1).map(|up| TileCoord::new(column, up)),
        (column + 1 < columns).then(|| TileCoord::new(column + 1, row)),
        (row + 1 < rows).then(|| TileCoord::new(column, row + 1)),
        column.checked_sub(1).map(|left| TileCoord::new(left, row)),
    ]
    .into_iter()
    .flatten()
}

fn reconstruct_tile_path(map: &TileMap, parent: &[Option<usize>], goal: usize) -> Vec<TileCoord> {
    let columns = map.columns() as usize;
    let mut path = Vec::new();
    let mut cursor = Some(goal);
    while let Some(index) = cursor {
        path.push(TileCoord::new((index % columns) as u32, (index / columns) as u32));
        cursor = parent[index];
    }
    path.reverse();
    path
}
