#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Conservative line-of-sight test over the tile map.

use outbreak_core::{TileCoord, TileMap, Vec2};

/// Distance under which a segment counts as touching a wall when the beam has no width.
const CONTACT_EPSILON: f32 = 1e-4;

/// Reports whether the straight segment from `start` to `end` is obstructed.
///
/// The segment counts as blocked when both endpoints share a tile, when either
/// endpoint lies in a wall or outside the map, or when it is shorter than one
/// tile. Otherwise the segment is thickened by `beam_width / 2` on both sides
/// and walked one tile strip at a time along its dominant axis; any wall tile
/// (tiles outside the map included) closer than the half width blocks it.
#[must_use]
pub fn has_obstacle(map: &TileMap, start: Vec2, end: Vec2, beam_width: f32) -> bool {
    let (Some(start_tile), Some(end_tile)) = (map.tile_of(start), map.tile_of(end)) else {
        return true;
    };
    if start_tile == end_tile || map.is_wall(start_tile) || map.is_wall(end_tile) {
        return true;
    }

    let length = map.tile_length();
    let delta = end - start;
    if delta.length() < length {
        return true;
    }

    let half_beam = (beam_width / 2.0).max(0.0);
    let reach = half_beam.max(CONTACT_EPSILON);
    let x_major = delta.x.abs() >= delta.y.abs();
    let split = |point: Vec2| if x_major { (point.x, point.y) } else { (point.y, point.x) };
    let (start_major, start_minor) = split(start);
    let (end_major, end_minor) = split(end);
    let span = end_major - start_major;
    let minor_at = |major: f32| {
        let t = ((major - start_major) / span).clamp(0.0, 1.0);
        start_minor + (end_minor - start_minor) * t
    };

    let low = start_major.min(end_major) - reach;
    let high = start_major.max(end_major) + reach;
    let first_strip = (low / length).floor() as i64;
    let last_strip = (high / length).floor() as i64;

    for strip in first_strip..=last_strip {
        let strip_low = strip as f32 * length - reach;
        let strip_high = (strip + 1) as f32 * length + reach;
        let a = minor_at(strip_low);
        let b = minor_at(strip_high);
        let first_cell = ((a.min(b) - reach) / length).floor() as i64;
        let last_cell = ((a.max(b) + reach) / length).floor() as i64;

        for cell in first_cell..=last_cell {
            let (column, row) = if x_major { (strip, cell) } else { (cell, strip) };
            if !is_wall_tile(map, column, row) {
                continue;
            }
            let min = Vec2::new(column as f32, row as f32) * length;
            let max = min + Vec2::splat(length);
            if segment_rect_distance(start, end, min, max) < reach {
                return true;
            }
        }
    }

    false
}

fn is_wall_tile(map: &TileMap, column: i64, row: i64) -> bool {
    match (u32::try_from(column), u32::try_from(row)) {
        (Ok(column), Ok(row)) => map.is_wall(TileCoord::new(column, row)),
        _ => true,
    }
}

fn segment_rect_distance(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> f32 {
    if segment_hits_rect(a, b, min, max) {
        return 0.0;
    }
    let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
    corners
        .into_iter()
        .map(|corner| point_segment_distance(corner, a, b))
        .chain([a, b].map(|point| point.distance(point.clamp(min, max))))
        .fold(f32::INFINITY, f32::min)
}

/// Liang-Barsky clip of the segment against the rectangle.
fn segment_hits_rect(a: Vec2, b: Vec2, min: Vec2, max: Vec2) -> bool {
    let d = b - a;
    let mut enter = 0.0_f32;
    let mut exit = 1.0_f32;
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > exit {
                return false;
            }
            enter = enter.max(r);
        } else {
            if r < enter {
                return false;
            }
            exit = exit.min(r);
        }
    }
    enter <= exit
}

fn point_segment_distance(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    let length_sq = d.length_squared();
    if length_sq == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(d) / length_sq).clamp(0.0, 1.0);
    point.distance(a + d * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> TileMap {
        TileMap::from_ascii(&["##########", "P.........", "##########"], 10.0).expect("map")
    }

    #[test]
    fn open_corridor_is_clear() {
        let map = corridor();
        let start = Vec2::new(5.0, 15.0);
        for column in 2..10 {
            let end = Vec2::new(column as f32 * 10.0 + 5.0, 15.0);
            assert!(!has_obstacle(&map, start, end, 6.0), "column {column}");
        }
    }

    #[test]
    fn degenerate_segments_are_blocked() {
        let map = corridor();
        assert!(has_obstacle(&map, Vec2::new(11.0, 15.0), Vec2::new(18.0, 12.0), 0.0));
        assert!(has_obstacle(&map, Vec2::new(19.0, 15.0), Vec2::new(21.0, 15.0), 0.0));
        assert!(has_obstacle(&map, Vec2::new(15.0, 5.0), Vec2::new(65.0, 15.0), 0.0));
        assert!(has_obstacle(&map, Vec2::new(-5.0, 15.0), Vec2::new(65.0, 15.0), 0.0));
    }

    #[test]
    fn wide_beam_touches_corridor_walls() {
        let map = corridor();
        assert!(has_obstacle(&map, Vec2::new(15.0, 15.0), Vec2::new(85.0, 15.0), 12.0));
    }

    #[test]
    fn rectangle_distance_handles_crossing_and_gaps() {
        let min = Vec2::new(10.0, 10.0);
        let max = Vec2::new(20.0, 20.0);
        assert_eq!(segment_rect_distance(Vec2::new(0.0, 15.0), Vec2::new(30.0, 15.0), min, max), 0.0);
        let gap = segment_rect_distance(Vec2::new(0.0, 25.0), Vec2::new(30.0, 25.0), min, max);
        assert!((gap - 5.0).abs() < 1e-5);
        let diagonal = segment_rect_distance(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0), min, max);
        assert!((diagonal - 50.0_f32.sqrt()).abs() < 1e-4);
    }
}
