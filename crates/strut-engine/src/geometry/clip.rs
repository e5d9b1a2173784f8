//! Polygon boolean operations and polygon measurements, backed by `geo`.

use geo::orient::Direction;
use geo::{Area, BooleanOps, Centroid, MultiPolygon, Orient, Polygon as GeoPolygon};
use glam::Vec2;

use super::intersect::to_geo_polygon;
use super::shapes::{Geom, point_segment_distance_sq};

/// Islands smaller than this (square world units) are discarded.
pub const MIN_ISLAND_AREA: f32 = 1.0;

fn ring_points(poly: &GeoPolygon<f64>) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = poly
        .exterior()
        .coords()
        .map(|c| Vec2::new(c.x as f32, c.y as f32))
        .collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Unsigned area of a simple polygon.
pub fn polygon_area(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    to_geo_polygon(points).unsigned_area() as f32
}

/// Area centroid of a polygon, falling back to the vertex average for
/// degenerate (zero-area) input.
pub fn polygon_centroid(points: &[Vec2]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }
    if points.len() >= 3 {
        if let Some(c) = to_geo_polygon(points).centroid() {
            if polygon_area(points) > f32::EPSILON {
                return Some(Vec2::new(c.x() as f32, c.y() as f32));
            }
        }
    }
    let sum: Vec2 = points.iter().copied().sum();
    Some(sum / points.len() as f32)
}

fn segments_cross(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let orient = |p: Vec2, q: Vec2, r: Vec2| (q - p).perp_dot(r - p);
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let on = |p: Vec2, a: Vec2, b: Vec2| point_segment_distance_sq(p, a, b) <= 1e-8;
    on(a1, b1, b2) || on(a2, b1, b2) || on(b1, a1, a2) || on(b2, a1, a2)
}

/// Whether a closed vertex loop is a simple polygon: at least three
/// vertices, non-zero area, and no two non-adjacent edges touching.
pub fn is_simple(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 3 || polygon_area(points) <= f32::EPSILON {
        return false;
    }
    for i in 0..n {
        if points[i].distance_squared(points[(i + 1) % n]) <= f32::EPSILON {
            return false;
        }
    }
    for i in 0..n {
        let (a1, a2) = (points[i], points[(i + 1) % n]);
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            let (b1, b2) = (points[j], points[(j + 1) % n]);
            if segments_cross(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// Whether a vertex loop is convex. Collinear runs are allowed; a fully
/// degenerate loop is not convex.
pub fn is_convex(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let (a, b, c) = (points[i], points[(i + 1) % n], points[(i + 2) % n]);
        let cross = (b - a).perp_dot(c - b);
        if cross.abs() <= f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Resolve a possibly self-intersecting loop into simple islands, largest
/// first. Islands below [`MIN_ISLAND_AREA`] are dropped.
pub fn split_islands(points: &[Vec2]) -> Vec<Vec<Vec2>> {
    if points.len() < 3 {
        return Vec::new();
    }
    if is_simple(points) {
        return vec![points.to_vec()];
    }
    let subject = MultiPolygon::new(vec![to_geo_polygon(points).orient(Direction::Default)]);
    let resolved = subject.union(&MultiPolygon::<f64>::new(vec![]));
    let mut islands: Vec<Vec<Vec2>> = resolved
        .0
        .iter()
        .map(ring_points)
        .filter(|ring| ring.len() >= 3 && polygon_area(ring) >= MIN_ISLAND_AREA)
        .collect();
    islands.sort_by(|a, b| polygon_area(b).total_cmp(&polygon_area(a)));
    islands
}

/// Boolean union of two or more area-bearing shapes. Windings are
/// normalised first; only the first resulting island is kept.
///
/// Returns `None` (with a warning) for fewer than two shapes, shapes without
/// area, or an empty union.
pub fn merge_geoms(geoms: &[Geom]) -> Option<Vec<Vec2>> {
    if geoms.len() < 2 {
        log::warn!("merge needs at least two shapes, got {}", geoms.len());
        return None;
    }
    let mut merged: Option<MultiPolygon<f64>> = None;
    for geom in geoms {
        let Some(points) = geom.to_polygon().filter(|p| p.len() >= 3) else {
            log::warn!("cannot merge a {:?} shape", geom.kind());
            return None;
        };
        let poly = MultiPolygon::new(vec![to_geo_polygon(&points).orient(Direction::Default)]);
        merged = Some(match merged {
            Some(acc) => acc.union(&poly),
            None => poly,
        });
    }
    let first = merged?.0.into_iter().next();
    let Some(first) = first else {
        log::warn!("merge produced an empty result");
        return None;
    };
    let ring = ring_points(&first);
    if ring.len() < 3 {
        log::warn!("merge produced a degenerate ring of {} points", ring.len());
        return None;
    }
    Some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: Vec2, size: f32) -> Vec<Vec2> {
        vec![
            min,
            min + Vec2::new(size, 0.0),
            min + Vec2::new(size, size),
            min + Vec2::new(0.0, size),
        ]
    }

    #[test]
    fn area_and_centroid_of_square() {
        let sq = square(Vec2::new(10.0, 20.0), 10.0);
        assert!((polygon_area(&sq) - 100.0).abs() < 1e-3);
        let c = polygon_centroid(&sq).unwrap();
        assert!(c.distance(Vec2::new(15.0, 25.0)) < 1e-3, "centroid {c:?}");
    }

    #[test]
    fn winding_does_not_change_area() {
        let mut sq = square(Vec2::ZERO, 4.0);
        sq.reverse();
        assert!((polygon_area(&sq) - 16.0).abs() < 1e-3);
    }

    #[test]
    fn bow_tie_is_not_simple() {
        let bow_tie = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
        ];
        assert!(!is_simple(&bow_tie));
        assert!(is_simple(&square(Vec2::ZERO, 10.0)));
        assert!(!is_simple(&[Vec2::ZERO, Vec2::X]));
    }

    #[test]
    fn convexity() {
        assert!(is_convex(&square(Vec2::ZERO, 5.0)));
        let dart = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 5.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(3.0, 5.0),
        ];
        assert!(!is_convex(&dart));
        assert!(!is_convex(&[Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)]));
    }

    #[test]
    fn bow_tie_splits_into_two_islands() {
        let bow_tie = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(0.0, 20.0),
        ];
        let islands = split_islands(&bow_tie);
        assert_eq!(islands.len(), 2, "islands: {islands:?}");
        let total: f32 = islands.iter().map(|i| polygon_area(i)).sum();
        assert!((total - 200.0).abs() < 1.0, "total area {total}");
    }

    #[test]
    fn merge_overlapping_squares() {
        let a = Geom::Polygon(square(Vec2::ZERO, 10.0));
        let b = Geom::Polygon(square(Vec2::new(5.0, 0.0), 10.0));
        let merged = merge_geoms(&[a, b]).expect("union");
        assert!((polygon_area(&merged) - 150.0).abs() < 1e-2);
    }

    #[test]
    fn merge_normalises_clockwise_input() {
        let mut cw = square(Vec2::ZERO, 10.0);
        cw.reverse();
        let a = Geom::Polygon(cw);
        let b = Geom::Polygon(square(Vec2::new(0.0, 5.0), 10.0));
        let merged = merge_geoms(&[a, b]).expect("union");
        assert!((polygon_area(&merged) - 150.0).abs() < 1e-2);
    }

    #[test]
    fn merge_rejects_single_or_arealess_input() {
        let a = Geom::Polygon(square(Vec2::ZERO, 10.0));
        assert!(merge_geoms(&[a.clone()]).is_none());
        let line = Geom::Line {
            a: Vec2::ZERO,
            b: Vec2::ONE,
        };
        assert!(merge_geoms(&[a, line]).is_none());
    }

    #[test]
    fn merge_keeps_first_island_of_disjoint_input() {
        let a = Geom::Polygon(square(Vec2::ZERO, 10.0));
        let b = Geom::Polygon(square(Vec2::new(50.0, 0.0), 10.0));
        let merged = merge_geoms(&[a, b]).expect("first island");
        assert!((polygon_area(&merged) - 100.0).abs() < 1e-2);
    }
}
