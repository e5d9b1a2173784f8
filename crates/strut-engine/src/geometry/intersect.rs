//! Shape-vs-shape intersection predicates.
//!
//! Dispatch goes through a static table keyed by [`GeomKind`] pairs. Only one
//! ordering of each pair is registered; the other ordering is resolved by
//! swapping the arguments. Every comparison is inclusive: touching shapes
//! intersect. Nothing here panics or returns an error, since these checks run
//! on every pointer move.

use geo::{Coord, Intersects, Line as GeoLine, LineString, Polygon as GeoPolygon};
use glam::Vec2;

use super::shapes::{point_segment_distance_sq, Bounds, Geom, GeomKind};

/// Distance under which a point counts as lying on a point or segment.
const TOUCH_EPSILON: f32 = 1e-4;

type IntersectFn = fn(&Geom, &Geom) -> bool;

use GeomKind as K;

const TABLE: &[(GeomKind, GeomKind, IntersectFn)] = &[
    (K::Point, K::Point, point_point),
    (K::Point, K::Line, point_line),
    (K::Point, K::Circle, point_circle),
    (K::Point, K::Ellipse, point_ellipse),
    (K::Point, K::Polygon, point_polygon),
    (K::Point, K::Rect, point_rect),
    (K::Line, K::Line, line_line),
    (K::Line, K::Circle, line_circle),
    (K::Line, K::Ellipse, line_ellipse),
    (K::Line, K::Polygon, line_area),
    (K::Line, K::Rect, line_area),
    (K::Circle, K::Circle, circle_circle),
    (K::Circle, K::Ellipse, area_area),
    (K::Circle, K::Polygon, circle_polygon),
    (K::Circle, K::Rect, circle_rect),
    (K::Ellipse, K::Ellipse, area_area),
    (K::Ellipse, K::Polygon, area_area),
    (K::Ellipse, K::Rect, area_area),
    (K::Polygon, K::Polygon, area_area),
    (K::Polygon, K::Rect, area_area),
    (K::Rect, K::Rect, rect_rect),
];

/// Whether two shapes overlap or touch.
pub fn intersects(a: &Geom, b: &Geom) -> bool {
    dispatch(TABLE, a, b)
}

fn dispatch(table: &[(GeomKind, GeomKind, IntersectFn)], a: &Geom, b: &Geom) -> bool {
    let lookup = |x: GeomKind, y: GeomKind| {
        table
            .iter()
            .find(|(ka, kb, _)| *ka == x && *kb == y)
            .map(|(_, _, f)| *f)
    };
    if let Some(f) = lookup(a.kind(), b.kind()) {
        return f(a, b);
    }
    if let Some(f) = lookup(b.kind(), a.kind()) {
        return f(b, a);
    }
    log::error!(
        "no intersection routine for {:?} vs {:?}",
        a.kind(),
        b.kind()
    );
    false
}

// ---------------------------------------------------------------------------
// geo conversion helpers
// ---------------------------------------------------------------------------

pub(crate) fn to_coord(p: Vec2) -> Coord<f64> {
    Coord {
        x: p.x as f64,
        y: p.y as f64,
    }
}

pub(crate) fn to_geo_polygon(points: &[Vec2]) -> GeoPolygon<f64> {
    let ring: Vec<Coord<f64>> = points.iter().map(|p| to_coord(*p)).collect();
    GeoPolygon::new(LineString::from(ring), vec![])
}

fn area_polygon(g: &Geom) -> Option<GeoPolygon<f64>> {
    let points = g.to_polygon()?;
    if points.len() < 3 {
        return None;
    }
    Some(to_geo_polygon(&points))
}

fn in_ellipse(p: Vec2, center: Vec2, radii: Vec2, rotation: f32) -> bool {
    if radii.x <= 0.0 || radii.y <= 0.0 {
        return false;
    }
    let local = Vec2::from_angle(-rotation).rotate(p - center) / radii;
    local.length_squared() <= 1.0
}

// ---------------------------------------------------------------------------
// Pair routines
// ---------------------------------------------------------------------------

fn point_point(a: &Geom, b: &Geom) -> bool {
    let (Geom::Point(p), Geom::Point(q)) = (a, b) else {
        return false;
    };
    p.distance_squared(*q) <= TOUCH_EPSILON * TOUCH_EPSILON
}

fn point_line(a: &Geom, b: &Geom) -> bool {
    let (Geom::Point(p), Geom::Line { a: s, b: e }) = (a, b) else {
        return false;
    };
    point_segment_distance_sq(*p, *s, *e) <= TOUCH_EPSILON * TOUCH_EPSILON
}

fn point_circle(a: &Geom, b: &Geom) -> bool {
    let (Geom::Point(p), Geom::Circle { center, radius }) = (a, b) else {
        return false;
    };
    p.distance_squared(*center) <= radius * radius
}

fn point_ellipse(a: &Geom, b: &Geom) -> bool {
    let (
        Geom::Point(p),
        Geom::Ellipse {
            center,
            radii,
            rotation,
        },
    ) = (a, b)
    else {
        return false;
    };
    in_ellipse(*p, *center, *radii, *rotation)
}

fn point_polygon(a: &Geom, b: &Geom) -> bool {
    let (Geom::Point(p), Some(poly)) = (a, area_polygon(b)) else {
        return false;
    };
    poly.intersects(&to_coord(*p))
}

fn point_rect(a: &Geom, b: &Geom) -> bool {
    let (Geom::Point(p), Geom::Rect(r)) = (a, b) else {
        return false;
    };
    r.contains(*p)
}

fn line_line(a: &Geom, b: &Geom) -> bool {
    let (Geom::Line { a: a1, b: b1 }, Geom::Line { a: a2, b: b2 }) = (a, b) else {
        return false;
    };
    let l1 = GeoLine::new(to_coord(*a1), to_coord(*b1));
    let l2 = GeoLine::new(to_coord(*a2), to_coord(*b2));
    l1.intersects(&l2)
}

fn line_circle(a: &Geom, b: &Geom) -> bool {
    let (Geom::Line { a: s, b: e }, Geom::Circle { center, radius }) = (a, b) else {
        return false;
    };
    point_segment_distance_sq(*center, *s, *e) <= radius * radius
}

/// Closed-form segment vs ellipse: map the segment into the ellipse's unit
/// circle space and solve |p + t·d|² = 1 for t in [0, 1].
fn line_ellipse(a: &Geom, b: &Geom) -> bool {
    let (
        Geom::Line { a: s, b: e },
        Geom::Ellipse {
            center,
            radii,
            rotation,
        },
    ) = (a, b)
    else {
        return false;
    };
    if radii.x <= 0.0 || radii.y <= 0.0 {
        return false;
    }
    let to_unit = |p: Vec2| Vec2::from_angle(-rotation).rotate(p - *center) / *radii;
    let p0 = to_unit(*s);
    let p1 = to_unit(*e);
    if p0.length_squared() <= 1.0 || p1.length_squared() <= 1.0 {
        return true;
    }
    let d = p1 - p0;
    let qa = d.dot(d);
    if qa <= f32::EPSILON {
        return false;
    }
    let qb = 2.0 * p0.dot(d);
    let qc = p0.dot(p0) - 1.0;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return false;
    }
    let root = disc.sqrt();
    let t1 = (-qb - root) / (2.0 * qa);
    let t2 = (-qb + root) / (2.0 * qa);
    (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2)
}

fn line_area(a: &Geom, b: &Geom) -> bool {
    let (Geom::Line { a: s, b: e }, Some(poly)) = (a, area_polygon(b)) else {
        return false;
    };
    poly.intersects(&GeoLine::new(to_coord(*s), to_coord(*e)))
}

fn circle_circle(a: &Geom, b: &Geom) -> bool {
    let (
        Geom::Circle {
            center: c1,
            radius: r1,
        },
        Geom::Circle {
            center: c2,
            radius: r2,
        },
    ) = (a, b)
    else {
        return false;
    };
    c1.distance_squared(*c2) <= (r1 + r2) * (r1 + r2)
}

fn circle_polygon(a: &Geom, b: &Geom) -> bool {
    let (Geom::Circle { center, radius }, Geom::Polygon(points)) = (a, b) else {
        return false;
    };
    if points.len() < 3 {
        return false;
    }
    if to_geo_polygon(points).intersects(&to_coord(*center)) {
        return true;
    }
    let r_sq = radius * radius;
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .any(|(p, q)| point_segment_distance_sq(*center, *p, *q) <= r_sq)
}

fn circle_rect(a: &Geom, b: &Geom) -> bool {
    let (Geom::Circle { center, radius }, Geom::Rect(r)) = (a, b) else {
        return false;
    };
    let closest = center.clamp(r.min, r.max);
    closest.distance_squared(*center) <= radius * radius
}

fn area_area(a: &Geom, b: &Geom) -> bool {
    match (area_polygon(a), area_polygon(b)) {
        (Some(pa), Some(pb)) => pa.intersects(&pb),
        _ => false,
    }
}

fn rect_rect(a: &Geom, b: &Geom) -> bool {
    let (Geom::Rect(r1), Geom::Rect(r2)) = (a, b) else {
        return false;
    };
    Bounds::intersects(r1, r2)
}
