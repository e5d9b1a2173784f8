use glam::Vec2;

/// Segment count used when a curve must be treated as a polygon.
pub const CURVE_SEGMENTS: usize = 32;

/// Axis-aligned bounding box in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Create bounds from two opposite corners in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self::from_corners(center - half, center + half)
    }

    /// Tightest bounds around a point set. `None` for an empty slice.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let mut b = Self {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            b.min = b.min.min(*p);
            b.max = b.max.max(*p);
        }
        Some(b)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_size(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Inclusive overlap test.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow (or shrink, for negative amounts) every side by `amount`.
    pub fn expand(&self, amount: f32) -> Bounds {
        Bounds {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Corners in order: top-left, top-right, bottom-right, bottom-left (Y down).
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// A rotated box: the coordinate frame used by resize and rotate handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub center: Vec2,
    pub half: Vec2,
    pub rotation: f32,
}

impl Frame {
    pub fn new(center: Vec2, half: Vec2, rotation: f32) -> Self {
        Self {
            center,
            half,
            rotation,
        }
    }

    pub fn from_bounds(bounds: &Bounds) -> Self {
        Self::new(bounds.center(), bounds.half_size(), 0.0)
    }

    /// World point → frame-local coordinates (relative to center, unrotated).
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        Vec2::from_angle(-self.rotation).rotate(p - self.center)
    }

    /// Frame-local coordinates → world point.
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.center + Vec2::from_angle(self.rotation).rotate(local)
    }

    /// Per-axis scale taking `from` onto `self`. Degenerate axes keep scale 1.
    pub fn scale_from(&self, from: &Frame) -> Vec2 {
        let axis = |to: f32, from: f32| if from.abs() > f32::EPSILON { to / from } else { 1.0 };
        Vec2::new(axis(self.half.x, from.half.x), axis(self.half.y, from.half.y))
    }

    /// Map a world point expressed relative to `from` into this frame.
    pub fn remap(&self, p: Vec2, from: &Frame) -> Vec2 {
        self.to_world(from.to_local(p) * self.scale_from(from))
    }

    /// World-space corners: (-,-), (+,-), (+,+), (-,+) in local signs.
    pub fn corners(&self) -> [Vec2; 4] {
        let h = self.half;
        [
            self.to_world(Vec2::new(-h.x, -h.y)),
            self.to_world(Vec2::new(h.x, -h.y)),
            self.to_world(Vec2::new(h.x, h.y)),
            self.to_world(Vec2::new(-h.x, h.y)),
        ]
    }
}

/// Discriminant of [`Geom`], used to index the intersection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeomKind {
    Point,
    Line,
    Circle,
    Ellipse,
    Polygon,
    Rect,
}

/// World-space collision shape used for hit tests and placement checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    Point(Vec2),
    Line { a: Vec2, b: Vec2 },
    Circle { center: Vec2, radius: f32 },
    Ellipse { center: Vec2, radii: Vec2, rotation: f32 },
    Polygon(Vec<Vec2>),
    Rect(Bounds),
}

impl Geom {
    pub fn kind(&self) -> GeomKind {
        match self {
            Geom::Point(_) => GeomKind::Point,
            Geom::Line { .. } => GeomKind::Line,
            Geom::Circle { .. } => GeomKind::Circle,
            Geom::Ellipse { .. } => GeomKind::Ellipse,
            Geom::Polygon(_) => GeomKind::Polygon,
            Geom::Rect(_) => GeomKind::Rect,
        }
    }

    /// Axis-aligned bounds of the shape.
    pub fn bounds(&self) -> Bounds {
        match self {
            Geom::Point(p) => Bounds { min: *p, max: *p },
            Geom::Line { a, b } => Bounds::from_corners(*a, *b),
            Geom::Circle { center, radius } => Bounds::from_center(*center, Vec2::splat(*radius)),
            Geom::Ellipse {
                center,
                radii,
                rotation,
            } => {
                let (s, c) = rotation.sin_cos();
                let hx = ((radii.x * c).powi(2) + (radii.y * s).powi(2)).sqrt();
                let hy = ((radii.x * s).powi(2) + (radii.y * c).powi(2)).sqrt();
                Bounds::from_center(*center, Vec2::new(hx, hy))
            }
            Geom::Polygon(points) => Bounds::from_points(points).unwrap_or(Bounds {
                min: Vec2::ZERO,
                max: Vec2::ZERO,
            }),
            Geom::Rect(b) => *b,
        }
    }

    /// Outline of area-bearing shapes. Curves are tessellated.
    /// Points and lines have no area and return `None`.
    pub fn to_polygon(&self) -> Option<Vec<Vec2>> {
        match self {
            Geom::Point(_) | Geom::Line { .. } => None,
            Geom::Circle { center, radius } => Some(ellipse_points(
                *center,
                Vec2::splat(*radius),
                0.0,
                CURVE_SEGMENTS,
            )),
            Geom::Ellipse {
                center,
                radii,
                rotation,
            } => Some(ellipse_points(*center, *radii, *rotation, CURVE_SEGMENTS)),
            Geom::Polygon(points) => Some(points.clone()),
            Geom::Rect(b) => Some(b.corners().to_vec()),
        }
    }
}

/// Corners of a rotated rectangle, in the same order as [`Frame::corners`].
pub fn rotated_rect(center: Vec2, half: Vec2, rotation: f32) -> Vec<Vec2> {
    Frame::new(center, half, rotation).corners().to_vec()
}

/// Sample `segments` points around a rotated ellipse.
pub fn ellipse_points(center: Vec2, radii: Vec2, rotation: f32, segments: usize) -> Vec<Vec2> {
    let rot = Vec2::from_angle(rotation);
    (0..segments)
        .map(|i| {
            let t = i as f32 / segments as f32 * std::f32::consts::TAU;
            center + rot.rotate(Vec2::new(t.cos() * radii.x, t.sin() * radii.y))
        })
        .collect()
}

/// Squared distance from `p` to the segment `a`-`b`.
pub fn point_segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_points_and_contains() {
        let b = Bounds::from_points(&[Vec2::new(3.0, -1.0), Vec2::new(-2.0, 4.0)]).unwrap();
        assert_eq!(b.min, Vec2::new(-2.0, -1.0));
        assert_eq!(b.max, Vec2::new(3.0, 4.0));
        assert!(b.contains(Vec2::new(3.0, 4.0)), "boundary is inclusive");
        assert!(!b.contains(Vec2::new(3.1, 0.0)));
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn frame_round_trips_points() {
        let f = Frame::new(Vec2::new(10.0, 5.0), Vec2::new(4.0, 2.0), 0.7);
        let p = Vec2::new(13.0, -1.0);
        let back = f.to_world(f.to_local(p));
        assert!(back.distance(p) < 1e-4, "got {back:?}");
    }

    #[test]
    fn frame_remap_scales_about_center() {
        let old = Frame::new(Vec2::ZERO, Vec2::new(10.0, 10.0), 0.0);
        let new = Frame::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0), 0.0);
        let p = new.remap(Vec2::new(10.0, 10.0), &old);
        assert!(p.distance(Vec2::new(30.0, 10.0)) < 1e-4, "got {p:?}");
    }

    #[test]
    fn rotated_ellipse_bounds() {
        let g = Geom::Ellipse {
            center: Vec2::ZERO,
            radii: Vec2::new(10.0, 2.0),
            rotation: std::f32::consts::FRAC_PI_2,
        };
        let b = g.bounds();
        assert!((b.width() - 4.0).abs() < 1e-3, "width {}", b.width());
        assert!((b.height() - 20.0).abs() < 1e-3, "height {}", b.height());
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let d = point_segment_distance_sq(Vec2::new(-3.0, 4.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((d - 25.0).abs() < 1e-4);
        let d = point_segment_distance_sq(Vec2::new(5.0, 2.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((d - 4.0).abs() < 1e-4);
    }
}
