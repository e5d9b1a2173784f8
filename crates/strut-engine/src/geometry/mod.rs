pub mod clip;
pub mod intersect;
pub mod shapes;

pub use clip::{is_convex, is_simple, merge_geoms, polygon_area, polygon_centroid, split_islands};
pub use intersect::intersects;
pub use shapes::{point_segment_distance_sq, Bounds, Frame, Geom, GeomKind};
