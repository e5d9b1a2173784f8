//! Tool overlays (selection boxes, handles, anchors, pending struts, pen
//! strokes) tessellated with lyon into a flat triangle list for the JS
//! renderer. World coordinates; the renderer applies the camera.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use lyon::math::point;
use lyon::path::{Path, Winding};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

use crate::geometry::shapes::{ellipse_points, CURVE_SEGMENTS};
use crate::geometry::Geom;

/// Position plus RGBA. 6 floats = 24 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl OverlayVertex {
    pub const FLOATS: usize = 6;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl OverlayColor {
    /// From a 0xRRGGBB value, the format parts store colors in.
    pub fn hex(rgb: u32, a: f32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
            a,
        }
    }

    pub const SELECTION: Self = Self { r: 0.26, g: 0.65, b: 0.96, a: 1.0 };
    pub const SELECTION_FILL: Self = Self { r: 0.26, g: 0.65, b: 0.96, a: 0.15 };
    pub const HANDLE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const ANCHOR: Self = Self { r: 1.0, g: 0.76, b: 0.03, a: 1.0 };
    pub const INVALID: Self = Self { r: 0.9, g: 0.22, b: 0.21, a: 0.6 };
}

struct Ctor {
    color: OverlayColor,
}

impl Ctor {
    fn vertex(&self, x: f32, y: f32) -> OverlayVertex {
        OverlayVertex {
            x,
            y,
            r: self.color.r,
            g: self.color.g,
            b: self.color.b,
            a: self.color.a,
        }
    }
}

impl FillVertexConstructor<OverlayVertex> for Ctor {
    fn new_vertex(&mut self, vertex: FillVertex) -> OverlayVertex {
        let p = vertex.position();
        self.vertex(p.x, p.y)
    }
}

impl StrokeVertexConstructor<OverlayVertex> for Ctor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> OverlayVertex {
        let p = vertex.position();
        self.vertex(p.x, p.y)
    }
}

fn polyline_path(points: &[Vec2], closed: bool) -> Path {
    let mut builder = Path::builder();
    builder.begin(point(points[0].x, points[0].y));
    for p in &points[1..] {
        builder.line_to(point(p.x, p.y));
    }
    builder.end(closed);
    builder.build()
}

/// Overlay geometry for one frame. Cleared and redrawn every tick.
pub struct OverlayBuffer {
    fill_tess: FillTessellator,
    stroke_tess: StrokeTessellator,
    geometry: VertexBuffers<OverlayVertex, u32>,
    buffer: Vec<f32>,
}

impl OverlayBuffer {
    pub fn new() -> Self {
        Self {
            fill_tess: FillTessellator::new(),
            stroke_tess: StrokeTessellator::new(),
            geometry: VertexBuffers::new(),
            buffer: Vec::with_capacity(4096 * OverlayVertex::FLOATS),
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.buffer.len() / OverlayVertex::FLOATS
    }

    /// Flat `[x, y, r, g, b, a]` triangle list.
    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }

    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    fn flush_geometry(&mut self) {
        for idx in &self.geometry.indices {
            let v = self.geometry.vertices[*idx as usize];
            self.buffer.extend_from_slice(bytemuck::cast_slice(&[v]));
        }
        self.geometry.vertices.clear();
        self.geometry.indices.clear();
    }

    fn fill_path(&mut self, path: &Path, color: OverlayColor) {
        let result = self.fill_tess.tessellate_path(
            path,
            &FillOptions::tolerance(0.5),
            &mut BuffersBuilder::new(&mut self.geometry, Ctor { color }),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(e) => log::debug!("overlay fill failed: {:?}", e),
        }
    }

    fn stroke_path(&mut self, path: &Path, width: f32, color: OverlayColor) {
        let result = self.stroke_tess.tessellate_path(
            path,
            &StrokeOptions::tolerance(0.5).with_line_width(width),
            &mut BuffersBuilder::new(&mut self.geometry, Ctor { color }),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(e) => log::debug!("overlay stroke failed: {:?}", e),
        }
    }

    pub fn fill_polygon(&mut self, points: &[Vec2], color: OverlayColor) {
        if points.len() >= 3 {
            self.fill_path(&polyline_path(points, true), color);
        }
    }

    pub fn stroke_polygon(&mut self, points: &[Vec2], width: f32, color: OverlayColor) {
        if points.len() >= 3 {
            self.stroke_path(&polyline_path(points, true), width, color);
        }
    }

    pub fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: OverlayColor) {
        if points.len() >= 2 {
            self.stroke_path(&polyline_path(points, false), width, color);
        }
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: OverlayColor) {
        if radius <= 0.0 {
            return;
        }
        let mut builder = Path::builder();
        builder.add_circle(point(center.x, center.y), radius, Winding::Positive);
        self.fill_path(&builder.build(), color);
    }

    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: OverlayColor) {
        if radius <= 0.0 {
            return;
        }
        let mut builder = Path::builder();
        builder.add_circle(point(center.x, center.y), radius, Winding::Positive);
        self.stroke_path(&builder.build(), width, color);
    }

    /// Outline any hit-test shape, e.g. a pending placement preview.
    pub fn stroke_geom(&mut self, geom: &Geom, width: f32, color: OverlayColor) {
        match geom {
            Geom::Point(p) => self.fill_circle(*p, width, color),
            Geom::Line { a, b } => self.stroke_polyline(&[*a, *b], width, color),
            Geom::Circle { center, radius } => self.stroke_circle(*center, *radius, width, color),
            Geom::Ellipse {
                center,
                radii,
                rotation,
            } => {
                let points = ellipse_points(*center, *radii, *rotation, CURVE_SEGMENTS);
                self.stroke_polygon(&points, width, color);
            }
            Geom::Polygon(points) => self.stroke_polygon(points, width, color),
            Geom::Rect(b) => self.stroke_polygon(&b.corners(), width, color),
        }
    }
}

impl Default for OverlayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    #[test]
    fn vertex_is_six_floats() {
        assert_eq!(std::mem::size_of::<OverlayVertex>(), OverlayVertex::FLOATS * 4);
    }

    #[test]
    fn hex_colors_split_channels() {
        let c = OverlayColor::hex(0xff8000, 0.5);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 0.502).abs() < 0.01);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 0.5);
    }

    #[test]
    fn triangle_fills_one_triangle() {
        let mut overlay = OverlayBuffer::new();
        overlay.fill_polygon(
            &[Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 100.0)],
            OverlayColor::SELECTION_FILL,
        );
        assert_eq!(overlay.vertex_count(), 3);
        assert_eq!(overlay.as_slice()[0..2], [0.0, 0.0]);
    }

    #[test]
    fn geoms_stroke_to_triangles() {
        let mut overlay = OverlayBuffer::new();
        overlay.stroke_geom(
            &Geom::Rect(Bounds::from_corners(Vec2::ZERO, Vec2::splat(10.0))),
            1.0,
            OverlayColor::SELECTION,
        );
        assert!(overlay.vertex_count() > 0);
        assert_eq!(overlay.vertex_count() % 3, 0);
        overlay.clear();
        assert_eq!(overlay.vertex_count(), 0);
    }

    #[test]
    fn degenerate_input_draws_nothing() {
        let mut overlay = OverlayBuffer::new();
        overlay.fill_polygon(&[Vec2::ZERO, Vec2::ONE], OverlayColor::HANDLE);
        overlay.stroke_polyline(&[Vec2::ZERO], 1.0, OverlayColor::HANDLE);
        overlay.fill_circle(Vec2::ZERO, 0.0, OverlayColor::HANDLE);
        assert_eq!(overlay.vertex_count(), 0);
    }
}
