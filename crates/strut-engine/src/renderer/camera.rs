use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::geometry::Bounds;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 8.0;

/// Orthographic editor camera. World Y points down, like the canvas.
pub struct Camera2D {
    /// Canvas size in pixels.
    pub viewport: Vec2,
    /// Camera center position in world space.
    pub center: Vec2,
    /// Pixels per world unit.
    pub zoom: f32,
    /// Optional world rectangle the center is kept inside.
    pub bounds: Option<Bounds>,
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
}

impl Camera2D {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            center: Vec2::ZERO,
            zoom: 1.0,
            bounds: None,
        }
    }

    /// Visible world area.
    pub fn visible(&self) -> Bounds {
        Bounds::from_center(self.center, self.viewport * 0.5 / self.zoom)
    }

    /// Orthographic projection with Y flipped so world Y grows downward.
    pub fn projection_matrix(&self) -> Mat4 {
        let view = self.visible();
        Mat4::orthographic_rh(view.min.x, view.max.x, view.max.y, view.min.y, 0.0, 1.0)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            projection: self.projection_matrix().to_cols_array_2d(),
        }
    }

    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport.max(Vec2::ONE);
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
        self.clamp_to_bounds();
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.center + (screen - self.viewport * 0.5) / self.zoom
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.center) * self.zoom + self.viewport * 0.5
    }

    pub fn look_at(&mut self, target: Vec2) {
        self.center = target;
        self.clamp_to_bounds();
    }

    /// Move the view so content follows a pointer drag of `delta` pixels.
    pub fn pan_by_screen(&mut self, delta: Vec2) {
        self.look_at(self.center - delta / self.zoom);
    }

    /// Zoom by `factor`, keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Vec2, factor: f32) {
        let anchor = self.screen_to_world(screen);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let moved = self.screen_to_world(screen);
        self.look_at(self.center + anchor - moved);
    }

    /// Center on `content` and zoom so it fits with `padding` world units
    /// of margin.
    pub fn fit(&mut self, content: &Bounds, padding: f32) {
        let size = content.expand(padding).size().max(Vec2::ONE);
        let zoom = (self.viewport / size).min_element();
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.look_at(content.center());
    }

    fn clamp_to_bounds(&mut self) {
        if let Some(b) = self.bounds {
            self.center = self.center.clamp(b.min, b.max);
        }
    }
}
