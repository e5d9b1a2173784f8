use glam::Vec2;

use crate::core::joints::JointSettings;
use crate::geometry::Bounds;

/// Tuning for a sandbox scene.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Fixed physics timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Y points down, so positive Y gravity pulls downward.
    pub gravity: Vec2,
    /// Playable area. Saved parts must lie inside it, give or take
    /// `save_padding`.
    pub world_bounds: Bounds,
    pub save_padding: f32,
    /// Height of the ground strip along the bottom of the world.
    pub ground_height: f32,
    /// Placement beyond this many parts is refused with a flash message.
    pub max_parts: usize,
    /// Grid spacing used when grid snapping is on.
    pub grid_size: f32,
    /// A box whose width + height is below this counts as a click.
    pub click_epsilon: f32,
    /// Rotation snap increment in radians while grid snapping is on.
    pub angle_snap: f32,
    /// Pick radius for anchors, in world units.
    pub anchor_radius: f32,
    /// Pick radius for resize/rotate handles and polygon vertices.
    pub handle_radius: f32,
    /// `None`: rigid pins. `Some(k)`: springs of stiffness `k`.
    pub joint_stiffness: Option<f32>,
    pub joint_damping: f32,
    /// Seconds without edits before an autosave goes out.
    pub autosave_idle: f64,
    /// Canvas size in pixels.
    pub viewport: Vec2,
}

impl SandboxConfig {
    pub fn joint_settings(&self) -> JointSettings {
        JointSettings {
            stiffness: self.joint_stiffness,
            damping: self.joint_damping,
        }
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_max_parts(mut self, max_parts: usize) -> Self {
        self.max_parts = max_parts;
        self
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            gravity: Vec2::new(0.0, 500.0),
            world_bounds: Bounds::from_corners(
                Vec2::new(-2000.0, -1500.0),
                Vec2::new(2000.0, 500.0),
            ),
            save_padding: 200.0,
            ground_height: 100.0,
            max_parts: 200,
            grid_size: 10.0,
            click_epsilon: 4.0,
            angle_snap: std::f32::consts::PI / 16.0,
            anchor_radius: 8.0,
            handle_radius: 8.0,
            joint_stiffness: None,
            joint_damping: 0.0,
            autosave_idle: 2.0,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}
