use glam::Vec2;

use crate::api::types::{AnchorId, PartId};
use crate::components::anchor::{self, Anchor};
use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial, PhysicsBody, PhysicsWorld};
use crate::geometry::shapes::{ellipse_points, rotated_rect, CURVE_SEGMENTS};
use crate::geometry::{is_convex, polygon_centroid, Bounds, Frame, Geom};
use crate::persist::format::SerializedPart;

/// Struts shorter than this are an invalid placement.
pub const MIN_LENGTH: f32 = 10.0;
/// Smallest width/height a box-shaped part may have.
pub const MIN_SIZE: f32 = 2.0;
/// Strut thickness.
pub const LINE_THICKNESS: f32 = 6.0;
pub const DEFAULT_WHEEL_RADIUS: f32 = 20.0;
pub const DEFAULT_THRUSTER_SIZE: f32 = 20.0;

// ---------------------------------------------------------------------------
// Type registry
// ---------------------------------------------------------------------------

/// Every placeable part type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartType {
    Rect,
    Ellipse,
    Polygon,
    Line,
    Wheel,
    Thruster,
    GoalZone,
    GoalObject,
    BuildZone,
}

/// Saved `type` key for each part type.
const PART_TYPES: &[(PartType, &str)] = &[
    (PartType::Rect, "rect"),
    (PartType::Ellipse, "ellipse"),
    (PartType::Polygon, "polygon"),
    (PartType::Line, "line"),
    (PartType::Wheel, "wheel"),
    (PartType::Thruster, "thruster"),
    (PartType::GoalZone, "goal_zone"),
    (PartType::GoalObject, "goal_object"),
    (PartType::BuildZone, "build_zone"),
];

impl PartType {
    pub fn key(self) -> &'static str {
        PART_TYPES
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, k)| *k)
            .unwrap_or("unknown")
    }

    pub fn from_key(key: &str) -> Option<Self> {
        PART_TYPES.iter().find(|(_, k)| *k == key).map(|(t, _)| *t)
    }

    /// Sensors have no physics body and never block placement.
    pub fn is_sensor(self) -> bool {
        matches!(self, PartType::GoalZone | PartType::GoalObject | PartType::BuildZone)
    }

    /// Types created by dragging out a box.
    pub fn is_box_shaped(self) -> bool {
        matches!(
            self,
            PartType::Rect
                | PartType::Ellipse
                | PartType::GoalZone
                | PartType::GoalObject
                | PartType::BuildZone
        )
    }

    fn default_fill(self) -> u32 {
        match self {
            PartType::Rect => 0x8d6e63,
            PartType::Ellipse => 0x4fc3f7,
            PartType::Polygon => 0x81c784,
            PartType::Line => 0x795548,
            PartType::Wheel => 0x424242,
            PartType::Thruster => 0xff7043,
            PartType::GoalZone => 0xffd54f,
            PartType::GoalObject => 0xe57373,
            PartType::BuildZone => 0x90caf9,
        }
    }

    fn default_z_index(self) -> i32 {
        match self {
            PartType::GoalZone | PartType::BuildZone => -1,
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Variant state
// ---------------------------------------------------------------------------

/// Motor settings and live state of a wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    /// -1, 0 or 1. Zero means a free-spinning wheel.
    pub spin_dir: f32,
    pub torque: f32,
    /// Angular speed cap in rad/s.
    pub max_speed: f32,
    /// Set while the center anchor is connected.
    pub motor_on: bool,
}

impl Default for WheelState {
    fn default() -> Self {
        Self {
            spin_dir: 1.0,
            torque: 2.5e6,
            max_speed: 12.0,
            motor_on: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrusterState {
    pub force: f32,
    /// Set while any anchor is connected.
    pub firing: bool,
}

impl Default for ThrusterState {
    fn default() -> Self {
        Self {
            force: 2.0e5,
            firing: false,
        }
    }
}

/// Type tag plus per-type data.
#[derive(Debug, Clone, PartialEq)]
pub enum PartKind {
    Rect,
    Ellipse,
    /// Vertices relative to the part position, before rotation.
    Polygon { points: Vec<Vec2> },
    /// Endpoints are `pos ± rotated(width / 2, 0)`.
    Line,
    Wheel(WheelState),
    Thruster(ThrusterState),
    GoalZone,
    GoalObject,
    BuildZone,
}

impl PartKind {
    pub fn part_type(&self) -> PartType {
        match self {
            PartKind::Rect => PartType::Rect,
            PartKind::Ellipse => PartType::Ellipse,
            PartKind::Polygon { .. } => PartType::Polygon,
            PartKind::Line => PartType::Line,
            PartKind::Wheel(_) => PartType::Wheel,
            PartKind::Thruster(_) => PartType::Thruster,
            PartKind::GoalZone => PartType::GoalZone,
            PartKind::GoalObject => PartType::GoalObject,
            PartKind::BuildZone => PartType::BuildZone,
        }
    }
}

// ---------------------------------------------------------------------------
// Part
// ---------------------------------------------------------------------------

/// A placed object: shared transform fields plus a [`PartKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: PartId,
    pub pos: Vec2,
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
    /// Opt out of collision with other parts (terrain still collides).
    pub no_collide: bool,
    /// 0xRRGGBB
    pub fill_color: u32,
    pub stroke_color: u32,
    pub z_index: i32,
    pub highlighted: bool,
    /// Created by [`Part::enable_physics`], removed by [`Part::release`].
    pub body: Option<PhysicsBody>,
    pub kind: PartKind,
}

impl Part {
    pub fn new(id: PartId, kind: PartKind, pos: Vec2, size: Vec2) -> Self {
        let ty = kind.part_type();
        Self {
            id,
            pos,
            rotation: 0.0,
            width: size.x,
            height: size.y,
            no_collide: false,
            fill_color: ty.default_fill(),
            stroke_color: 0x212121,
            z_index: ty.default_z_index(),
            highlighted: false,
            body: None,
            kind,
        }
    }

    /// A box-shaped part filling `bounds`. `None` for types that are not
    /// box-shaped.
    pub fn boxed(id: PartId, ty: PartType, bounds: Bounds) -> Option<Self> {
        let kind = match ty {
            PartType::Rect => PartKind::Rect,
            PartType::Ellipse => PartKind::Ellipse,
            PartType::GoalZone => PartKind::GoalZone,
            PartType::GoalObject => PartKind::GoalObject,
            PartType::BuildZone => PartKind::BuildZone,
            _ => return None,
        };
        Some(Self::new(id, kind, bounds.center(), bounds.size()))
    }

    pub fn rect(id: PartId, bounds: Bounds) -> Self {
        Self::new(id, PartKind::Rect, bounds.center(), bounds.size())
    }

    /// A polygon from world-space vertices; its position is their centroid.
    pub fn polygon(id: PartId, world_points: &[Vec2]) -> Option<Self> {
        if world_points.len() < 3 {
            return None;
        }
        let center = polygon_centroid(world_points)?;
        let points: Vec<Vec2> = world_points.iter().map(|p| *p - center).collect();
        let size = Bounds::from_points(&points)?.size();
        Some(Self::new(id, PartKind::Polygon { points }, center, size))
    }

    /// A strut from `a` to `b`.
    pub fn line(id: PartId, a: Vec2, b: Vec2) -> Self {
        let mut part = Self::new(id, PartKind::Line, a, Vec2::new(0.0, LINE_THICKNESS));
        part.set_endpoints(a, b);
        part
    }

    pub fn wheel(id: PartId, center: Vec2, radius: f32) -> Self {
        Self::new(
            id,
            PartKind::Wheel(WheelState::default()),
            center,
            Vec2::splat(radius * 2.0),
        )
    }

    pub fn thruster(id: PartId, center: Vec2, size: f32) -> Self {
        Self::new(
            id,
            PartKind::Thruster(ThrusterState::default()),
            center,
            Vec2::splat(size),
        )
    }

    // -- Builder pattern --

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_no_collide(mut self, no_collide: bool) -> Self {
        self.no_collide = no_collide;
        self
    }

    pub fn with_colors(mut self, fill: u32, stroke: u32) -> Self {
        self.fill_color = fill;
        self.stroke_color = stroke;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    // -- Shape --

    pub fn part_type(&self) -> PartType {
        self.kind.part_type()
    }

    pub fn frame(&self) -> Frame {
        Frame::new(self.pos, Vec2::new(self.width, self.height) * 0.5, self.rotation)
    }

    pub fn radius(&self) -> f32 {
        self.width * 0.5
    }

    /// Strut endpoints (anchor 0, anchor 1).
    pub fn endpoints(&self) -> Option<(Vec2, Vec2)> {
        match self.kind {
            PartKind::Line => {
                let half = Vec2::from_angle(self.rotation).rotate(Vec2::new(self.width * 0.5, 0.0));
                Some((self.pos - half, self.pos + half))
            }
            _ => None,
        }
    }

    fn set_endpoints(&mut self, a: Vec2, b: Vec2) {
        let d = b - a;
        self.pos = (a + b) * 0.5;
        self.width = d.length();
        self.rotation = if d.length_squared() > f32::EPSILON {
            d.y.atan2(d.x)
        } else {
            0.0
        };
    }

    /// Move one strut endpoint, keeping the other in place.
    pub fn set_endpoint(&mut self, anchor: AnchorId, p: Vec2) -> bool {
        let Some((a, b)) = self.endpoints() else {
            return false;
        };
        match anchor {
            0 => self.set_endpoints(p, b),
            1 => self.set_endpoints(a, p),
            _ => return false,
        }
        true
    }

    /// Polygon vertices in world space.
    pub fn world_points(&self) -> Option<Vec<Vec2>> {
        match &self.kind {
            PartKind::Polygon { points } => {
                let rot = Vec2::from_angle(self.rotation);
                Some(points.iter().map(|p| self.pos + rot.rotate(*p)).collect())
            }
            _ => None,
        }
    }

    /// Current world-space collision shape, derived from the transform.
    pub fn geom(&self) -> Geom {
        match &self.kind {
            PartKind::Ellipse => Geom::Ellipse {
                center: self.pos,
                radii: Vec2::new(self.width, self.height) * 0.5,
                rotation: self.rotation,
            },
            PartKind::Polygon { .. } => Geom::Polygon(self.world_points().unwrap_or_default()),
            PartKind::Line => {
                let (a, b) = self.endpoints().unwrap_or((self.pos, self.pos));
                Geom::Line { a, b }
            }
            PartKind::Wheel(_) => Geom::Circle {
                center: self.pos,
                radius: self.radius(),
            },
            _ if self.rotation.abs() <= 1e-6 => Geom::Rect(Bounds::from_center(
                self.pos,
                Vec2::new(self.width, self.height) * 0.5,
            )),
            _ => Geom::Polygon(rotated_rect(
                self.pos,
                Vec2::new(self.width, self.height) * 0.5,
                self.rotation,
            )),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.geom().bounds()
    }

    /// Whether the part blocks placement of other parts.
    pub fn is_solid(&self) -> bool {
        !self.part_type().is_sensor() && !self.no_collide
    }

    /// Whether the current size is a valid placement.
    pub fn has_valid_size(&self) -> bool {
        match &self.kind {
            PartKind::Line => self.width >= MIN_LENGTH,
            PartKind::Polygon { points } => {
                let area = crate::geometry::polygon_area(points);
                points.len() >= 3 && area >= crate::geometry::clip::MIN_ISLAND_AREA
            }
            _ => self.width >= MIN_SIZE && self.height >= MIN_SIZE,
        }
    }

    // -- Physics --

    /// Collider in body-local coordinates. Sensors have none.
    pub fn physics_shape(&self) -> Option<ColliderDesc> {
        match &self.kind {
            PartKind::GoalZone | PartKind::GoalObject | PartKind::BuildZone => None,
            PartKind::Rect | PartKind::Thruster(_) => Some(ColliderDesc::Cuboid {
                half_width: self.width * 0.5,
                half_height: self.height * 0.5,
            }),
            PartKind::Ellipse if (self.width - self.height).abs() <= 1e-3 => {
                Some(ColliderDesc::Ball {
                    radius: self.width * 0.5,
                })
            }
            PartKind::Ellipse => Some(ColliderDesc::ConvexHull {
                points: ellipse_points(
                    Vec2::ZERO,
                    Vec2::new(self.width, self.height) * 0.5,
                    0.0,
                    CURVE_SEGMENTS,
                ),
            }),
            PartKind::Polygon { points } if is_convex(points) => Some(ColliderDesc::ConvexHull {
                points: points.clone(),
            }),
            PartKind::Polygon { points } => Some(ColliderDesc::Decomposed {
                points: points.clone(),
            }),
            PartKind::Line => Some(ColliderDesc::CapsuleX {
                half_length: self.width * 0.5,
                radius: self.height * 0.5,
            }),
            PartKind::Wheel(_) => Some(ColliderDesc::Ball {
                radius: self.radius(),
            }),
        }
    }

    pub fn physics_options(&self) -> ColliderMaterial {
        match self.kind {
            PartKind::Wheel(_) => ColliderMaterial {
                friction: 1.5,
                ..Default::default()
            },
            PartKind::Line => ColliderMaterial {
                density: 0.5,
                ..Default::default()
            },
            _ => ColliderMaterial::default(),
        }
    }

    /// Create the physics body. Returns false (and warns on a repeat call)
    /// when no body was created.
    pub fn enable_physics(&mut self, physics: &mut PhysicsWorld) -> bool {
        if self.body.is_some() {
            log::warn!("enable_physics called twice on part {:?}", self.id);
            return false;
        }
        let Some(shape) = self.physics_shape() else {
            return false;
        };
        let desc = BodyDesc::dynamic(shape)
            .with_position(self.pos)
            .with_rotation(self.rotation);
        self.body = Some(physics.create_body(&desc, self.physics_options(), self.no_collide));
        true
    }

    /// Part-side half of destroying a part: drop the body and stop actuators.
    /// Safe to call repeatedly. Joints must already be disconnected.
    pub fn release(&mut self, physics: &mut PhysicsWorld) -> bool {
        self.highlighted = false;
        match &mut self.kind {
            PartKind::Wheel(w) => w.motor_on = false,
            PartKind::Thruster(t) => t.firing = false,
            _ => {}
        }
        match self.body.take() {
            Some(body) => physics.remove_body(body.id),
            None => false,
        }
    }

    /// Copy the body transform into the part.
    pub fn sync_from_physics(&mut self, physics: &PhysicsWorld) {
        if let Some((pos, rotation)) = self.body.and_then(|b| physics.body_position(b.id)) {
            self.pos = pos;
            self.rotation = rotation;
        }
    }

    /// Teleport the body to the part transform.
    pub fn push_to_physics(&self, physics: &mut PhysicsWorld) {
        if let Some(body) = self.body {
            physics.set_transform(body.id, self.pos, self.rotation);
        }
    }

    // -- Anchors --

    /// Connection points in the fixed per-type order; index = anchor id.
    pub fn anchors(&self) -> Vec<Anchor> {
        let frame = self.frame();
        let h = frame.half;
        match &self.kind {
            PartKind::GoalZone | PartKind::BuildZone => Vec::new(),
            PartKind::Rect | PartKind::GoalObject => {
                let [tl, tr, br, bl] = frame.corners();
                anchor::numbered([self.pos, tl, tr, br, bl])
            }
            PartKind::Ellipse => anchor::numbered([
                self.pos,
                frame.to_world(Vec2::new(h.x, 0.0)),
                frame.to_world(Vec2::new(0.0, h.y)),
                frame.to_world(Vec2::new(-h.x, 0.0)),
                frame.to_world(Vec2::new(0.0, -h.y)),
            ]),
            PartKind::Polygon { .. } => {
                let mut points = vec![self.pos];
                points.extend(self.world_points().unwrap_or_default());
                anchor::numbered(points)
            }
            PartKind::Line => match self.endpoints() {
                Some((a, b)) => anchor::numbered([a, b]),
                None => Vec::new(),
            },
            PartKind::Wheel(_) => {
                let r = self.radius();
                anchor::numbered([
                    self.pos,
                    frame.to_world(Vec2::new(r, 0.0)),
                    frame.to_world(Vec2::new(0.0, r)),
                    frame.to_world(Vec2::new(-r, 0.0)),
                    frame.to_world(Vec2::new(0.0, -r)),
                ])
            }
            PartKind::Thruster(_) => anchor::numbered([self.pos]),
        }
    }

    pub fn anchor_by_id(&self, id: AnchorId) -> Option<Anchor> {
        self.anchors().get(id as usize).copied()
    }

    /// First anchor within `dist` of `p`.
    pub fn hovered_anchor(&self, p: Vec2, dist: f32) -> Option<Anchor> {
        anchor::first_within(&self.anchors(), p, dist)
    }

    /// Whether anchor `id` may take a connection from a part of type
    /// `incoming`. Wheel rim anchors only take strut endpoints.
    pub fn accepts(&self, id: AnchorId, incoming: PartType) -> bool {
        if self.anchor_by_id(id).is_none() {
            return false;
        }
        match self.kind {
            PartKind::Wheel(_) if id != 0 => incoming == PartType::Line,
            _ => true,
        }
    }

    // -- Connection hooks --

    pub fn on_connect(&mut self, anchor: AnchorId) {
        match &mut self.kind {
            PartKind::Wheel(w) if anchor == 0 => w.motor_on = true,
            PartKind::Thruster(t) => t.firing = true,
            _ => {}
        }
    }

    /// `still_connected` lists this part's anchors that remain in some joint.
    pub fn on_disconnect(&mut self, anchor: AnchorId, still_connected: &[AnchorId]) {
        log::debug!("part {:?} anchor {} disconnected", self.id, anchor);
        match &mut self.kind {
            PartKind::Wheel(w) => w.motor_on = still_connected.contains(&0),
            PartKind::Thruster(t) => t.firing = !still_connected.is_empty(),
            _ => {}
        }
    }

    /// Torque to apply this step and the speed cap, if the motor runs.
    pub fn motor(&self) -> Option<(f32, f32)> {
        match self.kind {
            PartKind::Wheel(w) if w.motor_on && w.spin_dir != 0.0 => {
                Some((w.spin_dir * w.torque, w.max_speed))
            }
            _ => None,
        }
    }

    /// Force to apply this step along the rotated local up vector, if firing.
    pub fn thrust(&self) -> Option<Vec2> {
        match self.kind {
            PartKind::Thruster(t) if t.firing => {
                Some(Vec2::from_angle(self.rotation).rotate(Vec2::NEG_Y) * t.force)
            }
            _ => None,
        }
    }

    // -- Editing --

    pub fn translate(&mut self, delta: Vec2) {
        self.pos += delta;
    }

    /// Rotate the whole part about a world point.
    pub fn rotate_about(&mut self, center: Vec2, angle: f32) {
        self.pos = center + Vec2::from_angle(angle).rotate(self.pos - center);
        self.rotation += angle;
    }

    /// Refit the part after its selection box moved from `old` to `new`.
    pub fn mutate_bounds(&mut self, new: &Frame, old: &Frame) {
        let scale = new.scale_from(old);
        match self.kind {
            PartKind::Line => {
                if let Some((a, b)) = self.endpoints() {
                    self.set_endpoints(new.remap(a, old), new.remap(b, old));
                }
            }
            PartKind::Polygon { .. } => {
                let world: Vec<Vec2> = self
                    .world_points()
                    .unwrap_or_default()
                    .iter()
                    .map(|p| new.remap(*p, old))
                    .collect();
                let Some(center) = polygon_centroid(&world) else {
                    return;
                };
                let unrotate = Vec2::from_angle(-self.rotation);
                let local: Vec<Vec2> = world.iter().map(|p| unrotate.rotate(*p - center)).collect();
                if let Some(b) = Bounds::from_points(&local) {
                    self.width = b.width();
                    self.height = b.height();
                }
                self.pos = center;
                self.kind = PartKind::Polygon { points: local };
            }
            PartKind::Wheel(_) => {
                self.pos = new.remap(self.pos, old);
                let r = (self.radius() * scale.x.min(scale.y)).max(MIN_SIZE * 0.5);
                self.width = r * 2.0;
                self.height = r * 2.0;
            }
            _ => {
                self.pos = new.remap(self.pos, old);
                let axis_x = Vec2::from_angle(self.rotation - old.rotation);
                let axis_y = axis_x.perp();
                self.width = (self.width * (axis_x * scale).length()).max(MIN_SIZE);
                self.height = (self.height * (axis_y * scale).length()).max(MIN_SIZE);
                self.rotation += new.rotation - old.rotation;
            }
        }
    }

    /// Copy with a fresh id and no body, through the save format.
    pub fn duplicate(&self, id: PartId) -> Option<Part> {
        let mut data = self.to_save_json();
        data.id = id;
        Part::from_json(&data)
    }

    // -- Serialization --

    pub fn to_save_json(&self) -> SerializedPart {
        let mut data = SerializedPart {
            kind: self.part_type().key().to_string(),
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            no_collide: self.no_collide,
            fill_color: Some(self.fill_color),
            stroke_color: Some(self.stroke_color),
            z_index: Some(self.z_index),
            ..Default::default()
        };
        match &self.kind {
            PartKind::Polygon { .. } => {
                let points = self.world_points().unwrap_or_default();
                data.points = Some(points.iter().flat_map(|p| [p.x, p.y]).collect());
            }
            PartKind::Line => {
                let (a, b) = self.endpoints().unwrap_or((self.pos, self.pos));
                data.x1 = Some(a.x);
                data.y1 = Some(a.y);
                data.x2 = Some(b.x);
                data.y2 = Some(b.y);
                data.size = Some(self.height);
            }
            PartKind::Wheel(w) => {
                data.rotation = Some(self.rotation);
                data.radius = Some(self.radius());
                data.spin_dir = Some(w.spin_dir);
                data.torque = Some(w.torque);
                data.max_speed = Some(w.max_speed);
            }
            PartKind::Thruster(t) => {
                data.rotation = Some(self.rotation);
                data.size = Some(self.width);
                data.force = Some(t.force);
            }
            _ => {
                data.rotation = Some(self.rotation);
                data.width = Some(self.width);
                data.height = Some(self.height);
            }
        }
        data
    }

    /// Rebuild a part from saved data. Unknown types and malformed entries
    /// are skipped with a warning.
    pub fn from_json(data: &SerializedPart) -> Option<Part> {
        let Some(ty) = PartType::from_key(&data.kind) else {
            log::warn!("skipping part {:?}: unknown type {:?}", data.id, data.kind);
            return None;
        };
        let pos = Vec2::new(data.x, data.y);
        let rotation = data.rotation.unwrap_or(0.0);
        let mut part = match ty {
            PartType::Polygon => {
                let flat = data.points.as_deref().unwrap_or_default();
                if flat.len() < 6 || flat.len() % 2 != 0 {
                    log::warn!("skipping polygon {:?}: bad point list", data.id);
                    return None;
                }
                let points: Vec<Vec2> = flat
                    .chunks_exact(2)
                    .map(|c| Vec2::new(c[0], c[1]))
                    .collect();
                Part::polygon(data.id, &points)?
            }
            PartType::Line => {
                let (Some(x1), Some(y1), Some(x2), Some(y2)) = (data.x1, data.y1, data.x2, data.y2)
                else {
                    log::warn!("skipping line {:?}: missing endpoints", data.id);
                    return None;
                };
                let mut line = Part::line(data.id, Vec2::new(x1, y1), Vec2::new(x2, y2));
                line.height = data.size.unwrap_or(LINE_THICKNESS);
                line
            }
            PartType::Wheel => {
                let defaults = WheelState::default();
                let radius = data.radius.unwrap_or(DEFAULT_WHEEL_RADIUS);
                let mut wheel = Part::wheel(data.id, pos, radius).with_rotation(rotation);
                wheel.kind = PartKind::Wheel(WheelState {
                    spin_dir: data.spin_dir.unwrap_or(defaults.spin_dir),
                    torque: data.torque.unwrap_or(defaults.torque),
                    max_speed: data.max_speed.unwrap_or(defaults.max_speed),
                    motor_on: false,
                });
                wheel
            }
            PartType::Thruster => {
                let mut thruster =
                    Part::thruster(data.id, pos, data.size.unwrap_or(DEFAULT_THRUSTER_SIZE))
                        .with_rotation(rotation);
                thruster.kind = PartKind::Thruster(ThrusterState {
                    force: data.force.unwrap_or(ThrusterState::default().force),
                    firing: false,
                });
                thruster
            }
            _ => {
                let size = Vec2::new(
                    data.width.unwrap_or(MIN_SIZE),
                    data.height.unwrap_or(MIN_SIZE),
                );
                let bounds = Bounds::from_center(pos, size * 0.5);
                Part::boxed(data.id, ty, bounds)?.with_rotation(rotation)
            }
        };
        part.no_collide = data.no_collide;
        if let Some(fill) = data.fill_color {
            part.fill_color = fill;
        }
        if let Some(stroke) = data.stroke_color {
            part.stroke_color = stroke;
        }
        if let Some(z) = data.z_index {
            part.z_index = z;
        }
        Some(part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-3
    }

    fn geoms_match(a: &Geom, b: &Geom) -> bool {
        if a.kind() != b.kind() {
            return false;
        }
        let (ba, bb) = (a.bounds(), b.bounds());
        if !close(ba.min, bb.min) || !close(ba.max, bb.max) {
            return false;
        }
        match (a.to_polygon(), b.to_polygon()) {
            (Some(pa), Some(pb)) => {
                pa.len() == pb.len() && pa.iter().zip(&pb).all(|(p, q)| close(*p, *q))
            }
            (None, None) => true,
            _ => false,
        }
    }

    fn samples() -> Vec<Part> {
        let mut wheel = Part::wheel(PartId(5), Vec2::new(3.0, 4.0), 17.0).with_rotation(0.3);
        if let PartKind::Wheel(w) = &mut wheel.kind {
            w.spin_dir = -1.0;
            w.max_speed = 4.0;
        }
        let boxed = |id, ty, center, half| {
            Part::boxed(PartId(id), ty, Bounds::from_center(center, half)).unwrap()
        };
        let quad = [
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(30.0, 10.0),
            Vec2::new(10.0, 25.0),
        ];
        vec![
            Part::rect(PartId(1), Bounds::from_corners(Vec2::ZERO, Vec2::new(40.0, 20.0)))
                .with_rotation(0.5),
            boxed(2, PartType::Ellipse, Vec2::new(9.0, 1.0), Vec2::new(12.0, 5.0))
                .with_rotation(-1.1),
            Part::polygon(PartId(3), &quad).unwrap().with_rotation(0.7),
            Part::line(PartId(4), Vec2::new(-10.0, 5.0), Vec2::new(40.0, -20.0)),
            wheel,
            Part::thruster(PartId(6), Vec2::new(50.0, 50.0), 24.0)
                .with_rotation(1.2)
                .with_no_collide(true),
            boxed(7, PartType::GoalZone, Vec2::ZERO, Vec2::splat(50.0)),
            boxed(8, PartType::GoalObject, Vec2::ONE, Vec2::splat(8.0)),
            boxed(9, PartType::BuildZone, Vec2::ZERO, Vec2::splat(200.0)).with_z_index(-3),
        ]
    }

    #[test]
    fn type_keys_round_trip() {
        for (ty, key) in PART_TYPES {
            assert_eq!(ty.key(), *key);
            assert_eq!(PartType::from_key(key), Some(*ty));
        }
        assert_eq!(PartType::from_key("trampoline"), None);
    }

    #[test]
    fn save_round_trip_preserves_geometry_and_fields() {
        for part in samples() {
            let json = serde_json::to_string(&part.to_save_json()).unwrap();
            let data: SerializedPart = serde_json::from_str(&json).unwrap();
            let back = Part::from_json(&data).expect("known type");
            assert_eq!(back.id, part.id);
            assert_eq!(back.part_type(), part.part_type());
            assert!(
                geoms_match(&back.geom(), &part.geom()),
                "{:?}: {:?} vs {:?}",
                part.part_type(),
                back.geom(),
                part.geom()
            );
            assert_eq!(back.no_collide, part.no_collide);
            assert_eq!(back.z_index, part.z_index);
            assert_eq!(back.fill_color, part.fill_color);
            match (&back.kind, &part.kind) {
                (PartKind::Wheel(a), PartKind::Wheel(b)) => assert_eq!(a, b),
                (PartKind::Thruster(a), PartKind::Thruster(b)) => assert_eq!(a, b),
                _ => {}
            }
        }
    }

    #[test]
    fn unknown_type_is_skipped() {
        let data = SerializedPart {
            kind: "cannon".into(),
            id: PartId(1),
            ..Default::default()
        };
        assert!(Part::from_json(&data).is_none());
    }

    #[test]
    fn rect_anchor_order() {
        let part = Part::rect(PartId(1), Bounds::from_corners(Vec2::ZERO, Vec2::new(20.0, 10.0)));
        let anchors: Vec<Vec2> = part.anchors().iter().map(|a| a.pos).collect();
        assert_eq!(
            anchors,
            vec![
                Vec2::new(10.0, 5.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(20.0, 0.0),
                Vec2::new(20.0, 10.0),
                Vec2::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn wheel_has_center_and_four_rim_anchors() {
        let wheel = Part::wheel(PartId(1), Vec2::ZERO, 10.0);
        let anchors = wheel.anchors();
        assert_eq!(anchors.len(), 5);
        assert_eq!(anchors[0].pos, Vec2::ZERO);
        assert!(close(anchors[1].pos, Vec2::new(10.0, 0.0)));
        assert!(close(anchors[2].pos, Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn line_anchors_are_endpoints() {
        let line = Part::line(PartId(1), Vec2::new(1.0, 2.0), Vec2::new(11.0, 2.0));
        let anchors = line.anchors();
        assert_eq!(anchors.len(), 2);
        assert!(close(anchors[0].pos, Vec2::new(1.0, 2.0)));
        assert!(close(anchors[1].pos, Vec2::new(11.0, 2.0)));
        assert!((line.width - 10.0).abs() < 1e-4);
    }

    #[test]
    fn zones_have_no_anchors_or_body() {
        let bounds = Bounds::from_center(Vec2::ZERO, Vec2::ONE);
        let mut zone = Part::boxed(PartId(1), PartType::BuildZone, bounds).unwrap();
        assert!(zone.anchors().is_empty());
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        assert!(!zone.enable_physics(&mut world));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn wheel_rim_only_accepts_struts() {
        let wheel = Part::wheel(PartId(1), Vec2::ZERO, 10.0);
        assert!(wheel.accepts(0, PartType::Rect));
        assert!(wheel.accepts(2, PartType::Line));
        assert!(!wheel.accepts(2, PartType::Rect));
        assert!(!wheel.accepts(9, PartType::Line), "missing anchor");
    }

    #[test]
    fn hovered_anchor_uses_distance() {
        let line = Part::line(PartId(1), Vec2::ZERO, Vec2::new(100.0, 0.0));
        assert_eq!(line.hovered_anchor(Vec2::new(98.0, 1.0), 5.0).map(|a| a.id), Some(1));
        assert!(line.hovered_anchor(Vec2::new(50.0, 0.0), 5.0).is_none());
    }

    #[test]
    fn enable_physics_twice_is_refused() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut part = Part::wheel(PartId(1), Vec2::ZERO, 10.0);
        assert!(part.enable_physics(&mut world));
        let body = part.body;
        assert!(!part.enable_physics(&mut world));
        assert_eq!(part.body, body, "first body is kept");
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut part = Part::rect(PartId(1), Bounds::from_center(Vec2::ZERO, Vec2::splat(5.0)));
        part.enable_physics(&mut world);
        assert!(part.release(&mut world));
        assert!(!part.release(&mut world));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn wheel_motor_follows_center_anchor() {
        let mut wheel = Part::wheel(PartId(1), Vec2::ZERO, 10.0);
        wheel.on_connect(2);
        assert!(wheel.motor().is_none(), "rim connection does not drive");
        wheel.on_connect(0);
        assert!(wheel.motor().is_some());
        wheel.on_disconnect(2, &[0]);
        assert!(wheel.motor().is_some());
        wheel.on_disconnect(0, &[]);
        assert!(wheel.motor().is_none());
    }

    #[test]
    fn thruster_fires_while_connected() {
        let mut thruster = Part::thruster(PartId(1), Vec2::ZERO, 10.0);
        assert!(thruster.thrust().is_none());
        thruster.on_connect(0);
        let f = thruster.thrust().unwrap();
        assert!(f.y < 0.0 && f.x.abs() < 1e-3, "unrotated thrust points up: {f:?}");
        thruster.on_disconnect(0, &[]);
        assert!(thruster.thrust().is_none());
    }

    #[test]
    fn short_line_is_invalid() {
        let stub = Part::line(PartId(1), Vec2::ZERO, Vec2::new(MIN_LENGTH - 1.0, 0.0));
        assert!(!stub.has_valid_size());
        assert!(Part::line(PartId(1), Vec2::ZERO, Vec2::new(MIN_LENGTH, 0.0)).has_valid_size());
    }

    #[test]
    fn mutate_bounds_scales_rect_about_frame() {
        let mut part = Part::rect(PartId(1), Bounds::from_corners(Vec2::ZERO, Vec2::splat(10.0)));
        let old = Frame::new(Vec2::new(5.0, 5.0), Vec2::splat(5.0), 0.0);
        let new = Frame::new(Vec2::new(10.0, 5.0), Vec2::new(10.0, 5.0), 0.0);
        part.mutate_bounds(&new, &old);
        assert!(close(part.pos, Vec2::new(10.0, 5.0)));
        assert!((part.width - 20.0).abs() < 1e-4);
        assert!((part.height - 10.0).abs() < 1e-4);
    }

    #[test]
    fn mutate_bounds_remaps_polygon_vertices() {
        let mut part = Part::polygon(
            PartId(1),
            &[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)],
        )
        .unwrap();
        let old = Frame::from_bounds(&Bounds::from_corners(Vec2::ZERO, Vec2::splat(10.0)));
        let new = Frame::from_bounds(&Bounds::from_corners(Vec2::ZERO, Vec2::new(20.0, 10.0)));
        part.mutate_bounds(&new, &old);
        let pts = part.world_points().unwrap();
        assert!(close(pts[1], Vec2::new(20.0, 0.0)), "{pts:?}");
        assert!(close(pts[2], Vec2::new(0.0, 10.0)), "{pts:?}");
    }

    #[test]
    fn duplicate_gets_new_id_and_no_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut part = Part::wheel(PartId(1), Vec2::new(4.0, 4.0), 10.0);
        part.enable_physics(&mut world);
        let copy = part.duplicate(PartId(2)).unwrap();
        assert_eq!(copy.id, PartId(2));
        assert!(copy.body.is_none());
        assert_eq!(copy.pos, part.pos);
    }

    #[test]
    fn rotate_about_moves_line_endpoints() {
        let mut line = Part::line(PartId(1), Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0));
        line.rotate_about(Vec2::ZERO, std::f32::consts::FRAC_PI_2);
        let (a, b) = line.endpoints().unwrap();
        assert!(close(a, Vec2::new(0.0, 10.0)), "{a:?}");
        assert!(close(b, Vec2::new(0.0, 20.0)), "{b:?}");
    }
}
