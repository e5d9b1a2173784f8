//! Per-scene state shared by every tool: parts, physics, joints, selection
//! and the transient drag/edit records.
//!
//! Tools receive `&mut SceneContext` on each event and never hold references
//! into it between events.

use glam::Vec2;

use crate::api::config::SandboxConfig;
use crate::api::events::{EventBus, SceneEvent};
use crate::api::types::{AnchorId, IdAllocator, PartId, SceneKind};
use crate::components::anchor::Anchor;
use crate::components::part::{Part, PartType};
use crate::core::joints::{AnchorRef, JointGraph};
use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial, PhysicsBody, PhysicsWorld};
use crate::core::scene::PartSet;
use crate::geometry::{intersects, merge_geoms, Bounds, Geom};
use crate::persist::format::{MapData, SerializedPhysics};
use crate::renderer::camera::Camera2D;
use crate::systems::actuators::{apply_actuators, clamp_motor_speeds, sync_parts};

/// Static scenery: a fixed body plus its hit-test shape.
#[derive(Debug, Clone)]
pub struct Terrain {
    pub body: PhysicsBody,
    pub geom: Geom,
}

/// What an in-flight drag is moving.
#[derive(Debug, Clone, PartialEq)]
pub enum DragKind {
    /// A connected group of whole parts.
    Parts(Vec<PartId>),
    /// One strut endpoint, detached from its joint.
    Endpoint { part: PartId, anchor: AnchorId },
    /// A resize or rotate handle of the selection box.
    Handle,
}

/// Pointer drag in progress. While set, box selection stays idle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub kind: DragKind,
    pub origin: Vec2,
    pub last: Vec2,
    pub moved: bool,
}

impl ActiveDrag {
    pub fn new(kind: DragKind, origin: Vec2) -> Self {
        Self {
            kind,
            origin,
            last: origin,
            moved: false,
        }
    }
}

/// Vertex-level edit of one polygon (or of a new one, while drawing).
#[derive(Debug, Clone, PartialEq)]
pub struct PointEdit {
    /// Polygon being edited; `None` for a pen stroke.
    pub part: Option<PartId>,
    /// Working vertices in world space.
    pub points: Vec<Vec2>,
    /// Vertices at the start of the edit, restored on cancel.
    pub original: Vec<Vec2>,
    /// Indices into `points`.
    pub selected: Vec<usize>,
}

impl PointEdit {
    pub fn new(part: Option<PartId>, points: Vec<Vec2>) -> Self {
        Self {
            part,
            original: points.clone(),
            points,
            selected: Vec::new(),
        }
    }

    pub fn revert(&mut self) {
        self.points = self.original.clone();
        self.selected.clear();
    }
}

pub struct SceneContext {
    pub kind: SceneKind,
    pub config: SandboxConfig,
    pub parts: PartSet,
    pub physics: PhysicsWorld,
    pub joints: JointGraph,
    pub ids: IdAllocator,
    pub events: EventBus,
    pub camera: Camera2D,
    pub terrain: Vec<Terrain>,
    pub world_bounds: Bounds,
    pub active_drag: Option<ActiveDrag>,
    pub point_edit: Option<PointEdit>,
    selected: Vec<PartId>,
    grid_snapping: bool,
    running: bool,
    pending_tool: Option<String>,
    dirty: bool,
}

impl SceneContext {
    pub fn new(kind: SceneKind, config: SandboxConfig) -> Self {
        let mut physics = PhysicsWorld::new(config.gravity);
        physics.set_dt(config.fixed_dt);
        let mut camera = Camera2D::new(config.viewport);
        camera.set_bounds(config.world_bounds);
        Self {
            kind,
            parts: PartSet::new(),
            physics,
            joints: JointGraph::new(config.joint_settings()),
            ids: IdAllocator::new(),
            events: EventBus::new(),
            camera,
            terrain: Vec::new(),
            world_bounds: config.world_bounds,
            active_drag: None,
            point_edit: None,
            selected: Vec::new(),
            grid_snapping: false,
            running: false,
            pending_tool: None,
            dirty: false,
            config,
        }
    }

    /// Create the static ground along the bottom of the world.
    pub fn build_scenery(&mut self) {
        let wb = self.world_bounds;
        let ground = Bounds::from_corners(
            Vec2::new(wb.min.x, wb.max.y - self.config.ground_height),
            wb.max,
        );
        self.add_terrain(ground);
    }

    pub fn add_terrain(&mut self, bounds: Bounds) {
        let half = bounds.half_size();
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid {
            half_width: half.x,
            half_height: half.y,
        })
        .with_position(bounds.center());
        let body = self.physics.create_terrain(&desc, ColliderMaterial::default());
        self.terrain.push(Terrain {
            body,
            geom: Geom::Rect(bounds),
        });
    }

    // -- Parts --

    /// Whether `count` more parts fit under the limit. Flashes when not.
    pub fn has_room_for(&mut self, count: usize) -> bool {
        if self.parts.len() + count > self.config.max_parts {
            self.flash(format!("Part limit reached ({})", self.config.max_parts));
            return false;
        }
        true
    }

    /// Give a part its body and add it on top of the scene.
    pub fn insert_part(&mut self, mut part: Part) -> PartId {
        let id = part.id;
        self.ids.advance_past(id.0);
        part.enable_physics(&mut self.physics);
        self.parts.push(part);
        self.mark_dirty();
        id
    }

    /// Disconnect, release and remove one part. A second call for the same
    /// id is a no-op returning false.
    pub fn destroy_part(&mut self, id: PartId) -> bool {
        if !self.remove_part(id) {
            return false;
        }
        if self.selected.contains(&id) {
            let next: Vec<PartId> = self.selected.iter().copied().filter(|s| *s != id).collect();
            self.set_selected(next);
        }
        if self.point_edit.as_ref().is_some_and(|e| e.part == Some(id)) {
            self.point_edit = None;
        }
        self.mark_dirty();
        true
    }

    fn remove_part(&mut self, id: PartId) -> bool {
        let Some(body) = self.parts.get(id).map(|p| p.body) else {
            return false;
        };
        if let Some(body) = body {
            self.joints
                .delete_connections(&mut self.parts, &mut self.physics, body.id);
        }
        if let Some(mut part) = self.parts.remove(id) {
            part.release(&mut self.physics);
        }
        true
    }

    /// Destroy every part without touching terrain.
    pub fn clear_parts(&mut self) {
        for id in self.parts.ids() {
            self.remove_part(id);
        }
        self.joints = JointGraph::new(self.config.joint_settings());
        self.selected.clear();
        self.point_edit = None;
        self.active_drag = None;
    }

    /// Every part and joint, with nothing filtered out.
    pub fn snapshot(&self) -> MapData {
        MapData {
            objects: self.parts.iter().map(Part::to_save_json).collect(),
            physics: Some(self.joints.serialize_physics()),
        }
    }

    /// Save payload: parts outside the padded world bounds are left out,
    /// along with their connections.
    pub fn save_data(&self) -> MapData {
        let area = self.world_bounds.expand(self.config.save_padding);
        let kept: Vec<&Part> = self
            .parts
            .iter()
            .filter(|p| p.bounds().intersects(&area))
            .collect();
        let kept_ids: Vec<PartId> = kept.iter().map(|p| p.id).collect();
        if kept.len() != self.parts.len() {
            log::info!("save: leaving out {} stray parts", self.parts.len() - kept.len());
        }
        MapData {
            objects: kept.iter().map(|p| p.to_save_json()).collect(),
            physics: Some(
                self.joints
                    .serialize_physics_where(|id| kept_ids.contains(&id)),
            ),
        }
    }

    /// Add saved parts and joints to the scene. Returns how many parts
    /// were created; bad entries are skipped.
    ///
    /// Ids are advanced past the data first. A saved part whose id is
    /// already taken in the scene gets a fresh id, and its connections
    /// follow it.
    pub fn load_map(&mut self, data: &MapData) -> usize {
        if let Some(max) = data.max_id() {
            self.ids.advance_past(max);
        }
        let mut renamed: Vec<(PartId, PartId)> = Vec::new();
        let mut seen: Vec<PartId> = Vec::new();
        let mut loaded = 0;
        for obj in &data.objects {
            if renamed.iter().any(|(from, _)| *from == obj.id) || seen.contains(&obj.id) {
                log::warn!("skipping part {:?}: duplicate id in saved data", obj.id);
                continue;
            }
            let Some(mut part) = Part::from_json(obj) else {
                continue;
            };
            if self.parts.contains(obj.id) {
                part.id = self.ids.next_part();
                log::warn!("load: part id {:?} taken, loaded as {:?}", obj.id, part.id);
                renamed.push((obj.id, part.id));
            } else {
                seen.push(obj.id);
            }
            part.enable_physics(&mut self.physics);
            self.parts.push(part);
            loaded += 1;
        }
        if let Some(physics) = &data.physics {
            let physics = remap_connections(physics, &renamed);
            let joints = self.joints.deserialize_physics(
                &mut self.parts,
                &mut self.physics,
                &mut self.ids,
                &physics,
            );
            log::debug!("load: {} parts, {} joints", loaded, joints);
        }
        loaded
    }

    /// Serialise everything, destroy it and load it back. Ids and the
    /// selection survive.
    pub fn rebuild_parts(&mut self) {
        let data = self.snapshot();
        let selected = self.selected.clone();
        self.clear_parts();
        self.load_map(&data);
        self.selected.clear();
        self.apply_selection(selected);
    }

    // -- Selection --

    pub fn selected(&self) -> &[PartId] {
        &self.selected
    }

    /// Replace the selection, updating highlights by diff. Emits
    /// `SetSelected` when the set changed.
    pub fn set_selected(&mut self, ids: Vec<PartId>) {
        if self.apply_selection(ids) {
            self.events.emit(SceneEvent::SetSelected {
                ids: self.selected.clone(),
            });
        }
    }

    fn apply_selection(&mut self, ids: Vec<PartId>) -> bool {
        let mut next: Vec<PartId> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.parts.contains(id) && !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.selected {
            return false;
        }
        for id in &self.selected {
            if !next.contains(id) {
                if let Some(p) = self.parts.get_mut(*id) {
                    p.highlighted = false;
                }
            }
        }
        for id in &next {
            if let Some(p) = self.parts.get_mut(*id) {
                p.highlighted = true;
            }
        }
        self.selected = next;
        true
    }

    // -- Modes --

    /// Ask the tool manager to switch tools once the current event is done.
    pub fn request_tool(&mut self, key: &str) {
        self.pending_tool = Some(key.to_string());
    }

    pub fn take_tool_request(&mut self) -> Option<String> {
        self.pending_tool.take()
    }

    pub fn grid_snapping(&self) -> bool {
        self.grid_snapping
    }

    pub fn set_grid_snapping(&mut self, enabled: bool) {
        if self.grid_snapping != enabled {
            self.grid_snapping = enabled;
            self.events.emit(SceneEvent::SetGridSnapping { enabled });
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running_flag(&mut self, running: bool) {
        self.running = running;
    }

    /// Round to the grid when snapping is on.
    pub fn snap(&self, p: Vec2) -> Vec2 {
        if !self.grid_snapping {
            return p;
        }
        let g = self.config.grid_size;
        (p / g).round() * g
    }

    pub fn snap_angle(&self, angle: f32) -> f32 {
        if !self.grid_snapping {
            return angle;
        }
        let step = self.config.angle_snap;
        (angle / step).round() * step
    }

    /// Show a transient message to the user.
    pub fn flash(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("flash: {}", message);
        self.events.emit(SceneEvent::ShowFlash { message });
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // -- Queries --

    /// Pick radius in world units for a screen-space radius.
    pub fn pick_radius(&self, screen_radius: f32) -> f32 {
        screen_radius / self.camera.zoom
    }

    /// Topmost anchor near `p`, skipping parts in `ignore` and parts
    /// without a body.
    pub fn find_anchor(&self, p: Vec2, ignore: &[PartId]) -> Option<(PartId, Anchor)> {
        let radius = self.pick_radius(self.config.anchor_radius);
        self.parts.z_order().into_iter().rev().find_map(|id| {
            if ignore.contains(&id) {
                return None;
            }
            let part = self.parts.get(id).filter(|p| p.body.is_some())?;
            part.hovered_anchor(p, radius).map(|a| (id, a))
        })
    }

    /// Topmost part under `p`.
    pub fn topmost_part_at(&self, p: Vec2) -> Option<PartId> {
        self.parts.intersecting(&Geom::Point(p)).last().copied()
    }

    /// Whether `geom` touches terrain or any solid part not in `ignore`.
    pub fn overlaps_solid(&self, geom: &Geom, ignore: &[PartId]) -> bool {
        self.terrain.iter().any(|t| intersects(&t.geom, geom))
            || self
                .parts
                .iter()
                .filter(|p| p.is_solid() && !ignore.contains(&p.id))
                .any(|p| intersects(&p.geom(), geom))
    }

    /// Union of the given parts' bounds.
    pub fn bounds_of(&self, ids: &[PartId]) -> Option<Bounds> {
        ids.iter()
            .filter_map(|id| self.parts.get(*id))
            .map(Part::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn content_bounds(&self) -> Option<Bounds> {
        self.bounds_of(&self.parts.ids())
    }

    /// Connect a placed part's anchor to another part's anchor.
    pub fn connect(&mut self, target: (PartId, AnchorId), part: PartId, anchor: AnchorId) -> bool {
        self.joints
            .stiff_connect(
                &mut self.parts,
                &mut self.physics,
                &mut self.ids,
                AnchorRef::Part {
                    part: target.0,
                    anchor: target.1,
                },
                part,
                anchor,
            )
            .is_some()
    }

    // -- Editing --

    /// Translate parts and teleport their bodies along.
    pub fn move_parts(&mut self, ids: &[PartId], delta: Vec2) {
        for id in ids {
            if let Some(part) = self.parts.get_mut(*id) {
                part.translate(delta);
                part.push_to_physics(&mut self.physics);
            }
        }
    }

    /// Union the selected area shapes into one polygon that replaces them.
    pub fn merge_selected(&mut self) -> Option<PartId> {
        let sources: Vec<PartId> = self
            .selected
            .iter()
            .copied()
            .filter(|id| {
                self.parts.get(*id).is_some_and(|p| {
                    matches!(p.part_type(), PartType::Rect | PartType::Ellipse | PartType::Polygon)
                })
            })
            .collect();
        if sources.len() < 2 {
            self.flash("Select at least two shapes to merge");
            return None;
        }
        let geoms: Vec<Geom> = sources
            .iter()
            .filter_map(|id| self.parts.get(*id).map(Part::geom))
            .collect();
        let Some(points) = merge_geoms(&geoms) else {
            self.flash("Those shapes cannot be merged");
            return None;
        };
        let id = self.ids.next_part();
        let Some(mut merged) = Part::polygon(id, &points) else {
            self.flash("Those shapes cannot be merged");
            return None;
        };
        if let Some(first) = self.parts.get(sources[0]) {
            merged = merged
                .with_colors(first.fill_color, first.stroke_color)
                .with_no_collide(first.no_collide)
                .with_z_index(first.z_index);
        }
        for source in &sources {
            self.destroy_part(*source);
        }
        self.insert_part(merged);
        self.set_selected(vec![id]);
        Some(id)
    }

    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selected.clone();
        ids.into_iter().filter(|id| self.destroy_part(*id)).count()
    }

    /// Copy the selection, offset by two grid cells, with the joints among
    /// the copies mirrored. The copies become the selection.
    pub fn duplicate_selected(&mut self) -> Vec<PartId> {
        let originals: Vec<PartId> = self.selected.clone();
        if originals.is_empty() || !self.has_room_for(originals.len()) {
            return Vec::new();
        }
        let offset = Vec2::splat(self.config.grid_size * 2.0);
        let mut from = Vec::with_capacity(originals.len());
        let mut to = Vec::with_capacity(originals.len());
        for id in originals {
            let new_id = self.ids.next_part();
            let Some(mut copy) = self.parts.get(id).and_then(|p| p.duplicate(new_id)) else {
                continue;
            };
            copy.translate(offset);
            self.insert_part(copy);
            from.push(id);
            to.push(new_id);
        }
        self.joints.clone_physics(
            &mut self.parts,
            &mut self.physics,
            &mut self.ids,
            &from,
            &to,
        );
        self.set_selected(to.clone());
        to
    }

    // -- Simulation --

    /// One fixed physics step with actuators applied.
    pub fn step(&mut self) {
        apply_actuators(&self.parts, &mut self.physics);
        self.physics.step();
        clamp_motor_speeds(&self.parts, &mut self.physics);
        sync_parts(&mut self.parts, &self.physics);
    }
}

/// Point saved connections at renamed parts.
fn remap_connections(
    data: &SerializedPhysics,
    renamed: &[(PartId, PartId)],
) -> SerializedPhysics {
    let mut data = data.clone();
    if renamed.is_empty() {
        return data;
    }
    for c in data.joints.iter_mut().flat_map(|j| j.connections.iter_mut()) {
        if let Some((_, to)) = renamed.iter().find(|(from, _)| *from == c.obj_id) {
            c.obj_id = *to;
        }
    }
    data
}
