use std::collections::{BTreeSet, HashMap};

use glam::Vec2;
use rapier2d::prelude::*;

use crate::api::types::{BodyId, JointId};

// ---------------------------------------------------------------------------
// glam <-> nalgebra conversions
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn vec2_to_point(v: Vec2) -> nalgebra::Point2<f32> {
    nalgebra::Point2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
    /// Capsule along the local X axis (struts).
    CapsuleX { half_length: f32, radius: f32 },
    /// Convex outline in body-local coordinates.
    ConvexHull { points: Vec<Vec2> },
    /// Arbitrary simple outline in body-local coordinates, split into convex
    /// pieces by the engine.
    Decomposed { points: Vec<Vec2> },
}

impl ColliderDesc {
    fn build_collider(&self) -> Option<ColliderBuilder> {
        match self {
            ColliderDesc::Ball { radius } => Some(ColliderBuilder::ball(*radius)),
            ColliderDesc::Cuboid {
                half_width,
                half_height,
            } => Some(ColliderBuilder::cuboid(*half_width, *half_height)),
            ColliderDesc::CapsuleX {
                half_length,
                radius,
            } => Some(ColliderBuilder::capsule_x(*half_length, *radius)),
            ColliderDesc::ConvexHull { points } => {
                let pts: Vec<_> = points.iter().map(|p| vec2_to_point(*p)).collect();
                ColliderBuilder::convex_hull(&pts)
            }
            ColliderDesc::Decomposed { points } => {
                if points.len() < 3 {
                    return None;
                }
                let pts: Vec<_> = points.iter().map(|p| vec2_to_point(*p)).collect();
                let n = pts.len() as u32;
                let indices: Vec<[u32; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();
                Some(ColliderBuilder::convex_decomposition(&pts, &indices))
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.1,
            friction: 0.8,
            density: 1.0,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub collider: ColliderDesc,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            collider,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            ..Self::dynamic(collider)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the angular damping (rotation decay). Higher values slow rotation faster.
    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }
}

/// Handles stored on a Part, referencing Rapier internals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    pub id: BodyId,
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// Handle to a constraint in the physics simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointHandle(pub(crate) ImpulseJointHandle);

/// Description of a constraint pinning two bodies at a shared point.
#[derive(Debug, Clone, Copy)]
pub enum JointDesc {
    /// Rigid pin: both anchors coincide, free rotation (hinge in 2D).
    Pin { anchor_a: Vec2, anchor_b: Vec2 },
    /// Soft pin: a zero-length spring between the anchors.
    Spring {
        anchor_a: Vec2,
        anchor_b: Vec2,
        stiffness: f32,
        damping: f32,
    },
}

// ---------------------------------------------------------------------------
// Collision filtering
// ---------------------------------------------------------------------------

/// Per-body collision state consulted on every contact pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionFilter {
    pub id: BodyId,
    /// Opt out of collision with other parts. Terrain still collides.
    pub no_collide: bool,
    /// Static scenery: collides with every part.
    pub terrain: bool,
    /// Joints this body belongs to. Bodies sharing any joint never collide.
    pub joints: BTreeSet<JointId>,
}

impl CollisionFilter {
    pub fn part(id: BodyId, no_collide: bool) -> Self {
        Self {
            id,
            no_collide,
            terrain: false,
            joints: BTreeSet::new(),
        }
    }

    pub fn terrain(id: BodyId) -> Self {
        Self {
            id,
            no_collide: false,
            terrain: true,
            joints: BTreeSet::new(),
        }
    }

    /// Whether the two filters have any joint in common.
    /// Walks the smaller set and looks each id up in the larger one.
    pub fn shares_joint(&self, other: &CollisionFilter) -> bool {
        let (small, large) = if self.joints.len() <= other.joints.len() {
            (&self.joints, &other.joints)
        } else {
            (&other.joints, &self.joints)
        };
        small.iter().any(|j| large.contains(j))
    }
}

/// The collision predicate: may bodies `a` and `b` generate contacts?
pub fn can_collide(a: &CollisionFilter, b: &CollisionFilter) -> bool {
    if a.id == b.id {
        return false;
    }
    if a.terrain || b.terrain {
        return true;
    }
    if a.no_collide || b.no_collide {
        return false;
    }
    !a.shares_joint(b)
}

#[derive(Debug)]
struct BodyRecord {
    handle: RigidBodyHandle,
    filter: CollisionFilter,
}

/// Rapier hook routing every candidate contact pair through [`can_collide`].
struct JointContactFilter<'a> {
    records: &'a HashMap<BodyId, BodyRecord>,
}

impl JointContactFilter<'_> {
    fn lookup(
        &self,
        bodies: &RigidBodySet,
        handle: Option<RigidBodyHandle>,
    ) -> Option<&CollisionFilter> {
        let rb = bodies.get(handle?)?;
        let id = BodyId(rb.user_data as u32);
        self.records.get(&id).map(|r| &r.filter)
    }
}

impl PhysicsHooks for JointContactFilter<'_> {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let a = self.lookup(context.bodies, context.rigid_body1);
        let b = self.lookup(context.bodies, context.rigid_body2);
        match (a, b) {
            (Some(a), Some(b)) if !can_collide(a, b) => None,
            _ => Some(SolverFlags::COMPUTE_IMPULSES),
        }
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single, easy-to-use struct.
/// Treated as a black box by the joint model: bodies, constraints, filters, step.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    records: HashMap<BodyId, BodyRecord>,
    next_body: u32,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// Y points down, so positive Y gravity pulls bodies downward.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            records: HashMap::new(),
            next_body: 1,
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    fn insert_body(
        &mut self,
        desc: &BodyDesc,
        material: ColliderMaterial,
        filter: impl FnOnce(BodyId) -> CollisionFilter,
    ) -> PhysicsBody {
        let id = BodyId(self.next_body);
        self.next_body += 1;

        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .user_data(id.0 as u128)
            .build();
        let body_handle = self.bodies.insert(rb);

        let builder = desc.collider.build_collider().unwrap_or_else(|| {
            log::warn!("collider {:?} could not be built, using a unit box", desc.collider);
            ColliderBuilder::cuboid(0.5, 0.5)
        });
        let collider = builder
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS)
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        self.records.insert(
            id,
            BodyRecord {
                handle: body_handle,
                filter: filter(id),
            },
        );

        PhysicsBody {
            id,
            body_handle,
            collider_handle,
        }
    }

    /// Create a part body. `no_collide` bodies only touch terrain.
    pub fn create_body(
        &mut self,
        desc: &BodyDesc,
        material: ColliderMaterial,
        no_collide: bool,
    ) -> PhysicsBody {
        self.insert_body(desc, material, |id| CollisionFilter::part(id, no_collide))
    }

    /// Create a static scenery body that collides with every part.
    pub fn create_terrain(&mut self, desc: &BodyDesc, material: ColliderMaterial) -> PhysicsBody {
        self.insert_body(desc, material, CollisionFilter::terrain)
    }

    /// Remove a body, its colliders and any constraints attached to it.
    /// Returns false if the body was already gone.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(record) = self.records.remove(&id) else {
            return false;
        };
        self.bodies.remove(
            record.handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }

    /// Whether a body with this id is still alive.
    pub fn contains(&self, id: BodyId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn filter(&self, id: BodyId) -> Option<&CollisionFilter> {
        self.records.get(&id).map(|r| &r.filter)
    }

    pub fn filter_mut(&mut self, id: BodyId) -> Option<&mut CollisionFilter> {
        self.records.get_mut(&id).map(|r| &mut r.filter)
    }

    /// Every body's collision filter, in no particular order.
    pub fn filters(&self) -> impl Iterator<Item = &CollisionFilter> {
        self.records.values().map(|r| &r.filter)
    }

    /// The collision predicate for two live bodies.
    pub fn bodies_can_collide(&self, a: BodyId, b: BodyId) -> bool {
        match (self.filter(a), self.filter(b)) {
            (Some(fa), Some(fb)) => can_collide(fa, fb),
            _ => false,
        }
    }

    fn rigid_body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(self.records.get(&id)?.handle)
    }

    fn rigid_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let handle = self.records.get(&id)?.handle;
        self.bodies.get_mut(handle)
    }

    /// Advance the simulation by one timestep.
    pub fn step(&mut self) {
        let hooks = JointContactFilter {
            records: &self.records,
        };
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &(),
        );
    }

    /// Clear user forces and torques accumulated on a body.
    pub fn reset_forces(&mut self, id: BodyId) {
        if let Some(rb) = self.rigid_body_mut(id) {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }
    }

    /// Add a force to a body. Persists until [`PhysicsWorld::reset_forces`].
    pub fn apply_force(&mut self, id: BodyId, force: Vec2) {
        if let Some(rb) = self.rigid_body_mut(id) {
            rb.add_force(vec2_to_na(force), true);
        }
    }

    /// Add a torque to a body. Persists until [`PhysicsWorld::reset_forces`].
    pub fn apply_torque(&mut self, id: BodyId, torque: f32) {
        if let Some(rb) = self.rigid_body_mut(id) {
            rb.add_torque(torque, true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, id: BodyId) -> Vec2 {
        self.rigid_body(id)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn angular_velocity(&self, id: BodyId) -> f32 {
        self.rigid_body(id).map(|rb| rb.angvel()).unwrap_or(0.0)
    }

    pub fn set_angular_velocity(&mut self, id: BodyId, angvel: f32) {
        if let Some(rb) = self.rigid_body_mut(id) {
            rb.set_angvel(angvel, true);
        }
    }

    /// Teleport a body and zero its velocities (editor drags).
    pub fn set_transform(&mut self, id: BodyId, pos: Vec2, rotation: f32) {
        if let Some(rb) = self.rigid_body_mut(id) {
            rb.set_position(nalgebra::Isometry2::new(vec2_to_na(pos), rotation), true);
            rb.set_linvel(nalgebra::Vector2::zeros(), false);
            rb.set_angvel(0.0, false);
        }
    }

    /// Get the current position and rotation of a body.
    pub fn body_position(&self, id: BodyId) -> Option<(Vec2, f32)> {
        self.rigid_body(id).map(|rb| na_iso_to_pos_rot(rb.position()))
    }

    /// Express a world point in a body's local frame.
    pub fn world_to_local(&self, id: BodyId, point: Vec2) -> Option<Vec2> {
        let rb = self.rigid_body(id)?;
        let local = rb.position().inverse_transform_point(&vec2_to_point(point));
        Some(Vec2::new(local.x, local.y))
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // -- Joint methods --

    /// Create a constraint between two bodies. `None` if either body is gone.
    pub fn create_joint(&mut self, a: BodyId, b: BodyId, desc: &JointDesc) -> Option<JointHandle> {
        let ha = self.records.get(&a)?.handle;
        let hb = self.records.get(&b)?.handle;
        let data: GenericJoint = match *desc {
            JointDesc::Pin { anchor_a, anchor_b } => RevoluteJointBuilder::new()
                .local_anchor1(vec2_to_point(anchor_a))
                .local_anchor2(vec2_to_point(anchor_b))
                .contacts_enabled(false)
                .build()
                .into(),
            JointDesc::Spring {
                anchor_a,
                anchor_b,
                stiffness,
                damping,
            } => SpringJointBuilder::new(0.0, stiffness, damping)
                .local_anchor1(vec2_to_point(anchor_a))
                .local_anchor2(vec2_to_point(anchor_b))
                .contacts_enabled(false)
                .build()
                .into(),
        };
        Some(JointHandle(self.impulse_joints.insert(ha, hb, data, true)))
    }

    /// Remove a constraint. Stale handles (body already removed) are ignored.
    pub fn remove_joint(&mut self, handle: JointHandle) {
        self.impulse_joints.remove(handle.0, true);
    }

    /// Number of constraints in the simulation.
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(world: &mut PhysicsWorld, pos: Vec2) -> PhysicsBody {
        world.create_body(
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 }).with_position(pos),
            ColliderMaterial::default(),
            false,
        )
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = ball(&mut world, Vec2::ZERO);
        assert_eq!(world.body_count(), 1);
        assert!(world.contains(body.id));
        assert!(world.remove_body(body.id));
        assert_eq!(world.body_count(), 0);
        assert!(!world.remove_body(body.id), "second removal is a no-op");
    }

    #[test]
    fn body_ids_are_unique() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = ball(&mut world, Vec2::ZERO);
        let b = ball(&mut world, Vec2::ZERO);
        assert_ne!(a.id, b.id);
        assert_eq!(world.filter(a.id).map(|f| f.id), Some(a.id));
    }

    #[test]
    fn gravity_affects_dynamic_body() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        world.set_dt(1.0 / 60.0);
        let body = ball(&mut world, Vec2::ZERO);
        for _ in 0..10 {
            world.step();
        }
        let (pos, _) = world.body_position(body.id).unwrap();
        assert!(pos.y > 0.0, "Body should fall: y={}", pos.y);
    }

    #[test]
    fn terrain_does_not_move() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        world.set_dt(1.0 / 60.0);
        let ground = world.create_terrain(
            &BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: 100.0,
                half_height: 10.0,
            })
            .with_position(Vec2::new(0.0, 500.0)),
            ColliderMaterial::default(),
        );
        for _ in 0..10 {
            world.step();
        }
        let (pos, _) = world.body_position(ground.id).unwrap();
        assert!((pos.y - 500.0).abs() < 0.001, "Fixed body should not move: y={}", pos.y);
    }

    #[test]
    fn shared_joint_suppresses_collision() {
        let joint = JointId(99);
        let f1 = CollisionFilter {
            joints: [joint].into_iter().collect(),
            ..CollisionFilter::part(BodyId(1), false)
        };
        let f2 = CollisionFilter {
            joints: [JointId(5), joint].into_iter().collect(),
            ..CollisionFilter::part(BodyId(2), false)
        };
        let f3 = CollisionFilter::part(BodyId(3), false);
        assert!(!can_collide(&f1, &f2));
        assert!(!can_collide(&f2, &f1));
        assert!(can_collide(&f1, &f3));
        assert!(!can_collide(&f1, &f1), "a body never collides with itself");
    }

    #[test]
    fn no_collide_parts_still_touch_terrain() {
        let ghost = CollisionFilter::part(BodyId(1), true);
        let solid = CollisionFilter::part(BodyId(2), false);
        let ground = CollisionFilter::terrain(BodyId(3));
        assert!(!can_collide(&ghost, &solid));
        assert!(can_collide(&ghost, &ground));
    }

    #[test]
    fn overlapping_bodies_separate_unless_joined() {
        let run = |join: bool| {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            world.set_dt(1.0 / 60.0);
            let a = ball(&mut world, Vec2::new(0.0, 0.0));
            let b = ball(&mut world, Vec2::new(5.0, 0.0));
            if join {
                for id in [a.id, b.id] {
                    world.filter_mut(id).unwrap().joints.insert(JointId(1));
                }
            }
            for _ in 0..30 {
                world.step();
            }
            let (pa, _) = world.body_position(a.id).unwrap();
            let (pb, _) = world.body_position(b.id).unwrap();
            pa.distance(pb)
        };
        assert!(run(false) > 6.0, "free bodies push apart");
        assert!((run(true) - 5.0).abs() < 0.01, "joined bodies ignore each other");
    }

    #[test]
    fn create_and_remove_joint() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = ball(&mut world, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(50.0, 0.0));
        let handle = world
            .create_joint(
                a.id,
                b.id,
                &JointDesc::Pin {
                    anchor_a: Vec2::new(25.0, 0.0),
                    anchor_b: Vec2::new(-25.0, 0.0),
                },
            )
            .unwrap();
        assert_eq!(world.joint_count(), 1);
        world.remove_joint(handle);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn joint_to_missing_body_is_none() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = ball(&mut world, Vec2::ZERO);
        let desc = JointDesc::Pin {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
        };
        assert!(world.create_joint(a.id, BodyId(404), &desc).is_none());
    }

    #[test]
    fn pin_joint_drags_partner() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);
        let a = ball(&mut world, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(40.0, 0.0));
        world.create_joint(
            a.id,
            b.id,
            &JointDesc::Pin {
                anchor_a: Vec2::new(20.0, 0.0),
                anchor_b: Vec2::new(-20.0, 0.0),
            },
        );
        world.apply_force(a.id, Vec2::new(0.0, 50000.0));
        for _ in 0..30 {
            world.step();
        }
        let (pa, _) = world.body_position(a.id).unwrap();
        let (pb, _) = world.body_position(b.id).unwrap();
        assert!(pb.y > 1.0, "partner should follow: y={}", pb.y);
        assert!((pa.distance(pb) - 40.0).abs() < 2.0, "pin keeps spacing: {}", pa.distance(pb));
    }

    #[test]
    fn world_to_local_respects_rotation() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world.create_body(
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 })
                .with_position(Vec2::new(10.0, 0.0))
                .with_rotation(std::f32::consts::FRAC_PI_2),
            ColliderMaterial::default(),
            false,
        );
        let local = world.world_to_local(body.id, Vec2::new(10.0, 5.0)).unwrap();
        assert!(local.distance(Vec2::new(5.0, 0.0)) < 1e-4, "local {local:?}");
    }

    #[test]
    fn torque_spins_and_reset_stops_it() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);
        let a = ball(&mut world, Vec2::ZERO);
        world.apply_torque(a.id, 1.0e6);
        world.step();
        let spinning = world.angular_velocity(a.id);
        assert!(spinning > 0.0, "angvel {spinning}");
        world.reset_forces(a.id);
        world.set_angular_velocity(a.id, 0.0);
        world.step();
        assert!(world.angular_velocity(a.id).abs() < 1e-4);
    }
}
