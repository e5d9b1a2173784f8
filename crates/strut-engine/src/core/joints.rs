//! The joint graph: which part anchors are pinned together, and the physics
//! constraints that realise each pin.
//!
//! Joints live in an arena keyed by [`JointId`]. Each body's
//! [`CollisionFilter`](crate::core::physics::CollisionFilter) holds the ids of
//! the joints it belongs to, so membership is recorded on both sides and
//! [`JointGraph::is_consistent`] can check them against each other.
//!
//! Whenever a joint's membership changes it is rebuilt from scratch by
//! [`JointGraph::reconnect`]: old constraints are dropped and one new
//! constraint is created from the first member (the pivot) to every other
//! member.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use glam::Vec2;

use crate::api::types::{AnchorId, BodyId, IdAllocator, JointId, PartId};
use crate::core::physics::{JointDesc, JointHandle, PhysicsWorld};
use crate::core::scene::PartSet;
use crate::persist::format::{Connection, SerializedJoint, SerializedPhysics};

/// One body's participation in a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointMember {
    pub body: BodyId,
    pub part: PartId,
    pub anchor: AnchorId,
}

/// N ≥ 2 bodies pinned at a shared world point. At most one member per body.
#[derive(Debug)]
pub struct Joint {
    pub id: JointId,
    pub members: Vec<JointMember>,
    constraints: Vec<JointHandle>,
}

impl Joint {
    fn new(id: JointId, members: Vec<JointMember>) -> Self {
        Self {
            id,
            members,
            constraints: Vec::new(),
        }
    }

    pub fn member(&self, body: BodyId) -> Option<&JointMember> {
        self.members.iter().find(|m| m.body == body)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

/// Where a new connection attaches: an existing joint, or a part anchor
/// (which joins that anchor's joint, or starts a new one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRef {
    Joint(JointId),
    Part { part: PartId, anchor: AnchorId },
}

/// Constraint tuning. `stiffness: None` pins rigidly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSettings {
    pub stiffness: Option<f32>,
    pub damping: f32,
}

impl Default for JointSettings {
    fn default() -> Self {
        Self {
            stiffness: None,
            damping: 0.0,
        }
    }
}

fn member_for(parts: &PartSet, part: PartId, anchor: AnchorId) -> Option<JointMember> {
    let p = parts.get(part)?;
    let body = p.body?;
    p.anchor_by_id(anchor)?;
    Some(JointMember {
        body: body.id,
        part,
        anchor,
    })
}

/// Arena of joints.
pub struct JointGraph {
    joints: BTreeMap<JointId, Joint>,
    settings: JointSettings,
}

impl JointGraph {
    pub fn new(settings: JointSettings) -> Self {
        Self {
            joints: BTreeMap::new(),
            settings,
        }
    }

    pub fn get(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// The joint holding a given part anchor.
    pub fn joint_at(&self, part: PartId, anchor: AnchorId) -> Option<JointId> {
        self.joints
            .values()
            .find(|j| j.members.iter().any(|m| m.part == part && m.anchor == anchor))
            .map(|j| j.id)
    }

    /// Anchors of `body` that are still part of some joint.
    pub fn connected_anchors(&self, physics: &PhysicsWorld, body: BodyId) -> Vec<AnchorId> {
        let Some(filter) = physics.filter(body) else {
            return Vec::new();
        };
        filter
            .joints
            .iter()
            .filter_map(|id| self.joints.get(id)?.member(body).map(|m| m.anchor))
            .collect()
    }

    /// Every part transitively connected to `seeds` through joints.
    /// The seeds themselves are included only when `include_self` is set.
    pub fn connected_objects(
        &self,
        parts: &PartSet,
        physics: &PhysicsWorld,
        seeds: &[PartId],
        include_self: bool,
    ) -> Vec<PartId> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut stack: Vec<PartId> = seeds.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            result.push(id);
            let Some(body) = parts.get(id).and_then(|p| p.body) else {
                continue;
            };
            let Some(filter) = physics.filter(body.id) else {
                continue;
            };
            for joint in filter.joints.iter().filter_map(|j| self.joints.get(j)) {
                stack.extend(
                    joint
                        .members
                        .iter()
                        .rev()
                        .filter(|m| !visited.contains(&m.part))
                        .map(|m| m.part),
                );
            }
        }
        if !include_self {
            result.retain(|id| !seeds.contains(id));
        }
        result
    }

    /// Pin `part`'s `anchor` onto `target`. Returns the joint it ended up in.
    pub fn stiff_connect(
        &mut self,
        parts: &mut PartSet,
        physics: &mut PhysicsWorld,
        ids: &mut IdAllocator,
        target: AnchorRef,
        part: PartId,
        anchor: AnchorId,
    ) -> Option<JointId> {
        let Some(incoming) = member_for(parts, part, anchor) else {
            log::warn!("cannot connect part {:?} anchor {}: no body or anchor", part, anchor);
            return None;
        };
        let joint_id = match target {
            AnchorRef::Joint(id) if self.joints.contains_key(&id) => id,
            AnchorRef::Joint(id) => {
                log::warn!("cannot connect to missing joint {:?}", id);
                return None;
            }
            AnchorRef::Part {
                part: other,
                anchor: other_anchor,
            } => match self.joint_at(other, other_anchor) {
                Some(id) => id,
                None => {
                    let Some(base) = member_for(parts, other, other_anchor) else {
                        log::warn!(
                            "cannot connect to part {:?} anchor {}: no body or anchor",
                            other,
                            other_anchor
                        );
                        return None;
                    };
                    if base.body == incoming.body {
                        log::warn!("refusing to connect part {:?} to itself", part);
                        return None;
                    }
                    let id = ids.next_joint();
                    self.joints.insert(id, Joint::new(id, vec![base]));
                    id
                }
            },
        };
        let joint = self.joints.get_mut(&joint_id)?;
        if joint.member(incoming.body).is_none() {
            joint.members.push(incoming);
        }
        self.reconnect(parts, physics, joint_id, None)
            .then_some(joint_id)
    }

    /// Rebuild every constraint of a joint at `point` (default: the pivot's
    /// anchor position). Returns false, tearing the joint down, when fewer
    /// than two live members remain or no anchor point can be resolved.
    pub fn reconnect(
        &mut self,
        parts: &mut PartSet,
        physics: &mut PhysicsWorld,
        id: JointId,
        point: Option<Vec2>,
    ) -> bool {
        let members = {
            let Some(joint) = self.joints.get_mut(&id) else {
                return false;
            };
            for handle in joint.constraints.drain(..) {
                physics.remove_joint(handle);
            }
            joint.members.retain(|m| {
                let alive = physics.contains(m.body) && parts.contains(m.part);
                if !alive {
                    log::warn!("joint {:?}: dropping dead member {:?}", id, m.part);
                }
                alive
            });
            joint.members.clone()
        };
        if members.len() < 2 {
            self.tear_down(parts, physics, id);
            return false;
        }
        let pivot = members[0];
        let point = point.or_else(|| {
            parts
                .get(pivot.part)?
                .anchor_by_id(pivot.anchor)
                .map(|a| a.pos)
        });
        let Some(point) = point else {
            log::warn!("joint {:?}: no resolvable anchor point", id);
            self.tear_down(parts, physics, id);
            return false;
        };

        for m in &members {
            if let Some(filter) = physics.filter_mut(m.body) {
                filter.joints.insert(id);
            }
            if let Some(part) = parts.get_mut(m.part) {
                part.on_connect(m.anchor);
            }
        }

        let mut constraints = Vec::with_capacity(members.len() - 1);
        for m in &members[1..] {
            let (Some(anchor_a), Some(anchor_b)) = (
                physics.world_to_local(pivot.body, point),
                physics.world_to_local(m.body, point),
            ) else {
                continue;
            };
            let desc = match self.settings.stiffness {
                None => JointDesc::Pin { anchor_a, anchor_b },
                Some(stiffness) => JointDesc::Spring {
                    anchor_a,
                    anchor_b,
                    stiffness,
                    damping: self.settings.damping,
                },
            };
            if let Some(handle) = physics.create_joint(pivot.body, m.body, &desc) {
                constraints.push(handle);
            }
        }
        if let Some(joint) = self.joints.get_mut(&id) {
            joint.constraints = constraints;
        }
        true
    }

    /// Remove a joint entirely, detaching whatever members remain.
    fn tear_down(&mut self, parts: &mut PartSet, physics: &mut PhysicsWorld, id: JointId) {
        let Some(joint) = self.joints.remove(&id) else {
            return;
        };
        for handle in joint.constraints {
            physics.remove_joint(handle);
        }
        for m in joint.members {
            if let Some(filter) = physics.filter_mut(m.body) {
                filter.joints.remove(&id);
            }
            let still = self.connected_anchors(physics, m.body);
            if let Some(part) = parts.get_mut(m.part) {
                part.on_disconnect(m.anchor, &still);
            }
        }
    }

    /// Remove one part anchor from its joint.
    pub fn detach(
        &mut self,
        parts: &mut PartSet,
        physics: &mut PhysicsWorld,
        part: PartId,
        anchor: AnchorId,
    ) -> bool {
        let Some(id) = self.joint_at(part, anchor) else {
            return false;
        };
        let Some(joint) = self.joints.get_mut(&id) else {
            return false;
        };
        let Some(idx) = joint
            .members
            .iter()
            .position(|m| m.part == part && m.anchor == anchor)
        else {
            return false;
        };
        let member = joint.members.remove(idx);
        if let Some(filter) = physics.filter_mut(member.body) {
            filter.joints.remove(&id);
        }
        self.reconnect(parts, physics, id, None);
        let still = self.connected_anchors(physics, member.body);
        if let Some(p) = parts.get_mut(part) {
            p.on_disconnect(anchor, &still);
        }
        true
    }

    /// Remove a body from every joint it belongs to. Joints left with a
    /// single member are torn down.
    pub fn delete_connections(
        &mut self,
        parts: &mut PartSet,
        physics: &mut PhysicsWorld,
        body: BodyId,
    ) {
        let Some(filter) = physics.filter(body) else {
            return;
        };
        let joint_ids: Vec<JointId> = filter.joints.iter().copied().collect();
        let mut removed = Vec::new();
        for id in joint_ids {
            if let Some(filter) = physics.filter_mut(body) {
                filter.joints.remove(&id);
            }
            let Some(joint) = self.joints.get_mut(&id) else {
                continue;
            };
            if let Some(idx) = joint.members.iter().position(|m| m.body == body) {
                removed.push(joint.members.remove(idx));
            }
            self.reconnect(parts, physics, id, None);
        }
        for m in removed {
            if let Some(part) = parts.get_mut(m.part) {
                part.on_disconnect(m.anchor, &[]);
            }
        }
    }

    /// Recreate among `to` the joints connecting `from`, where `to[i]` is the
    /// copy of `from[i]`. Joints touching only one copied body are skipped.
    pub fn clone_physics(
        &mut self,
        parts: &mut PartSet,
        physics: &mut PhysicsWorld,
        ids: &mut IdAllocator,
        from: &[PartId],
        to: &[PartId],
    ) -> usize {
        if from.len() != to.len() {
            log::warn!("clone_physics: {} originals but {} copies", from.len(), to.len());
            return 0;
        }
        let map: HashMap<PartId, PartId> = from.iter().copied().zip(to.iter().copied()).collect();
        let joint_ids: BTreeSet<JointId> = from
            .iter()
            .filter_map(|id| parts.get(*id)?.body)
            .filter_map(|body| physics.filter(body.id))
            .flat_map(|f| f.joints.iter().copied())
            .collect();

        let mut created = 0;
        for jid in joint_ids {
            let Some(joint) = self.joints.get(&jid) else {
                continue;
            };
            let mut members: Vec<JointMember> = Vec::new();
            for m in &joint.members {
                let Some(&copy) = map.get(&m.part) else {
                    continue;
                };
                let Some(member) = member_for(parts, copy, m.anchor) else {
                    log::warn!("clone_physics: copy {:?} has no body", copy);
                    continue;
                };
                if members.iter().all(|x| x.body != member.body) {
                    members.push(member);
                }
            }
            if members.len() < 2 {
                continue;
            }
            let id = ids.next_joint();
            self.joints.insert(id, Joint::new(id, members));
            if self.reconnect(parts, physics, id, None) {
                created += 1;
            }
        }
        created
    }

    /// Flatten the graph, keyed by part id.
    pub fn serialize_physics(&self) -> SerializedPhysics {
        self.serialize_physics_where(|_| true)
    }

    /// Flatten the graph, leaving out parts rejected by `keep`. Joints left
    /// with fewer than two connections are dropped.
    pub fn serialize_physics_where(&self, keep: impl Fn(PartId) -> bool) -> SerializedPhysics {
        let joints = self
            .joints
            .values()
            .filter_map(|joint| {
                let connections: Vec<Connection> = joint
                    .members
                    .iter()
                    .filter(|m| keep(m.part))
                    .map(|m| Connection {
                        obj_id: m.part,
                        anchor_id: m.anchor,
                    })
                    .collect();
                (connections.len() >= 2).then_some(SerializedJoint { connections })
            })
            .collect();
        SerializedPhysics { joints }
    }

    /// Rebuild joints from saved data. Unresolvable connections are logged
    /// and skipped. Returns the number of joints created.
    pub fn deserialize_physics(
        &mut self,
        parts: &mut PartSet,
        physics: &mut PhysicsWorld,
        ids: &mut IdAllocator,
        data: &SerializedPhysics,
    ) -> usize {
        let mut created = 0;
        for (i, saved) in data.joints.iter().enumerate() {
            let mut members: Vec<JointMember> = Vec::new();
            for c in &saved.connections {
                let Some(part) = parts.get(c.obj_id) else {
                    log::warn!("joint #{}: part {:?} not found", i, c.obj_id);
                    continue;
                };
                let Some(body) = part.body else {
                    log::warn!("joint #{}: part {:?} has no body", i, c.obj_id);
                    continue;
                };
                if part.anchor_by_id(c.anchor_id).is_none() {
                    log::warn!("joint #{}: part {:?} has no anchor {}", i, c.obj_id, c.anchor_id);
                    continue;
                }
                if members.iter().all(|m| m.body != body.id) {
                    members.push(JointMember {
                        body: body.id,
                        part: c.obj_id,
                        anchor: c.anchor_id,
                    });
                }
            }
            if members.len() < 2 {
                log::warn!("joint #{}: fewer than two resolvable connections, skipped", i);
                continue;
            }
            let id = ids.next_joint();
            self.joints.insert(id, Joint::new(id, members));
            if self.reconnect(parts, physics, id, None) {
                created += 1;
            }
        }
        created
    }

    /// Check both directions of the membership record: every joint has ≥2
    /// distinct bodies that list it, and every listed joint holds the body.
    pub fn is_consistent(&self, physics: &PhysicsWorld) -> bool {
        for joint in self.joints.values() {
            if joint.members.len() < 2 {
                return false;
            }
            let bodies: HashSet<BodyId> = joint.members.iter().map(|m| m.body).collect();
            if bodies.len() != joint.members.len() {
                return false;
            }
            let listed = joint
                .members
                .iter()
                .all(|m| physics.filter(m.body).is_some_and(|f| f.joints.contains(&joint.id)));
            if !listed {
                return false;
            }
        }
        physics.filters().all(|f| {
            f.joints
                .iter()
                .all(|j| self.joints.get(j).is_some_and(|joint| joint.member(f.id).is_some()))
        })
    }
}

impl Default for JointGraph {
    fn default() -> Self {
        Self::new(JointSettings::default())
    }
}
