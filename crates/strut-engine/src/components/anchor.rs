use glam::Vec2;

use crate::api::types::AnchorId;

/// A connection point on a part, in world space.
///
/// Anchors are not stored anywhere: a part computes its list on demand, in a
/// fixed per-type order where the list index is the anchor id. Saved joints
/// reference anchors only by that id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pos: Vec2,
    pub id: AnchorId,
}

impl Anchor {
    pub fn new(id: AnchorId, pos: Vec2) -> Self {
        Self { pos, id }
    }
}

/// Number a point list into anchors, in order.
pub fn numbered(points: impl IntoIterator<Item = Vec2>) -> Vec<Anchor> {
    points
        .into_iter()
        .enumerate()
        .map(|(i, pos)| Anchor::new(i as AnchorId, pos))
        .collect()
}

/// First anchor within `dist` of `p`. Compares squared distances.
pub fn first_within(anchors: &[Anchor], p: Vec2, dist: f32) -> Option<Anchor> {
    let max_sq = dist * dist;
    anchors
        .iter()
        .find(|a| a.pos.distance_squared(p) <= max_sq)
        .copied()
}
