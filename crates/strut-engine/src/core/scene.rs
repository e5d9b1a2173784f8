use crate::api::types::{BodyId, PartId};
use crate::components::part::Part;
use crate::geometry::{intersects, Geom};

/// Part storage using a flat Vec.
/// Insertion order is preserved: among equal `z_index` values, later parts
/// draw on top.
pub struct PartSet {
    parts: Vec<Part>,
}

impl PartSet {
    pub fn new() -> Self {
        Self {
            parts: Vec::with_capacity(128),
        }
    }

    /// Add a part on top of the others.
    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Remove a part by ID, keeping the order of the rest.
    pub fn remove(&mut self, id: PartId) -> Option<Part> {
        let idx = self.parts.iter().position(|p| p.id == id)?;
        Some(self.parts.remove(idx))
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.get(id).is_some()
    }

    /// The part owning a physics body.
    pub fn by_body(&self, body: BodyId) -> Option<&Part> {
        self.parts
            .iter()
            .find(|p| p.body.is_some_and(|b| b.id == body))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Part> {
        self.parts.iter_mut()
    }

    /// All part ids in insertion order.
    pub fn ids(&self) -> Vec<PartId> {
        self.parts.iter().map(|p| p.id).collect()
    }

    /// Part ids bottom to top: by `z_index`, then insertion order.
    pub fn z_order(&self) -> Vec<PartId> {
        let mut order: Vec<(i32, usize, PartId)> = self
            .parts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.z_index, i, p.id))
            .collect();
        order.sort();
        order.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Parts whose geometry intersects `geom`, bottom to top.
    pub fn intersecting(&self, geom: &Geom) -> Vec<PartId> {
        self.z_order()
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|p| intersects(&p.geom(), geom)))
            .collect()
    }

    /// Largest part id in the set.
    pub fn max_id(&self) -> Option<PartId> {
        self.parts.iter().map(|p| p.id).max()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Default for PartSet {
    fn default() -> Self {
        Self::new()
    }
}
