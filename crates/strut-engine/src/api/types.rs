use serde::{Deserialize, Serialize};

/// Unique identifier of a placed part. Persisted in saves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub u32);

/// Unique identifier of a joint. Drawn from the same counter as [`PartId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub u32);

/// Identifier of a rigid body inside the physics world.
/// Ephemeral: never persisted, reassigned whenever a body is recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Index of a connection point within a part's anchor list.
pub type AnchorId = u32;

/// Monotonic id source shared by parts and joints.
///
/// After loading persisted data, call [`IdAllocator::advance_past`] with the
/// largest loaded id so restored and new entities never collide.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    fn take(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Allocate the next part id.
    pub fn next_part(&mut self) -> PartId {
        PartId(self.take())
    }

    /// Allocate the next joint id.
    pub fn next_joint(&mut self) -> JointId {
        JointId(self.take())
    }

    /// Ensure every future id is strictly greater than `id`.
    pub fn advance_past(&mut self, id: u32) {
        if id >= self.next {
            self.next = id + 1;
        }
    }

    /// The id the next allocation will return.
    pub fn peek(&self) -> u32 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Which navigation target a scene was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneKind {
    /// Level editor: terrain, goals and build zones are editable.
    #[default]
    Editor,
    /// Play mode: the player builds a contraption inside the build zone.
    Play,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_and_joints_share_one_counter() {
        let mut ids = IdAllocator::new();
        let a = ids.next_part();
        let j = ids.next_joint();
        let b = ids.next_part();
        assert_eq!(a, PartId(1));
        assert_eq!(j, JointId(2));
        assert_eq!(b, PartId(3));
    }

    #[test]
    fn advance_past_skips_loaded_ids() {
        let mut ids = IdAllocator::new();
        ids.advance_past(41);
        assert_eq!(ids.next_part(), PartId(42));
    }

    #[test]
    fn advance_past_never_moves_backwards() {
        let mut ids = IdAllocator::new();
        ids.advance_past(10);
        ids.advance_past(3);
        assert_eq!(ids.peek(), 11);
    }
}
