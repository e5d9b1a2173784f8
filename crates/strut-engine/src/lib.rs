pub mod api;
pub mod core;
pub mod components;
pub mod geometry;
pub mod input;
pub mod persist;
pub mod renderer;
pub mod systems;
pub mod tools;

// Re-export key types at crate root for convenience
pub use api::config::SandboxConfig;
pub use api::context::{ActiveDrag, DragKind, PointEdit, SceneContext};
pub use api::events::{EventBus, ListenerId, SceneEvent};
pub use api::host::{LoadTicket, SceneHost, SceneParams};
pub use api::types::{AnchorId, BodyId, IdAllocator, JointId, PartId, SceneKind};
pub use components::{Anchor, Part, PartKind, PartType};
pub use core::joints::{AnchorRef, Joint, JointGraph, JointSettings};
pub use core::physics::{can_collide, CollisionFilter, PhysicsBody, PhysicsWorld};
pub use core::scene::PartSet;
pub use core::time::FixedTimestep;
pub use geometry::{intersects, Bounds, Frame, Geom, GeomKind};
pub use input::{InputEvent, InputQueue, Key, Modifiers, PointerButton, PointerEvent};
pub use persist::{
    Autosave, BuildStore, MapData, MemoryStore, SerializedPart, SerializedPhysics, StoreError,
};
pub use renderer::camera::Camera2D;
pub use tools::{Propagation, Tool, ToolManager};

#[cfg(feature = "overlay")]
pub use systems::overlay::{OverlayBuffer, OverlayColor, OverlayVertex};
