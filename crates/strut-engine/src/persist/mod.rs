pub mod autosave;
pub mod format;
pub mod store;

pub use autosave::Autosave;
pub use format::{Connection, MapData, SerializedJoint, SerializedPart, SerializedPhysics};
pub use store::{BuildStore, MemoryStore, StoreError};
