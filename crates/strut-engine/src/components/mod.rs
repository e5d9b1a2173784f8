pub mod anchor;
pub mod part;

pub use anchor::Anchor;
pub use part::{Part, PartKind, PartType, ThrusterState, WheelState, MIN_LENGTH};
