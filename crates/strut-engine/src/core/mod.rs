pub mod joints;
pub mod physics;
pub mod scene;
pub mod time;
