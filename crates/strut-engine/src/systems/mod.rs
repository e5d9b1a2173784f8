pub mod actuators;
#[cfg(feature = "overlay")]
pub mod overlay;
