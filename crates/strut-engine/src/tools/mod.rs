//! Editing tools. Each tool is a small state machine over pointer
//! down/move/up; the [`ToolManager`](manager::ToolManager) runs an ordered
//! chain of them and stops at the first tool that returns
//! [`Propagation::Stop`].

pub mod box_select;
pub mod controls;
pub mod drag;
pub mod manager;
pub mod pan;
pub mod place;
pub mod points;

use glam::Vec2;

use crate::api::context::SceneContext;
use crate::input::{Key, PointerEvent};
#[cfg(feature = "overlay")]
use crate::systems::overlay::OverlayBuffer;

pub use manager::{tool_chain, ToolManager, ToolSlot};

/// Whether later tools in the chain still see an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

/// An interaction handler. Every hook defaults to doing nothing.
pub trait Tool {
    fn name(&self) -> &'static str;

    fn pointer_down(&mut self, _ctx: &mut SceneContext, _e: &PointerEvent) -> Propagation {
        Propagation::Continue
    }

    fn pointer_move(&mut self, _ctx: &mut SceneContext, _e: &PointerEvent) -> Propagation {
        Propagation::Continue
    }

    fn pointer_up(&mut self, _ctx: &mut SceneContext, _e: &PointerEvent) -> Propagation {
        Propagation::Continue
    }

    fn key_down(&mut self, _ctx: &mut SceneContext, _key: Key) -> Propagation {
        Propagation::Continue
    }

    /// Scroll at a screen position.
    fn wheel(&mut self, _ctx: &mut SceneContext, _screen: Vec2, _delta: f32) -> Propagation {
        Propagation::Continue
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, _ctx: &SceneContext, _out: &mut OverlayBuffer) {}

    /// Release any state. Called once, when the chain is torn down; may
    /// still edit the scene (e.g. commit a pending polygon).
    fn destroy(&mut self, _ctx: &mut SceneContext) {}
}
