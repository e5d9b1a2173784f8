use glam::Vec2;

use crate::api::context::SceneContext;
use crate::input::{PointerButton, PointerEvent};
use crate::tools::{Propagation, Tool};

/// Pans with the middle button (any button when it is the whole chain) and
/// zooms on scroll.
pub struct PanTool {
    any_button: bool,
    last: Option<Vec2>,
}

impl PanTool {
    pub fn new(any_button: bool) -> Self {
        Self {
            any_button,
            last: None,
        }
    }

    pub fn is_panning(&self) -> bool {
        self.last.is_some()
    }
}

impl Tool for PanTool {
    fn name(&self) -> &'static str {
        "pan"
    }

    fn pointer_down(&mut self, _ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let grabs = e.button == PointerButton::Middle
            || (self.any_button && e.button == PointerButton::Left);
        if grabs {
            self.last = Some(e.screen);
            return Propagation::Stop;
        }
        Propagation::Continue
    }

    fn pointer_move(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let Some(last) = self.last else {
            return Propagation::Continue;
        };
        ctx.camera.pan_by_screen(e.screen - last);
        self.last = Some(e.screen);
        Propagation::Stop
    }

    fn pointer_up(&mut self, _ctx: &mut SceneContext, _e: &PointerEvent) -> Propagation {
        if self.last.take().is_some() {
            Propagation::Stop
        } else {
            Propagation::Continue
        }
    }

    fn wheel(&mut self, ctx: &mut SceneContext, screen: Vec2, delta: f32) -> Propagation {
        ctx.camera.zoom_at(screen, (-delta * 0.001).exp());
        Propagation::Stop
    }

    fn destroy(&mut self, _ctx: &mut SceneContext) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::SandboxConfig;
    use crate::api::types::SceneKind;

    fn ctx() -> SceneContext {
        SceneContext::new(SceneKind::Editor, SandboxConfig::default())
    }

    #[test]
    fn middle_drag_pans() {
        let mut ctx = ctx();
        let mut pan = PanTool::new(false);
        let e = PointerEvent::at(Vec2::ZERO).with_button(PointerButton::Middle);
        assert_eq!(pan.pointer_down(&mut ctx, &e), Propagation::Stop);
        let moved = PointerEvent {
            screen: Vec2::new(30.0, 0.0),
            ..e
        };
        pan.pointer_move(&mut ctx, &moved);
        assert_eq!(ctx.camera.center, Vec2::new(-30.0, 0.0));
        assert_eq!(pan.pointer_up(&mut ctx, &moved), Propagation::Stop);
        assert!(!pan.is_panning());
    }

    #[test]
    fn left_button_passes_through_unless_alone() {
        let mut ctx = ctx();
        let e = PointerEvent::at(Vec2::ZERO);
        assert_eq!(PanTool::new(false).pointer_down(&mut ctx, &e), Propagation::Continue);
        assert_eq!(PanTool::new(true).pointer_down(&mut ctx, &e), Propagation::Stop);
    }

    #[test]
    fn scroll_zooms() {
        let mut ctx = ctx();
        let mut pan = PanTool::new(false);
        pan.wheel(&mut ctx, Vec2::new(640.0, 360.0), -500.0);
        assert!(ctx.camera.zoom > 1.0);
    }
}
