//! Resize and rotate handles around the selection.

use glam::Vec2;

use crate::api::context::{ActiveDrag, DragKind, SceneContext};
use crate::api::types::PartId;
use crate::components::part::MIN_SIZE;
use crate::geometry::Frame;
use crate::input::{PointerButton, PointerEvent};
#[cfg(feature = "overlay")]
use crate::systems::overlay::{OverlayBuffer, OverlayColor};
use crate::tools::{Propagation, Tool};

/// Distance of the rotate handle above the frame, in handle radii.
const ROTATE_HANDLE_OFFSET: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Handle {
    /// Corner index into [`Frame::corners`].
    Corner(usize),
    Rotate,
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Resize {
        start: Frame,
        /// World position of the corner opposite the grabbed one.
        fixed: Vec2,
        last: Frame,
    },
    Rotate {
        center: Vec2,
        start_angle: f32,
        applied: f32,
    },
}

pub struct ControlsTool {
    gesture: Option<Gesture>,
    moved: bool,
}

impl ControlsTool {
    pub fn new() -> Self {
        Self {
            gesture: None,
            moved: false,
        }
    }

    /// The box the handles sit on: the part's own rotated frame for a
    /// single selection, the union of bounds otherwise.
    fn selection_frame(ctx: &SceneContext) -> Option<Frame> {
        match ctx.selected() {
            [] => None,
            [only] => ctx.parts.get(*only).map(|p| p.frame()),
            many => ctx.bounds_of(many).map(|b| Frame::from_bounds(&b)),
        }
    }

    fn rotate_handle(ctx: &SceneContext, frame: &Frame) -> Vec2 {
        let offset = ctx.pick_radius(ctx.config.handle_radius) * ROTATE_HANDLE_OFFSET;
        frame.to_world(Vec2::new(0.0, -frame.half.y - offset))
    }

    fn handle_at(ctx: &SceneContext, frame: &Frame, p: Vec2) -> Option<Handle> {
        let r = ctx.pick_radius(ctx.config.handle_radius);
        if let Some(i) = frame.corners().iter().position(|c| c.distance(p) <= r) {
            return Some(Handle::Corner(i));
        }
        (Self::rotate_handle(ctx, frame).distance(p) <= r).then_some(Handle::Rotate)
    }

    fn resize(
        ctx: &mut SceneContext,
        ids: &[PartId],
        start: &Frame,
        fixed: Vec2,
        last: &Frame,
        p: Vec2,
    ) -> Frame {
        let fixed_local = start.to_local(fixed);
        let p_local = start.to_local(p);
        let half = ((p_local - fixed_local).abs() * 0.5).max(Vec2::splat(MIN_SIZE * 0.5));
        let center = start.to_world((p_local + fixed_local) * 0.5);
        let next = Frame::new(center, half, start.rotation);
        for id in ids {
            if let Some(part) = ctx.parts.get_mut(*id) {
                part.mutate_bounds(&next, last);
                part.push_to_physics(&mut ctx.physics);
            }
        }
        next
    }

    fn rotate(ctx: &mut SceneContext, ids: &[PartId], center: Vec2, angle: f32) {
        for id in ids {
            if let Some(part) = ctx.parts.get_mut(*id) {
                part.rotate_about(center, angle);
                part.push_to_physics(&mut ctx.physics);
            }
        }
    }
}

impl Default for ControlsTool {
    fn default() -> Self {
        Self::new()
    }
}

fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

impl Tool for ControlsTool {
    fn name(&self) -> &'static str {
        "controls"
    }

    fn pointer_down(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button != PointerButton::Left || !e.pressed || ctx.is_running() {
            return Propagation::Continue;
        }
        let Some(frame) = Self::selection_frame(ctx) else {
            return Propagation::Continue;
        };
        let gesture = match Self::handle_at(ctx, &frame, e.world) {
            Some(Handle::Corner(i)) => Gesture::Resize {
                start: frame,
                fixed: frame.corners()[(i + 2) % 4],
                last: frame,
            },
            Some(Handle::Rotate) => Gesture::Rotate {
                center: frame.center,
                start_angle: angle_of(e.world - frame.center),
                applied: 0.0,
            },
            None => return Propagation::Continue,
        };
        self.gesture = Some(gesture);
        self.moved = false;
        ctx.active_drag = Some(ActiveDrag::new(DragKind::Handle, e.world));
        Propagation::Stop
    }

    fn pointer_move(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let Some(gesture) = self.gesture.as_mut() else {
            return Propagation::Continue;
        };
        let ids = ctx.selected().to_vec();
        match gesture {
            Gesture::Resize { start, fixed, last } => {
                let p = ctx.snap(e.world);
                *last = Self::resize(ctx, &ids, start, *fixed, last, p);
            }
            Gesture::Rotate {
                center,
                start_angle,
                applied,
            } => {
                let angle = ctx.snap_angle(angle_of(e.world - *center) - *start_angle);
                Self::rotate(ctx, &ids, *center, angle - *applied);
                *applied = angle;
            }
        }
        self.moved = true;
        if let Some(drag) = ctx.active_drag.as_mut() {
            drag.last = e.world;
            drag.moved = true;
        }
        ctx.mark_dirty();
        Propagation::Stop
    }

    fn pointer_up(&mut self, ctx: &mut SceneContext, _e: &PointerEvent) -> Propagation {
        if self.gesture.take().is_none() {
            return Propagation::Continue;
        }
        ctx.active_drag = None;
        if std::mem::take(&mut self.moved) {
            ctx.rebuild_parts();
        }
        Propagation::Stop
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        let Some(frame) = Self::selection_frame(ctx) else {
            return;
        };
        let width = 1.0 / ctx.camera.zoom;
        let r = ctx.pick_radius(ctx.config.handle_radius) * 0.5;
        let corners = frame.corners();
        out.stroke_polygon(&corners, width, OverlayColor::HANDLE);
        for c in corners {
            out.fill_circle(c, r, OverlayColor::HANDLE);
        }
        let top = frame.to_world(Vec2::new(0.0, -frame.half.y));
        let knob = Self::rotate_handle(ctx, &frame);
        out.stroke_polyline(&[top, knob], width, OverlayColor::HANDLE);
        out.stroke_circle(knob, r, width, OverlayColor::HANDLE);
    }

    fn destroy(&mut self, ctx: &mut SceneContext) {
        if self.gesture.take().is_some() {
            ctx.active_drag = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::api::config::SandboxConfig;
    use crate::api::types::SceneKind;
    use crate::components::part::Part;
    use crate::geometry::Bounds;

    fn ctx_with_square() -> (SceneContext, PartId) {
        let mut ctx = SceneContext::new(SceneKind::Editor, SandboxConfig::default());
        let id = ctx.ids.next_part();
        ctx.insert_part(Part::rect(id, Bounds::from_corners(Vec2::ZERO, Vec2::splat(20.0))));
        ctx.set_selected(vec![id]);
        (ctx, id)
    }

    fn drag(tool: &mut ControlsTool, ctx: &mut SceneContext, from: Vec2, to: Vec2) -> Propagation {
        let down = tool.pointer_down(ctx, &PointerEvent::at(from));
        tool.pointer_move(ctx, &PointerEvent::at(to));
        tool.pointer_up(ctx, &PointerEvent::at(to));
        down
    }

    #[test]
    fn corner_resize_keeps_opposite_corner() {
        let (mut ctx, id) = ctx_with_square();
        let mut tool = ControlsTool::new();
        let result = drag(&mut tool, &mut ctx, Vec2::splat(20.0), Vec2::new(40.0, 30.0));
        assert_eq!(result, Propagation::Stop);
        let part = ctx.parts.get(id).unwrap();
        assert!(part.pos.distance(Vec2::new(20.0, 15.0)) < 1e-4, "{:?}", part.pos);
        assert!((part.width - 40.0).abs() < 1e-4);
        assert!((part.height - 30.0).abs() < 1e-4);
        assert!(ctx.active_drag.is_none());
    }

    #[test]
    fn rotate_handle_turns_selection() {
        let (mut ctx, id) = ctx_with_square();
        let mut tool = ControlsTool::new();
        drag(&mut tool, &mut ctx, Vec2::new(10.0, -24.0), Vec2::new(34.0, 10.0));
        let part = ctx.parts.get(id).unwrap();
        assert!((part.rotation - FRAC_PI_2).abs() < 1e-4, "rotation {}", part.rotation);
        assert!(part.pos.distance(Vec2::splat(10.0)) < 1e-4);
    }

    #[test]
    fn rotation_snaps_when_grid_is_on() {
        let (mut ctx, id) = ctx_with_square();
        ctx.set_grid_snapping(true);
        let mut tool = ControlsTool::new();
        let target = Vec2::splat(10.0) + Vec2::from_angle(-FRAC_PI_2 + 0.3) * 34.0;
        drag(&mut tool, &mut ctx, Vec2::new(10.0, -24.0), target);
        let step = ctx.config.angle_snap;
        let rotation = ctx.parts.get(id).unwrap().rotation;
        assert!((rotation - 2.0 * step).abs() < 1e-4, "rotation {rotation}");
    }

    #[test]
    fn group_rotates_about_collective_center() {
        let (mut ctx, a) = ctx_with_square();
        let b = ctx.ids.next_part();
        ctx.insert_part(Part::rect(
            b,
            Bounds::from_corners(Vec2::new(40.0, 0.0), Vec2::new(60.0, 20.0)),
        ));
        ctx.set_selected(vec![a, b]);
        let mut tool = ControlsTool::new();
        // union box is (0,0)-(60,20); its rotate knob sits above the center
        drag(&mut tool, &mut ctx, Vec2::new(30.0, -24.0), Vec2::new(64.0, 10.0));
        assert!(ctx.parts.get(a).unwrap().pos.distance(Vec2::new(30.0, -10.0)) < 1e-3);
        assert!(ctx.parts.get(b).unwrap().pos.distance(Vec2::new(30.0, 30.0)) < 1e-3);
    }

    #[test]
    fn ignores_presses_off_the_handles() {
        let (mut ctx, _) = ctx_with_square();
        let mut tool = ControlsTool::new();
        let result = tool.pointer_down(&mut ctx, &PointerEvent::at(Vec2::splat(10.0)));
        assert_eq!(result, Propagation::Continue);
        assert!(ctx.active_drag.is_none());
    }
}
