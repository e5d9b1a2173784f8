//! Whole-part and strut-endpoint dragging.
//!
//! A part drag moves the connected component of the grabbed part (or of the
//! selection, when the grabbed part is selected). An endpoint drag detaches
//! one strut end from its joint and moves just that end. Either way a drag
//! that moved anything ends with a full rebuild of the scene's parts, which
//! recreates bodies and collision filters from the saved form.

use glam::Vec2;

use crate::api::context::{ActiveDrag, DragKind, SceneContext};
use crate::api::types::{AnchorId, PartId};
use crate::components::part::PartType;
use crate::input::{PointerButton, PointerEvent};
#[cfg(feature = "overlay")]
use crate::systems::overlay::{OverlayBuffer, OverlayColor};
use crate::tools::{Propagation, Tool};

pub struct DragTool {
    /// Offset already applied to the dragged parts.
    applied: Vec2,
}

impl DragTool {
    pub fn new() -> Self {
        Self {
            applied: Vec2::ZERO,
        }
    }

    /// The topmost strut endpoint under `p`, if any.
    fn endpoint_at(ctx: &SceneContext, p: Vec2) -> Option<(PartId, AnchorId)> {
        let others: Vec<PartId> = ctx
            .parts
            .iter()
            .filter(|part| part.part_type() != PartType::Line)
            .map(|part| part.id)
            .collect();
        ctx.find_anchor(p, &others).map(|(part, a)| (part, a.id))
    }

    fn begin(&mut self, ctx: &mut SceneContext, p: Vec2) -> bool {
        self.applied = Vec2::ZERO;
        if let Some((part, anchor)) = Self::endpoint_at(ctx, p) {
            ctx.active_drag = Some(ActiveDrag::new(DragKind::Endpoint { part, anchor }, p));
            return true;
        }
        let Some(hit) = ctx.topmost_part_at(p) else {
            return false;
        };
        let seeds = if ctx.selected().contains(&hit) {
            ctx.selected().to_vec()
        } else {
            vec![hit]
        };
        let group = ctx
            .joints
            .connected_objects(&ctx.parts, &ctx.physics, &seeds, true);
        ctx.active_drag = Some(ActiveDrag::new(DragKind::Parts(group), p));
        true
    }

    /// Drop a dragged endpoint, snapping it onto a nearby accepting anchor.
    fn drop_endpoint(ctx: &mut SceneContext, part: PartId, anchor: AnchorId, p: Vec2) {
        let target = ctx.find_anchor(p, &[part]).filter(|(other, a)| {
            ctx.parts
                .get(*other)
                .is_some_and(|o| o.accepts(a.id, PartType::Line))
        });
        let end = target.map_or_else(|| ctx.snap(p), |(_, a)| a.pos);
        if let Some(strut) = ctx.parts.get_mut(part) {
            strut.set_endpoint(anchor, end);
            strut.push_to_physics(&mut ctx.physics);
        }
        if let Some((other, a)) = target {
            ctx.connect((other, a.id), part, anchor);
        }
    }
}

impl Default for DragTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for DragTool {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn pointer_down(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button == PointerButton::Left && e.pressed && ctx.active_drag.is_none() {
            self.begin(ctx, e.world);
        }
        Propagation::Continue
    }

    fn pointer_move(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let threshold = ctx.pick_radius(ctx.config.click_epsilon);
        let Some(drag) = ctx.active_drag.as_mut() else {
            return Propagation::Continue;
        };
        if !e.pressed {
            ctx.active_drag = None;
            return Propagation::Continue;
        }
        drag.last = e.world;
        if !drag.moved && drag.origin.distance(e.world) <= threshold {
            return Propagation::Continue;
        }
        let first_move = !drag.moved;
        drag.moved = true;
        let origin = drag.origin;
        match drag.kind.clone() {
            DragKind::Parts(ids) => {
                let total = ctx.snap(e.world - origin);
                let delta = total - self.applied;
                self.applied = total;
                ctx.move_parts(&ids, delta);
            }
            DragKind::Endpoint { part, anchor } => {
                if first_move {
                    ctx.joints
                        .detach(&mut ctx.parts, &mut ctx.physics, part, anchor);
                }
                let end = ctx.snap(e.world);
                if let Some(strut) = ctx.parts.get_mut(part) {
                    strut.set_endpoint(anchor, end);
                    strut.push_to_physics(&mut ctx.physics);
                }
            }
            DragKind::Handle => return Propagation::Continue,
        }
        ctx.mark_dirty();
        Propagation::Continue
    }

    fn pointer_up(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let Some(drag) = ctx.active_drag.take_if(|d| !matches!(d.kind, DragKind::Handle)) else {
            return Propagation::Continue;
        };
        self.applied = Vec2::ZERO;
        if !drag.moved {
            return Propagation::Continue;
        }
        if let DragKind::Endpoint { part, anchor } = drag.kind {
            Self::drop_endpoint(ctx, part, anchor, e.world);
        }
        ctx.rebuild_parts();
        ctx.mark_dirty();
        Propagation::Stop
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        let r = ctx.pick_radius(ctx.config.anchor_radius) * 0.5;
        match ctx.active_drag.as_ref().map(|d| &d.kind) {
            Some(DragKind::Endpoint { part, anchor }) => {
                if let Some(a) = ctx.parts.get(*part).and_then(|p| p.anchor_by_id(*anchor)) {
                    out.fill_circle(a.pos, r, OverlayColor::ANCHOR);
                }
            }
            Some(_) => {}
            None => {
                for id in ctx.selected() {
                    let Some(part) = ctx.parts.get(*id) else {
                        continue;
                    };
                    for a in part.anchors() {
                        out.stroke_circle(a.pos, r, 1.0 / ctx.camera.zoom, OverlayColor::ANCHOR);
                    }
                }
            }
        }
    }

    fn destroy(&mut self, ctx: &mut SceneContext) {
        if ctx
            .active_drag
            .as_ref()
            .is_some_and(|d| !matches!(d.kind, DragKind::Handle))
        {
            ctx.active_drag = None;
        }
    }
}
