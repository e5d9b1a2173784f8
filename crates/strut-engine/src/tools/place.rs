//! Placement of new parts: the shared validity check plus the click tools
//! for wheels, thrusters and struts.

use glam::Vec2;

use crate::api::context::SceneContext;
use crate::api::types::{AnchorId, PartId};
use crate::components::part::{Part, PartType, DEFAULT_THRUSTER_SIZE, DEFAULT_WHEEL_RADIUS};
use crate::input::{Key, PointerButton, PointerEvent};
#[cfg(feature = "overlay")]
use crate::systems::overlay::{OverlayBuffer, OverlayColor};
use crate::tools::{Propagation, Tool};

/// One anchor of a new part pinned onto an existing part's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub own: AnchorId,
    pub target: (PartId, AnchorId),
}

/// Why a placement was refused. Each maps to a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooMany,
    TooSmall,
    BadAnchor,
    Overlap,
}

/// Check a placement without changing the scene. Overlap with the parts
/// being attached to is allowed.
pub fn check_placement(
    ctx: &SceneContext,
    part: &Part,
    attachments: &[Attachment],
) -> Result<(), Rejection> {
    if ctx.parts.len() >= ctx.config.max_parts {
        return Err(Rejection::TooMany);
    }
    if !part.has_valid_size() {
        return Err(Rejection::TooSmall);
    }
    let ty = part.part_type();
    for a in attachments {
        let ok = ctx.parts.get(a.target.0).is_some_and(|t| {
            t.body.is_some() && t.accepts(a.target.1, ty) && part.accepts(a.own, t.part_type())
        });
        if !ok {
            return Err(Rejection::BadAnchor);
        }
    }
    let ignore: Vec<PartId> = attachments.iter().map(|a| a.target.0).collect();
    if part.is_solid() && ctx.overlaps_solid(&part.geom(), &ignore) {
        return Err(Rejection::Overlap);
    }
    Ok(())
}

/// Validate, insert with a fresh id and connect. A refused placement
/// flashes a message and changes nothing else.
pub fn try_place(
    ctx: &mut SceneContext,
    mut part: Part,
    attachments: &[Attachment],
) -> Option<PartId> {
    if let Err(rejection) = check_placement(ctx, &part, attachments) {
        let message = match rejection {
            Rejection::TooMany => format!("Part limit reached ({})", ctx.config.max_parts),
            Rejection::TooSmall => "Too small to place".to_string(),
            Rejection::BadAnchor => "Can't attach there".to_string(),
            Rejection::Overlap => "Parts can't overlap".to_string(),
        };
        ctx.flash(message);
        return None;
    }
    part.id = ctx.ids.next_part();
    let id = ctx.insert_part(part);
    for a in attachments {
        if !ctx.connect(a.target, id, a.own) {
            log::warn!("placed part {:?} but could not attach anchor {}", id, a.own);
        }
    }
    Some(id)
}

/// Resolve a pointer position: onto a nearby anchor if there is one,
/// otherwise onto the grid.
fn resolve(ctx: &SceneContext, p: Vec2, ignore: &[PartId]) -> (Vec2, Option<(PartId, AnchorId)>) {
    match ctx.find_anchor(p, ignore) {
        Some((part, anchor)) => (anchor.pos, Some((part, anchor.id))),
        None => (ctx.snap(p), None),
    }
}

// ---------------------------------------------------------------------------
// PlaceTool
// ---------------------------------------------------------------------------

/// Click to drop a wheel or thruster. Clicking on an anchor pins the new
/// part's center there.
pub struct PlaceTool {
    ty: PartType,
    cursor: Option<Vec2>,
}

impl PlaceTool {
    pub fn new(ty: PartType) -> Self {
        Self { ty, cursor: None }
    }

    fn build(&self, center: Vec2) -> Option<Part> {
        match self.ty {
            PartType::Wheel => Some(Part::wheel(PartId::default(), center, DEFAULT_WHEEL_RADIUS)),
            PartType::Thruster => Some(Part::thruster(
                PartId::default(),
                center,
                DEFAULT_THRUSTER_SIZE,
            )),
            _ => None,
        }
    }

    fn pending(&self, ctx: &SceneContext, p: Vec2) -> Option<(Part, Vec<Attachment>)> {
        let (center, target) = resolve(ctx, p, &[]);
        let part = self.build(center)?;
        let attachments = target
            .map(|target| Attachment { own: 0, target })
            .into_iter()
            .collect();
        Some((part, attachments))
    }
}

impl Tool for PlaceTool {
    fn name(&self) -> &'static str {
        "place"
    }

    fn pointer_down(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button != PointerButton::Left {
            return Propagation::Continue;
        }
        match self.pending(ctx, e.world) {
            Some((part, attachments)) => {
                try_place(ctx, part, &attachments);
            }
            None => log::warn!("place tool has no constructor for {:?}", self.ty),
        }
        Propagation::Stop
    }

    fn pointer_move(&mut self, _ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        self.cursor = Some(e.world);
        Propagation::Continue
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        let Some((part, attachments)) = self.cursor.and_then(|p| self.pending(ctx, p)) else {
            return;
        };
        let color = match check_placement(ctx, &part, &attachments) {
            Ok(()) => OverlayColor::SELECTION,
            Err(_) => OverlayColor::INVALID,
        };
        out.stroke_geom(&part.geom(), 2.0 / ctx.camera.zoom, color);
    }

    fn destroy(&mut self, _ctx: &mut SceneContext) {
        self.cursor = None;
    }
}

// ---------------------------------------------------------------------------
// LineTool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingStrut {
    start: Vec2,
    start_anchor: Option<(PartId, AnchorId)>,
    /// Button still held since the press that started this strut.
    held: bool,
    /// The pointer travelled while held: release commits (drag mode).
    dragged: bool,
}

/// Struts: press-drag-release places one; click, click places one and
/// chains the next from its far end. Escape drops the pending strut.
pub struct LineTool {
    pending: Option<PendingStrut>,
    cursor: Vec2,
}

impl LineTool {
    pub fn new() -> Self {
        Self {
            pending: None,
            cursor: Vec2::ZERO,
        }
    }

    fn preview(
        &self,
        ctx: &SceneContext,
        pending: &PendingStrut,
        end: Vec2,
    ) -> (Part, Vec<Attachment>) {
        let ignore: Vec<PartId> = pending.start_anchor.map(|(p, _)| p).into_iter().collect();
        let (end, end_anchor) = resolve(ctx, end, &ignore);
        let part = Part::line(PartId::default(), pending.start, end);
        let mut attachments = Vec::with_capacity(2);
        if let Some(target) = pending.start_anchor {
            attachments.push(Attachment { own: 0, target });
        }
        if let Some(target) = end_anchor {
            attachments.push(Attachment { own: 1, target });
        }
        (part, attachments)
    }

    /// Place the pending strut ending at `end`. Returns the new part.
    fn commit(&mut self, ctx: &mut SceneContext, end: Vec2) -> Option<PartId> {
        let pending = self.pending?;
        let (part, attachments) = self.preview(ctx, &pending, end);
        let far_end = part.endpoints().map(|(_, b)| b);
        let id = try_place(ctx, part, &attachments)?;
        self.pending = far_end.map(|start| PendingStrut {
            start,
            start_anchor: Some((id, 1)),
            held: false,
            dragged: false,
        });
        Some(id)
    }
}

impl Default for LineTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for LineTool {
    fn name(&self) -> &'static str {
        "line"
    }

    fn pointer_down(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button != PointerButton::Left {
            return Propagation::Continue;
        }
        self.cursor = e.world;
        if self.pending.is_some() {
            self.commit(ctx, e.world);
            return Propagation::Stop;
        }
        let (start, start_anchor) = resolve(ctx, e.world, &[]);
        self.pending = Some(PendingStrut {
            start,
            start_anchor,
            held: true,
            dragged: false,
        });
        Propagation::Stop
    }

    fn pointer_move(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        self.cursor = e.world;
        let threshold = ctx.pick_radius(ctx.config.click_epsilon);
        match &mut self.pending {
            Some(p) if p.held && e.pressed && p.start.distance(e.world) > threshold => {
                p.dragged = true;
                Propagation::Stop
            }
            _ => Propagation::Continue,
        }
    }

    fn pointer_up(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let Some(pending) = self.pending.as_mut() else {
            return Propagation::Continue;
        };
        let dragged = pending.dragged;
        pending.held = false;
        if dragged {
            self.commit(ctx, e.world);
            self.pending = None;
        }
        Propagation::Stop
    }

    fn key_down(&mut self, _ctx: &mut SceneContext, key: Key) -> Propagation {
        if key == Key::Escape && self.pending.take().is_some() {
            return Propagation::Stop;
        }
        Propagation::Continue
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        let Some(pending) = &self.pending else {
            return;
        };
        let (part, attachments) = self.preview(ctx, pending, self.cursor);
        let color = match check_placement(ctx, &part, &attachments) {
            Ok(()) => OverlayColor::SELECTION,
            Err(_) => OverlayColor::INVALID,
        };
        out.stroke_geom(&part.geom(), part.height, color);
        for a in part.anchors() {
            out.fill_circle(a.pos, 3.0 / ctx.camera.zoom, OverlayColor::ANCHOR);
        }
    }

    fn destroy(&mut self, _ctx: &mut SceneContext) {
        self.pending = None;
    }
}
