//! Box gestures: press, drag out a rectangle, release. A box whose
//! width + height stays under the click epsilon counts as a click at the
//! press point.

use glam::Vec2;

use crate::api::context::SceneContext;
use crate::api::types::PartId;
use crate::components::part::{Part, PartType};
use crate::geometry::{Bounds, Geom};
use crate::input::{Key, PointerButton, PointerEvent};
#[cfg(feature = "overlay")]
use crate::systems::overlay::{OverlayBuffer, OverlayColor};
use crate::tools::place::{check_placement, try_place};
use crate::tools::{Propagation, Tool};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGesture {
    pub start: Vec2,
    pub current: Vec2,
}

impl BoxGesture {
    pub fn new(start: Vec2) -> Self {
        Self {
            start,
            current: start,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_corners(self.start, self.current)
    }

    pub fn is_click(&self, epsilon: f32) -> bool {
        let b = self.bounds();
        b.width() + b.height() < epsilon
    }

    /// Hit-test shape: the press point for a click, the box otherwise.
    pub fn geom(&self, epsilon: f32) -> Geom {
        if self.is_click(epsilon) {
            Geom::Point(self.start)
        } else {
            Geom::Rect(self.bounds())
        }
    }
}

/// Combine a hit set with the current selection. With a modifier held the
/// hits are removed when all of them are already selected, added otherwise.
pub fn combine_selection<T: Copy + PartialEq>(current: &[T], hits: &[T], extend: bool) -> Vec<T> {
    if !extend {
        return hits.to_vec();
    }
    if !hits.is_empty() && hits.iter().all(|h| current.contains(h)) {
        return current.iter().copied().filter(|c| !hits.contains(c)).collect();
    }
    let mut next = current.to_vec();
    next.extend(hits.iter().copied().filter(|h| !current.contains(h)));
    next
}

// ---------------------------------------------------------------------------
// SelectTool
// ---------------------------------------------------------------------------

pub struct SelectTool {
    gesture: Option<BoxGesture>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self { gesture: None }
    }

    /// A moved part drag owns the pointer; the box stands down.
    fn drag_in_progress(ctx: &SceneContext) -> bool {
        ctx.active_drag.as_ref().is_some_and(|d| d.moved)
    }
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectTool {
    fn name(&self) -> &'static str {
        "select"
    }

    fn pointer_down(&mut self, _ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button == PointerButton::Left && e.pressed {
            self.gesture = Some(BoxGesture::new(e.world));
        }
        Propagation::Continue
    }

    fn pointer_move(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if !e.pressed || Self::drag_in_progress(ctx) {
            self.gesture = None;
        }
        if let Some(g) = &mut self.gesture {
            g.current = e.world;
        }
        Propagation::Continue
    }

    fn pointer_up(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let Some(mut gesture) = self.gesture.take() else {
            return Propagation::Continue;
        };
        if Self::drag_in_progress(ctx) {
            return Propagation::Continue;
        }
        gesture.current = e.world;
        let epsilon = ctx.pick_radius(ctx.config.click_epsilon);
        let mut hits = ctx.parts.intersecting(&gesture.geom(epsilon));
        if gesture.is_click(epsilon) && hits.len() > 1 {
            hits = hits.split_off(hits.len() - 1);
        }
        let next = combine_selection(ctx.selected(), &hits, e.modifiers.extend());
        ctx.set_selected(next);
        Propagation::Continue
    }

    fn key_down(&mut self, ctx: &mut SceneContext, key: Key) -> Propagation {
        match key {
            Key::Delete if !ctx.selected().is_empty() => {
                ctx.delete_selected();
                Propagation::Stop
            }
            Key::Escape if !ctx.selected().is_empty() => {
                ctx.set_selected(Vec::new());
                Propagation::Stop
            }
            _ => Propagation::Continue,
        }
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        let width = 1.5 / ctx.camera.zoom;
        for id in ctx.selected() {
            if let Some(part) = ctx.parts.get(*id) {
                out.stroke_geom(&part.geom(), width, OverlayColor::SELECTION);
            }
        }
        if let Some(g) = &self.gesture {
            let corners = g.bounds().corners();
            out.fill_polygon(&corners, OverlayColor::SELECTION_FILL);
            out.stroke_polygon(&corners, width, OverlayColor::SELECTION);
        }
    }

    fn destroy(&mut self, _ctx: &mut SceneContext) {
        self.gesture = None;
    }
}

// ---------------------------------------------------------------------------
// ShapeTool
// ---------------------------------------------------------------------------

/// Drag out a box to create a rect, ellipse or zone filling it.
pub struct ShapeTool {
    ty: PartType,
    gesture: Option<BoxGesture>,
}

impl ShapeTool {
    pub fn new(ty: PartType) -> Self {
        Self { ty, gesture: None }
    }

    fn preview(&self, ctx: &SceneContext) -> Option<Part> {
        let g = self.gesture?;
        let bounds = Bounds::from_corners(ctx.snap(g.start), ctx.snap(g.current));
        Part::boxed(PartId::default(), self.ty, bounds)
    }
}

impl Tool for ShapeTool {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn pointer_down(&mut self, _ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button != PointerButton::Left {
            return Propagation::Continue;
        }
        self.gesture = Some(BoxGesture::new(e.world));
        Propagation::Stop
    }

    fn pointer_move(&mut self, _ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        match &mut self.gesture {
            Some(g) => {
                g.current = e.world;
                Propagation::Stop
            }
            None => Propagation::Continue,
        }
    }

    fn pointer_up(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let Some(g) = self.gesture.as_mut() else {
            return Propagation::Continue;
        };
        g.current = e.world;
        let epsilon = ctx.pick_radius(ctx.config.click_epsilon);
        let click = g.is_click(epsilon);
        let part = self.preview(ctx);
        self.gesture = None;
        if click {
            return Propagation::Stop;
        }
        match part {
            Some(part) => {
                try_place(ctx, part, &[]);
            }
            None => log::warn!("shape tool cannot build {:?}", self.ty),
        }
        Propagation::Stop
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        let Some(part) = self.preview(ctx) else {
            return;
        };
        let color = match check_placement(ctx, &part, &[]) {
            Ok(()) => OverlayColor::SELECTION,
            Err(_) => OverlayColor::INVALID,
        };
        out.stroke_geom(&part.geom(), 2.0 / ctx.camera.zoom, color);
    }

    fn destroy(&mut self, _ctx: &mut SceneContext) {
        self.gesture = None;
    }
}
