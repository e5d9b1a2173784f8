//! Vertex-level polygon tools: drawing a new outline with the pen, and
//! editing the vertices of an existing polygon.
//!
//! Both work on the scene's [`PointEdit`] record. Committing runs the
//! outline through [`split_islands`], so a self-intersecting outline turns
//! into one polygon per island.

use glam::Vec2;

use crate::api::context::{PointEdit, SceneContext};
use crate::api::events::SceneEvent;
use crate::api::types::{AnchorId, PartId};
use crate::components::part::{Part, PartType};
use crate::geometry::{point_segment_distance_sq, split_islands, Bounds};
use crate::input::{Key, PointerButton, PointerEvent};
#[cfg(feature = "overlay")]
use crate::systems::overlay::{OverlayBuffer, OverlayColor};
use crate::tools::box_select::{combine_selection, BoxGesture};
use crate::tools::place::try_place;
use crate::tools::{Propagation, Tool};

/// How far an anchor may be from where a joint held it and still take the
/// joint over.
const REATTACH_DISTANCE: f32 = 0.01;

/// Turn an edit into polygon parts. An edit of an existing polygon replaces
/// it; a pen stroke is placed like any new part. Returns the parts now
/// standing for the edit, which become the selection. Invalid outlines
/// flash and create nothing.
pub fn commit_polygon(ctx: &mut SceneContext, edit: &PointEdit) -> Vec<PartId> {
    if let Some(id) = edit.part {
        if edit.points == edit.original && ctx.parts.contains(id) {
            return vec![id];
        }
    }
    if edit.points.len() < 3 {
        ctx.flash("A polygon needs at least three points");
        return Vec::new();
    }
    let islands = split_islands(&edit.points);
    let style = edit.part.and_then(|id| ctx.parts.get(id)).map(|p| {
        (p.fill_color, p.stroke_color, p.no_collide, p.z_index)
    });
    let shapes: Vec<Part> = islands
        .iter()
        .filter_map(|points| Part::polygon(PartId::default(), points))
        .map(|part| match style {
            Some((fill, stroke, no_collide, z)) => part
                .with_colors(fill, stroke)
                .with_no_collide(no_collide)
                .with_z_index(z),
            None => part,
        })
        .collect();
    if shapes.is_empty() {
        ctx.flash("That outline is not a valid polygon");
        return Vec::new();
    }
    log::debug!("polygon commit: {} points, {} islands", edit.points.len(), shapes.len());

    let created: Vec<PartId> = match edit.part {
        Some(original) => {
            if !ctx.has_room_for(shapes.len() - 1) {
                return Vec::new();
            }
            let held = held_connections(ctx, original);
            ctx.destroy_part(original);
            let created: Vec<PartId> = shapes
                .into_iter()
                .map(|mut part| {
                    part.id = ctx.ids.next_part();
                    ctx.insert_part(part)
                })
                .collect();
            let lost = reattach(ctx, &created, &held);
            if lost > 0 {
                ctx.flash(format!("{lost} connection(s) were removed with the moved points"));
            }
            created
        }
        None => shapes
            .into_iter()
            .filter_map(|part| try_place(ctx, part, &[]))
            .collect(),
    };
    ctx.set_selected(created.clone());
    created
}

/// Anchors on `part` that sit in a joint: where the anchor is, and
/// another member of that joint to hold on to.
fn held_connections(ctx: &SceneContext, part: PartId) -> Vec<(Vec2, (PartId, AnchorId))> {
    let Some(p) = ctx.parts.get(part) else {
        return Vec::new();
    };
    p.anchors()
        .into_iter()
        .filter_map(|a| {
            let joint = ctx.joints.get(ctx.joints.joint_at(part, a.id)?)?;
            let other = joint.members.iter().find(|m| m.part != part)?;
            Some((a.pos, (other.part, other.anchor)))
        })
        .collect()
}

/// Reconnect each held connection to a new part with an anchor on the same
/// spot. Returns how many found no such anchor.
fn reattach(
    ctx: &mut SceneContext,
    created: &[PartId],
    held: &[(Vec2, (PartId, AnchorId))],
) -> usize {
    let mut lost = 0;
    for (pos, target) in held {
        let spot = created.iter().find_map(|id| {
            let anchor = ctx.parts.get(*id)?.hovered_anchor(*pos, REATTACH_DISTANCE)?;
            Some((*id, anchor.id))
        });
        let kept = spot.is_some_and(|(id, anchor)| ctx.connect(*target, id, anchor));
        if !kept {
            log::debug!("polygon commit: connection at {} dropped", pos);
            lost += 1;
        }
    }
    lost
}

fn nearest_vertex(points: &[Vec2], p: Vec2, radius: f32) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, v)| (i, v.distance_squared(p)))
        .filter(|(_, d)| *d <= radius * radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Index of the edge (i, i+1) closest to `p`.
fn nearest_edge(points: &[Vec2], p: Vec2) -> Option<usize> {
    let n = points.len();
    (0..n)
        .map(|i| (i, point_segment_distance_sq(p, points[i], points[(i + 1) % n])))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(feature = "overlay")]
fn draw_edit(ctx: &SceneContext, edit: &PointEdit, closed: bool, out: &mut OverlayBuffer) {
    let width = 1.5 / ctx.camera.zoom;
    let r = ctx.pick_radius(ctx.config.handle_radius) * 0.5;
    if closed && edit.points.len() >= 3 {
        out.stroke_polygon(&edit.points, width, OverlayColor::SELECTION);
    } else {
        out.stroke_polyline(&edit.points, width, OverlayColor::SELECTION);
    }
    for (i, v) in edit.points.iter().enumerate() {
        if edit.selected.contains(&i) {
            out.fill_circle(*v, r, OverlayColor::SELECTION);
        } else {
            out.stroke_circle(*v, r, width, OverlayColor::HANDLE);
        }
    }
}

// ---------------------------------------------------------------------------
// EditPointsTool
// ---------------------------------------------------------------------------

struct VertexDrag {
    origin: Vec2,
    start: Vec<Vec2>,
}

pub struct EditPointsTool {
    drag: Option<VertexDrag>,
}

impl EditPointsTool {
    /// Start editing the selected polygon. Anything else flashes and asks
    /// for the select tool.
    pub fn new(ctx: &mut SceneContext) -> Self {
        let target = match ctx.selected() {
            [only] => ctx
                .parts
                .get(*only)
                .filter(|p| p.part_type() == PartType::Polygon)
                .and_then(|p| Some((p.id, p.world_points()?))),
            _ => None,
        };
        match target {
            Some((id, points)) => ctx.point_edit = Some(PointEdit::new(Some(id), points)),
            None => {
                ctx.point_edit = None;
                ctx.flash("Select a single polygon to edit its points");
                ctx.request_tool("select");
            }
        }
        Self { drag: None }
    }

    fn commit(ctx: &mut SceneContext) {
        let Some(mut edit) = ctx.point_edit.take() else {
            return;
        };
        if commit_polygon(ctx, &edit).is_empty() {
            edit.revert();
            ctx.point_edit = Some(edit);
            return;
        }
        ctx.request_tool("select");
    }
}

impl Tool for EditPointsTool {
    fn name(&self) -> &'static str {
        "edit_points"
    }

    fn pointer_down(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let radius = ctx.pick_radius(ctx.config.handle_radius);
        let p = ctx.snap(e.world);
        let Some(edit) = ctx.point_edit.as_mut() else {
            return Propagation::Continue;
        };
        match e.button {
            PointerButton::Right => {
                let Some(edge) = nearest_edge(&edit.points, e.world) else {
                    return Propagation::Continue;
                };
                edit.points.insert(edge + 1, p);
                edit.selected = vec![edge + 1];
                Propagation::Stop
            }
            PointerButton::Left => {
                let Some(hit) = nearest_vertex(&edit.points, e.world, radius) else {
                    return Propagation::Continue;
                };
                if !edit.selected.contains(&hit) {
                    edit.selected = combine_selection(&edit.selected, &[hit], e.modifiers.extend());
                }
                self.drag = Some(VertexDrag {
                    origin: e.world,
                    start: edit.points.clone(),
                });
                Propagation::Stop
            }
            PointerButton::Middle => Propagation::Continue,
        }
    }

    fn pointer_move(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        let Some(drag) = &self.drag else {
            return Propagation::Continue;
        };
        let delta = e.world - drag.origin;
        let moved: Vec<(usize, Vec2)> = match &ctx.point_edit {
            Some(edit) => edit
                .selected
                .iter()
                .filter_map(|i| drag.start.get(*i).map(|v| (*i, ctx.snap(*v + delta))))
                .collect(),
            None => return Propagation::Continue,
        };
        if let Some(edit) = ctx.point_edit.as_mut() {
            for (i, v) in moved {
                edit.points[i] = v;
            }
        }
        Propagation::Stop
    }

    fn pointer_up(&mut self, _ctx: &mut SceneContext, _e: &PointerEvent) -> Propagation {
        match self.drag.take() {
            Some(_) => Propagation::Stop,
            None => Propagation::Continue,
        }
    }

    fn key_down(&mut self, ctx: &mut SceneContext, key: Key) -> Propagation {
        match key {
            Key::Enter => Self::commit(ctx),
            Key::Escape => {
                if let Some(edit) = ctx.point_edit.as_mut() {
                    edit.revert();
                }
                ctx.request_tool("select");
            }
            Key::Delete => {
                let Some(edit) = ctx.point_edit.as_mut() else {
                    return Propagation::Continue;
                };
                if edit.points.len() - edit.selected.len() < 3 {
                    ctx.flash("A polygon needs at least three points");
                    return Propagation::Stop;
                }
                let selected = std::mem::take(&mut edit.selected);
                let mut i = 0;
                edit.points.retain(|_| {
                    i += 1;
                    !selected.contains(&(i - 1))
                });
            }
            Key::Other(_) => return Propagation::Continue,
        }
        Propagation::Stop
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        if let Some(edit) = &ctx.point_edit {
            draw_edit(ctx, edit, true, out);
        }
    }

    /// Leaving the tool keeps whatever was edited.
    fn destroy(&mut self, ctx: &mut SceneContext) {
        self.drag = None;
        if let Some(edit) = ctx.point_edit.take() {
            commit_polygon(ctx, &edit);
        }
    }
}

// ---------------------------------------------------------------------------
// SelectPointsTool
// ---------------------------------------------------------------------------

/// Box or click selection of the vertices under edit.
pub struct SelectPointsTool {
    gesture: Option<BoxGesture>,
}

impl SelectPointsTool {
    pub fn new() -> Self {
        Self { gesture: None }
    }
}

impl Default for SelectPointsTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectPointsTool {
    fn name(&self) -> &'static str {
        "select_points"
    }

    fn pointer_down(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button == PointerButton::Left && ctx.point_edit.is_some() {
            self.gesture = Some(BoxGesture::new(e.world));
            return Propagation::Stop;
        }
        Propagation::Continue
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
        let Some(mut gesture) = self.gesture.take() else {
            return Propagation::Continue;
        };
        gesture.current = e.world;
        let epsilon = ctx.pick_radius(ctx.config.click_epsilon);
        let radius = ctx.pick_radius(ctx.config.handle_radius);
        let Some(edit) = ctx.point_edit.as_mut() else {
            return Propagation::Continue;
        };
        let hits: Vec<usize> = if gesture.is_click(epsilon) {
            nearest_vertex(&edit.points, gesture.start, radius)
                .into_iter()
                .collect()
        } else {
            let area: Bounds = gesture.bounds();
            (0..edit.points.len())
                .filter(|i| area.contains(edit.points[*i]))
                .collect()
        };
        edit.selected = combine_selection(&edit.selected, &hits, e.modifiers.extend());
        Propagation::Stop
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        if let Some(g) = &self.gesture {
            let corners = g.bounds().corners();
            out.fill_polygon(&corners, OverlayColor::SELECTION_FILL);
            out.stroke_polygon(&corners, 1.0 / ctx.camera.zoom, OverlayColor::SELECTION);
        }
    }

    fn destroy(&mut self, _ctx: &mut SceneContext) {
        self.gesture = None;
    }
}

// ---------------------------------------------------------------------------
// PenTool
// ---------------------------------------------------------------------------

/// Click out a new polygon. Clicking the first point again (or Enter)
/// closes it; Escape drops it.
pub struct PenTool {
    hover: Option<Vec2>,
}

impl PenTool {
    pub fn new(ctx: &mut SceneContext) -> Self {
        ctx.point_edit = None;
        Self { hover: None }
    }

    fn drawing(ctx: &SceneContext) -> bool {
        ctx.point_edit.as_ref().is_some_and(|e| e.part.is_none())
    }

    fn finish(ctx: &mut SceneContext) -> Vec<PartId> {
        let Some(edit) = ctx.point_edit.take() else {
            return Vec::new();
        };
        let created = commit_polygon(ctx, &edit);
        ctx.events.emit(SceneEvent::PolygonEnd);
        created
    }

    fn cancel(ctx: &mut SceneContext) {
        if ctx.point_edit.take().is_some() {
            ctx.events.emit(SceneEvent::PolygonEnd);
        }
    }
}

impl Tool for PenTool {
    fn name(&self) -> &'static str {
        "pen"
    }

    fn pointer_down(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        if e.button != PointerButton::Left {
            return Propagation::Continue;
        }
        let p = ctx.snap(e.world);
        let close_radius = ctx.pick_radius(ctx.config.handle_radius);
        if !Self::drawing(ctx) {
            ctx.point_edit = Some(PointEdit::new(None, vec![p]));
            ctx.events.emit(SceneEvent::PolygonStart);
            return Propagation::Stop;
        }
        let closes = ctx
            .point_edit
            .as_ref()
            .is_some_and(|edit| {
                edit.points.len() >= 3 && edit.points[0].distance(e.world) <= close_radius
            });
        if closes {
            Self::finish(ctx);
        } else if let Some(edit) = ctx.point_edit.as_mut() {
            edit.points.push(p);
        }
        Propagation::Stop
    }

    fn pointer_move(&mut self, ctx: &mut SceneContext, e: &PointerEvent) -> Propagation {
        self.hover = Some(ctx.snap(e.world));
        Propagation::Continue
    }

    fn key_down(&mut self, ctx: &mut SceneContext, key: Key) -> Propagation {
        if !Self::drawing(ctx) {
            return Propagation::Continue;
        }
        match key {
            Key::Enter => {
                Self::finish(ctx);
            }
            Key::Escape => Self::cancel(ctx),
            Key::Delete => {
                if let Some(edit) = ctx.point_edit.as_mut() {
                    edit.points.pop();
                }
            }
            Key::Other(_) => return Propagation::Continue,
        }
        Propagation::Stop
    }

    #[cfg(feature = "overlay")]
    fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        let Some(edit) = ctx.point_edit.as_ref().filter(|e| e.part.is_none()) else {
            return;
        };
        draw_edit(ctx, edit, false, out);
        if let (Some(last), Some(hover)) = (edit.points.last(), self.hover) {
            out.stroke_polyline(&[*last, hover], 1.0 / ctx.camera.zoom, OverlayColor::HANDLE);
        }
    }

    /// A stroke with enough points is kept; anything shorter is dropped.
    fn destroy(&mut self, ctx: &mut SceneContext) {
        let enough = ctx
            .point_edit
            .as_ref()
            .is_some_and(|e| e.part.is_none() && e.points.len() >= 3);
        if enough {
            Self::finish(ctx);
        } else if Self::drawing(ctx) {
            Self::cancel(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::SandboxConfig;
    use crate::api::types::SceneKind;
    use crate::geometry::polygon_area;

    fn ctx() -> SceneContext {
        SceneContext::new(SceneKind::Editor, SandboxConfig::default())
    }

    fn square(size: f32) -> Vec<Vec2> {
        vec![
            Vec2::ZERO,
            Vec2::new(size, 0.0),
            Vec2::new(size, size),
            Vec2::new(0.0, size),
        ]
    }

    fn with_polygon(ctx: &mut SceneContext) -> PartId {
        let id = ctx.ids.next_part();
        let part = Part::polygon(id, &square(40.0)).unwrap().with_colors(0x123456, 0x654321);
        ctx.insert_part(part);
        ctx.set_selected(vec![id]);
        id
    }

    fn click(tool: &mut dyn Tool, ctx: &mut SceneContext, p: Vec2) {
        tool.pointer_down(ctx, &PointerEvent::at(p));
        tool.pointer_up(ctx, &PointerEvent::at(p));
    }

    #[test]
    fn edit_requires_single_polygon() {
        let mut ctx = ctx();
        let _tool = EditPointsTool::new(&mut ctx);
        assert!(ctx.point_edit.is_none());
        assert_eq!(ctx.take_tool_request().as_deref(), Some("select"));
        assert!(ctx
            .events
            .drain()
            .iter()
            .any(|e| matches!(e, SceneEvent::ShowFlash { .. })));
    }

    #[test]
    fn right_click_inserts_on_nearest_edge() {
        let mut ctx = ctx();
        let original = with_polygon(&mut ctx);
        let mut tool = EditPointsTool::new(&mut ctx);
        let e = PointerEvent::at(Vec2::new(43.0, 20.0)).with_button(PointerButton::Right);
        assert_eq!(tool.pointer_down(&mut ctx, &e), Propagation::Stop);
        let edit = ctx.point_edit.as_ref().unwrap();
        assert_eq!(edit.points.len(), 5);
        assert_eq!(edit.points[2], Vec2::new(43.0, 20.0), "between (40,0) and (40,40)");
        assert_eq!(edit.selected, vec![2]);

        tool.key_down(&mut ctx, Key::Enter);
        assert!(ctx.point_edit.is_none());
        assert!(!ctx.parts.contains(original), "replaced");
        let [created] = ctx.selected() else {
            panic!("expected one polygon, got {:?}", ctx.selected());
        };
        let part = ctx.parts.get(*created).unwrap();
        assert_eq!(part.world_points().unwrap().len(), 5);
        assert_eq!(part.fill_color, 0x123456, "style carried over");
        assert_eq!(ctx.take_tool_request().as_deref(), Some("select"));
    }

    /// A polygon with a strut pinned to its corner at the origin.
    fn with_strut_on_corner(ctx: &mut SceneContext) -> (PartId, PartId) {
        let poly = with_polygon(ctx);
        let strut = ctx.ids.next_part();
        ctx.insert_part(Part::line(strut, Vec2::new(-60.0, 0.0), Vec2::ZERO));
        let corner = ctx.parts.get(poly).unwrap().hovered_anchor(Vec2::ZERO, 0.01).unwrap();
        assert!(ctx.connect((strut, 1), poly, corner.id));
        ctx.events.drain();
        (poly, strut)
    }

    #[test]
    fn commit_keeps_joints_on_untouched_anchors() {
        let mut ctx = ctx();
        let (poly, strut) = with_strut_on_corner(&mut ctx);
        let mut edit = PointEdit::new(Some(poly), square(40.0));
        edit.points[2] = Vec2::new(50.0, 50.0);

        let created = commit_polygon(&mut ctx, &edit);
        assert_eq!(created.len(), 1);
        let created = created[0];
        let corner = ctx.parts.get(created).unwrap().hovered_anchor(Vec2::ZERO, 0.01).unwrap();
        let joint = ctx.joints.joint_at(created, corner.id);
        assert!(joint.is_some(), "strut still pinned to the corner");
        assert_eq!(joint, ctx.joints.joint_at(strut, 1));
        assert!(ctx.joints.is_consistent(&ctx.physics));
        assert!(!ctx
            .events
            .drain()
            .iter()
            .any(|e| matches!(e, SceneEvent::ShowFlash { .. })));
    }

    #[test]
    fn commit_flashes_when_a_joint_is_lost() {
        let mut ctx = ctx();
        let (poly, strut) = with_strut_on_corner(&mut ctx);
        let mut edit = PointEdit::new(Some(poly), square(40.0));
        edit.points[0] = Vec2::new(-10.0, -10.0);

        assert_eq!(commit_polygon(&mut ctx, &edit).len(), 1);
        assert!(ctx.joints.joint_at(strut, 1).is_none());
        assert!(ctx.joints.is_empty());
        assert!(ctx
            .events
            .drain()
            .iter()
            .any(|e| matches!(
                e,
                SceneEvent::ShowFlash { message } if message.contains("connection")
            )));
    }

    #[test]
    fn escape_reverts_vertex_drag() {
        let mut ctx = ctx();
        let original = with_polygon(&mut ctx);
        let mut tool = EditPointsTool::new(&mut ctx);
        tool.pointer_down(&mut ctx, &PointerEvent::at(Vec2::new(40.0, 40.0)));
        tool.pointer_move(&mut ctx, &PointerEvent::at(Vec2::new(60.0, 70.0)));
        tool.pointer_up(&mut ctx, &PointerEvent::at(Vec2::new(60.0, 70.0)));
        assert_eq!(ctx.point_edit.as_ref().unwrap().points[2], Vec2::new(60.0, 70.0));

        tool.key_down(&mut ctx, Key::Escape);
        assert_eq!(ctx.point_edit.as_ref().unwrap().points, square(40.0));
        tool.destroy(&mut ctx);
        assert!(ctx.parts.contains(original), "unchanged edit keeps the part");
        assert_eq!(ctx.parts.len(), 1);
    }

    #[test]
    fn delete_keeps_three_vertices() {
        let mut ctx = ctx();
        with_polygon(&mut ctx);
        let mut tool = EditPointsTool::new(&mut ctx);
        ctx.point_edit.as_mut().unwrap().selected = vec![0, 1];
        tool.key_down(&mut ctx, Key::Delete);
        assert_eq!(ctx.point_edit.as_ref().unwrap().points.len(), 4, "refused");
        ctx.point_edit.as_mut().unwrap().selected = vec![3];
        tool.key_down(&mut ctx, Key::Delete);
        assert_eq!(ctx.point_edit.as_ref().unwrap().points.len(), 3);
    }

    #[test]
    fn box_selects_vertices() {
        let mut ctx = ctx();
        with_polygon(&mut ctx);
        let _edit = EditPointsTool::new(&mut ctx);
        let mut tool = SelectPointsTool::new();
        tool.pointer_down(&mut ctx, &PointerEvent::at(Vec2::new(20.0, -10.0)));
        tool.pointer_move(&mut ctx, &PointerEvent::at(Vec2::new(50.0, 50.0)));
        tool.pointer_up(&mut ctx, &PointerEvent::at(Vec2::new(50.0, 50.0)));
        assert_eq!(ctx.point_edit.as_ref().unwrap().selected, vec![1, 2]);
    }

    #[test]
    fn pen_closes_on_first_point() {
        let mut ctx = ctx();
        let mut tool = PenTool::new(&mut ctx);
        for p in square(40.0) {
            click(&mut tool, &mut ctx, p);
        }
        assert!(ctx.parts.is_empty());
        click(&mut tool, &mut ctx, Vec2::new(2.0, 1.0));
        assert_eq!(ctx.parts.len(), 1);
        let part = ctx.parts.iter().next().unwrap();
        assert!((polygon_area(&part.world_points().unwrap()) - 1600.0).abs() < 1e-2);
        let events = ctx.events.drain();
        assert!(events.contains(&SceneEvent::PolygonStart));
        assert!(events.contains(&SceneEvent::PolygonEnd));
        assert!(ctx.point_edit.is_none(), "ready for the next outline");
    }

    #[test]
    fn pen_stroke_too_short_is_dropped() {
        let mut ctx = ctx();
        let mut tool = PenTool::new(&mut ctx);
        click(&mut tool, &mut ctx, Vec2::ZERO);
        click(&mut tool, &mut ctx, Vec2::new(30.0, 0.0));
        tool.key_down(&mut ctx, Key::Enter);
        assert!(ctx.parts.is_empty());
        tool.destroy(&mut ctx);
        assert!(ctx.point_edit.is_none());
    }

    #[test]
    fn pen_destroy_keeps_a_closed_enough_stroke() {
        let mut ctx = ctx();
        let mut tool = PenTool::new(&mut ctx);
        for p in square(40.0).into_iter().take(3) {
            click(&mut tool, &mut ctx, p);
        }
        tool.destroy(&mut ctx);
        assert_eq!(ctx.parts.len(), 1);
    }
}
