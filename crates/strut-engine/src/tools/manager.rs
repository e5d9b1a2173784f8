use crate::api::context::SceneContext;
use crate::api::events::SceneEvent;
use crate::api::types::SceneKind;
use crate::components::part::PartType;
use crate::input::InputEvent;
#[cfg(feature = "overlay")]
use crate::systems::overlay::OverlayBuffer;
use crate::tools::box_select::{SelectTool, ShapeTool};
use crate::tools::controls::ControlsTool;
use crate::tools::drag::DragTool;
use crate::tools::pan::PanTool;
use crate::tools::place::{LineTool, PlaceTool};
use crate::tools::points::{EditPointsTool, PenTool, SelectPointsTool};
use crate::tools::{Propagation, Tool};

/// One position in a tool chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSlot {
    Pan,
    Controls,
    Drag,
    Select,
    /// Box-drag creation of a box-shaped part.
    Shape(PartType),
    /// Click placement of a wheel or thruster.
    Place(PartType),
    Line,
    Pen,
    EditPoints,
    SelectPoints,
}

impl ToolSlot {
    fn build(self, ctx: &mut SceneContext, pan_any_button: bool) -> Box<dyn Tool> {
        match self {
            ToolSlot::Pan => Box::new(PanTool::new(pan_any_button)),
            ToolSlot::Controls => Box::new(ControlsTool::new()),
            ToolSlot::Drag => Box::new(DragTool::new()),
            ToolSlot::Select => Box::new(SelectTool::new()),
            ToolSlot::Shape(ty) => Box::new(ShapeTool::new(ty)),
            ToolSlot::Place(ty) => Box::new(PlaceTool::new(ty)),
            ToolSlot::Line => Box::new(LineTool::new()),
            ToolSlot::Pen => Box::new(PenTool::new(ctx)),
            ToolSlot::EditPoints => Box::new(EditPointsTool::new(ctx)),
            ToolSlot::SelectPoints => Box::new(SelectPointsTool::new()),
        }
    }
}

/// The chain of tools for a tool key, in dispatch order. `None` for keys
/// that do not exist, or that the scene kind does not offer.
pub fn tool_chain(key: &str, kind: SceneKind) -> Option<Vec<ToolSlot>> {
    use ToolSlot::*;
    let chain = match key {
        "select" => match kind {
            SceneKind::Editor => vec![Controls, Pan, Drag, Select],
            SceneKind::Play => vec![Pan, Drag, Select],
        },
        "pan" => vec![Pan],
        "edit_points" => vec![Pan, EditPoints, SelectPoints],
        other => {
            let ty = PartType::from_key(other)?;
            if ty.is_sensor() && kind != SceneKind::Editor {
                return None;
            }
            match ty {
                PartType::Line => vec![Pan, Line],
                PartType::Polygon => vec![Pan, Pen],
                PartType::Wheel | PartType::Thruster => vec![Pan, Place(ty)],
                _ => vec![Pan, Shape(ty)],
            }
        }
    };
    Some(chain)
}

/// Owns the active tool chain and routes input through it.
pub struct ToolManager {
    tools: Vec<Box<dyn Tool>>,
    key: Option<String>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            key: None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Tear down the current chain and build the one for `key`. Unknown
    /// keys are logged and leave the current chain in place. Returns false
    /// when the chain for `key` was not installed.
    pub fn set_tool(&mut self, ctx: &mut SceneContext, key: &str) -> bool {
        let Some(chain) = tool_chain(key, ctx.kind) else {
            log::warn!("unknown tool {:?} for {:?} scene", key, ctx.kind);
            return false;
        };
        self.destroy(ctx);
        let pan_any_button = chain == [ToolSlot::Pan];
        self.tools = chain
            .into_iter()
            .map(|slot| slot.build(ctx, pan_any_button))
            .collect();
        self.key = Some(key.to_string());
        // a tool can refuse at construction and ask for another chain
        if let Some(next) = ctx.take_tool_request().filter(|next| next != key) {
            self.set_tool(ctx, &next);
            return false;
        }
        ctx.events.emit(SceneEvent::SetTool {
            key: key.to_string(),
        });
        true
    }

    /// Add a tool to the end of the chain.
    pub fn push_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Run one event through the chain, then apply any tool switch a tool
    /// asked for.
    pub fn dispatch(&mut self, ctx: &mut SceneContext, event: &InputEvent) {
        for tool in self.tools.iter_mut() {
            let result = match event {
                InputEvent::PointerDown(e) => tool.pointer_down(ctx, e),
                InputEvent::PointerMove(e) => tool.pointer_move(ctx, e),
                InputEvent::PointerUp(e) => tool.pointer_up(ctx, e),
                InputEvent::KeyDown(key) => tool.key_down(ctx, *key),
                InputEvent::Wheel { screen, delta } => tool.wheel(ctx, *screen, *delta),
            };
            if result == Propagation::Stop {
                break;
            }
        }
        if let Some(key) = ctx.take_tool_request() {
            self.set_tool(ctx, &key);
        }
    }

    #[cfg(feature = "overlay")]
    pub fn draw_overlay(&self, ctx: &SceneContext, out: &mut OverlayBuffer) {
        for tool in &self.tools {
            tool.draw_overlay(ctx, out);
        }
    }

    /// Destroy every tool, last first. The manager is empty afterwards.
    pub fn destroy(&mut self, ctx: &mut SceneContext) {
        while let Some(mut tool) = self.tools.pop() {
            tool.destroy(ctx);
        }
        self.key = None;
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}
