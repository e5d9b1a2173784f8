use glam::Vec2;

/// Which pointer button an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Left,
    Middle,
    Right,
}

impl PointerButton {
    /// DOM `MouseEvent.button` numbering.
    pub fn from_dom(button: u32) -> Self {
        match button {
            1 => PointerButton::Middle,
            2 => PointerButton::Right,
            _ => PointerButton::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    /// Either modifier extends a selection instead of replacing it.
    pub fn extend(&self) -> bool {
        self.shift || self.ctrl
    }
}

/// Pointer state handed to tools. `world` is filled in by the host from the
/// camera before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub screen: Vec2,
    pub world: Vec2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    /// Whether the primary button is held. False on a hover move.
    pub pressed: bool,
}

impl PointerEvent {
    /// A left-button event at a world point, for native callers.
    pub fn at(world: Vec2) -> Self {
        Self {
            screen: world,
            world,
            pressed: true,
            ..Default::default()
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_pressed(mut self, pressed: bool) -> Self {
        self.pressed = pressed;
        self
    }
}

/// Keys the tools react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Delete,
    Other(u32),
}

impl Key {
    /// Map a DOM `KeyboardEvent.keyCode`.
    pub fn from_code(code: u32) -> Self {
        match code {
            13 => Key::Enter,
            27 => Key::Escape,
            8 | 46 => Key::Delete,
            other => Key::Other(other),
        }
    }
}

/// Input events the scene understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    KeyDown(Key),
    /// Scroll at a screen position. Positive `delta` zooms out.
    Wheel { screen: Vec2, delta: f32 },
}

/// A queue of input events.
/// JS writes events into the queue; Rust drains them once per frame, in
/// arrival order, before the physics step.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
