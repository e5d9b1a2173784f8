use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};

use strut_engine::{
    BuildStore, InputEvent, Key, LoadTicket, MapData, Modifiers, PointerButton, PointerEvent,
    SandboxConfig, SceneHost, SceneParams, StoreError,
};

/// Saves through a JS callback taking the build as a JSON string. Without a
/// callback, saves are dropped.
pub struct JsStore {
    callback: Option<js_sys::Function>,
}

impl JsStore {
    pub fn new() -> Self {
        Self { callback: None }
    }

    pub fn set_callback(&mut self, callback: Option<js_sys::Function>) {
        self.callback = callback;
    }
}

impl Default for JsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildStore for JsStore {
    fn save(&mut self, data: &MapData) -> Result<(), StoreError> {
        let Some(callback) = &self.callback else {
            log::debug!("no save callback, dropping {} objects", data.objects.len());
            return Ok(());
        };
        let json = data.to_json()?;
        callback
            .call1(&JsValue::NULL, &JsValue::from_str(&json))
            .map(|_| ())
            .map_err(|e| StoreError::Rejected(describe(&e)))
    }
}

/// Best-effort message for a thrown JS value.
pub fn describe(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Turn a resolved load value (a JSON string or a plain object) into map
/// data.
pub fn parse_load(value: Result<JsValue, JsValue>) -> Result<MapData, StoreError> {
    let value = value.map_err(|e| StoreError::Rejected(describe(&e)))?;
    if value.is_null() || value.is_undefined() {
        return Ok(MapData::default());
    }
    let json = match value.as_string() {
        Some(json) => json,
        None => js_sys::JSON::stringify(&value)
            .ok()
            .and_then(|s| s.as_string())
            .ok_or_else(|| {
                StoreError::Rejected("load resolved to a value that is not JSON".into())
            })?,
    };
    Ok(MapData::from_json(&json)?)
}

/// A pointer event from DOM fields. `buttons` is the DOM bitmask of held
/// buttons; world coordinates are filled in by the host.
pub fn dom_pointer(
    x: f32,
    y: f32,
    button: u32,
    buttons: u32,
    shift: bool,
    ctrl: bool,
) -> PointerEvent {
    PointerEvent {
        screen: Vec2::new(x, y),
        world: Vec2::ZERO,
        button: PointerButton::from_dom(button),
        modifiers: Modifiers { shift, ctrl },
        pressed: buttons != 0,
    }
}

/// Owns the scene host and the browser-side store, and turns DOM-shaped
/// input into engine events.
pub struct SandboxRunner {
    host: SceneHost,
    store: JsStore,
    /// Seconds since init, accumulated from tick deltas.
    clock: f64,
    #[cfg(feature = "overlay")]
    overlay: (*const f32, u32),
}

impl SandboxRunner {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            host: SceneHost::new(config),
            store: JsStore::new(),
            clock: 0.0,
            #[cfg(feature = "overlay")]
            overlay: (std::ptr::null(), 0),
        }
    }

    pub fn set_save_callback(&mut self, callback: Option<js_sys::Function>) {
        self.store.set_callback(callback);
    }

    pub fn start(&mut self, query: &str) -> LoadTicket {
        if let Err(e) = self.host.stop(&mut self.store) {
            log::warn!("could not save the previous scene: {}", e);
        }
        self.host.start(SceneParams::parse(query))
    }

    pub fn finish_load(&mut self, ticket: &LoadTicket, result: Result<MapData, StoreError>) {
        match self.host.finish_load(ticket, result) {
            Ok(true) => log::info!("scene loaded"),
            Ok(false) => {}
            Err(e) => self.report(&e),
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.clock += f64::from(dt.max(0.0));
        if let Err(e) = self.host.update(dt, self.clock, &mut self.store) {
            self.report(&e);
        }
        #[cfg(feature = "overlay")]
        {
            self.overlay = match self.host.overlay() {
                Some(buffer) => (buffer.buffer_ptr(), buffer.vertex_count() as u32),
                None => (std::ptr::null(), 0),
            };
        }
    }

    /// Surface a persistence failure to the UI.
    fn report(&mut self, e: &StoreError) {
        log::error!("{}", e);
        if let Some(ctx) = self.host.scene_mut() {
            ctx.flash(e.to_string());
        }
    }

    // ---- Input ----

    pub fn pointer_down(&mut self, e: PointerEvent) {
        self.host.push_input(InputEvent::PointerDown(e.with_pressed(true)));
    }

    pub fn pointer_move(&mut self, e: PointerEvent) {
        self.host.push_input(InputEvent::PointerMove(e));
    }

    pub fn pointer_up(&mut self, e: PointerEvent) {
        self.host.push_input(InputEvent::PointerUp(e));
    }

    pub fn key_down(&mut self, code: u32) {
        self.host.push_input(InputEvent::KeyDown(Key::from_code(code)));
    }

    pub fn wheel(&mut self, x: f32, y: f32, delta: f32) {
        self.host.push_input(InputEvent::Wheel {
            screen: Vec2::new(x, y),
            delta,
        });
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if let Some(ctx) = self.host.scene_mut() {
            ctx.camera.resize(Vec2::new(width, height));
        }
    }

    // ---- Commands ----

    pub fn set_tool(&mut self, key: &str) -> bool {
        self.host.set_tool(key)
    }

    pub fn set_running(&mut self, running: bool) {
        if let Err(e) = self.host.set_running(running, &mut self.store) {
            self.report(&e);
        }
    }

    pub fn set_grid_snapping(&mut self, enabled: bool) {
        if let Some(ctx) = self.host.scene_mut() {
            ctx.set_grid_snapping(enabled);
        }
    }

    pub fn merge_selected(&mut self) -> bool {
        self.host
            .scene_mut()
            .and_then(|ctx| ctx.merge_selected())
            .is_some()
    }

    pub fn delete_selected(&mut self) -> u32 {
        self.host
            .scene_mut()
            .map_or(0, |ctx| ctx.delete_selected() as u32)
    }

    pub fn duplicate_selected(&mut self) -> u32 {
        self.host
            .scene_mut()
            .map_or(0, |ctx| ctx.duplicate_selected().len() as u32)
    }

    pub fn stop(&mut self) {
        if let Err(e) = self.host.stop(&mut self.store) {
            log::error!("{}", e);
        }
    }

    // ---- Data accessors ----

    pub fn drain_events(&mut self) -> String {
        let events = self
            .host
            .scene_mut()
            .map(|ctx| ctx.events.drain())
            .unwrap_or_default();
        serde_json::to_string(&events).unwrap_or_else(|e| {
            log::error!("event serialization failed: {}", e);
            "[]".to_string()
        })
    }

    /// Every part as it stands now, simulated positions included.
    pub fn parts_json(&self) -> String {
        self.host
            .scene()
            .and_then(|ctx| ctx.snapshot().to_json().ok())
            .unwrap_or_default()
    }

    /// The build as it would be saved.
    pub fn export(&self) -> String {
        self.host
            .export()
            .and_then(|data| data.to_json().ok())
            .unwrap_or_default()
    }

    /// `[center.x, center.y, zoom]`.
    pub fn view(&self) -> Vec<f32> {
        self.host
            .scene()
            .map(|ctx| vec![ctx.camera.center.x, ctx.camera.center.y, ctx.camera.zoom])
            .unwrap_or_default()
    }

    /// Column-major orthographic projection for the overlay shader.
    pub fn projection(&self) -> Vec<f32> {
        self.host
            .scene()
            .map(|ctx| ctx.camera.uniform().projection.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    #[cfg(feature = "overlay")]
    pub fn overlay_ptr(&self) -> *const f32 {
        self.overlay.0
    }

    #[cfg(feature = "overlay")]
    pub fn overlay_vertex_count(&self) -> u32 {
        self.overlay.1
    }
}
