//! `#[wasm_bindgen]` exports for the sandbox.
//!
//! The runner lives in a `thread_local!` because wasm-bindgen cannot export
//! a stateful struct's methods as free functions. Every export is a no-op
//! (returning a default) until `sandbox_init()` has run.

pub mod runner;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use strut_engine::SandboxConfig;

pub use runner::{JsStore, SandboxRunner};

thread_local! {
    static RUNNER: RefCell<Option<SandboxRunner>> = const { RefCell::new(None) };
}

fn with_runner<R>(f: impl FnOnce(&mut SandboxRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let Ok(mut borrow) = cell.try_borrow_mut() else {
            log::error!("sandbox called re-entrantly; ignoring");
            return None;
        };
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                log::warn!("sandbox not initialized. Call sandbox_init() first.");
                None
            }
        }
    })
}

/// The page's own query string, when the caller passes none.
fn location_query() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

#[wasm_bindgen]
pub fn sandbox_init(width: f32, height: f32) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = SandboxConfig {
        viewport: glam::Vec2::new(width, height),
        ..SandboxConfig::default()
    };
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(SandboxRunner::new(config));
    });
    log::info!("strut: initialized ({}x{})", width, height);
}

/// Register the function builds are saved through. It receives the build as
/// a JSON string; throwing rejects the save.
#[wasm_bindgen]
pub fn sandbox_set_save_callback(callback: Option<js_sys::Function>) {
    with_runner(|r| r.set_save_callback(callback));
}

/// Start a scene for `query` (defaults to the page URL's query string) and
/// populate it once `load` resolves with the map JSON. A load that resolves
/// after another scene has started is ignored.
#[wasm_bindgen]
pub fn sandbox_start(query: Option<String>, load: Option<js_sys::Promise>) {
    let query = query.unwrap_or_else(location_query);
    let Some(ticket) = with_runner(|r| r.start(&query)) else {
        return;
    };
    let Some(load) = load else {
        with_runner(|r| r.finish_load(&ticket, Ok(Default::default())));
        return;
    };
    wasm_bindgen_futures::spawn_local(async move {
        let result = runner::parse_load(JsFuture::from(load).await);
        with_runner(|r| r.finish_load(&ticket, result));
    });
}

#[wasm_bindgen]
pub fn sandbox_tick(dt: f32) {
    with_runner(|r| r.tick(dt));
}

#[wasm_bindgen]
pub fn sandbox_stop() {
    with_runner(|r| r.stop());
}

#[wasm_bindgen]
pub fn sandbox_resize(width: f32, height: f32) {
    with_runner(|r| r.resize(width, height));
}

// ---- Input ----

#[wasm_bindgen]
pub fn sandbox_pointer_down(x: f32, y: f32, button: u32, shift: bool, ctrl: bool) {
    with_runner(|r| r.pointer_down(runner::dom_pointer(x, y, button, 1, shift, ctrl)));
}

#[wasm_bindgen]
pub fn sandbox_pointer_move(x: f32, y: f32, buttons: u32, shift: bool, ctrl: bool) {
    with_runner(|r| r.pointer_move(runner::dom_pointer(x, y, 0, buttons, shift, ctrl)));
}

#[wasm_bindgen]
pub fn sandbox_pointer_up(x: f32, y: f32, button: u32, shift: bool, ctrl: bool) {
    with_runner(|r| r.pointer_up(runner::dom_pointer(x, y, button, 0, shift, ctrl)));
}

#[wasm_bindgen]
pub fn sandbox_key_down(key_code: u32) {
    with_runner(|r| r.key_down(key_code));
}

#[wasm_bindgen]
pub fn sandbox_wheel(x: f32, y: f32, delta: f32) {
    with_runner(|r| r.wheel(x, y, delta));
}

// ---- Commands ----

#[wasm_bindgen]
pub fn sandbox_set_tool(key: &str) -> bool {
    with_runner(|r| r.set_tool(key)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn sandbox_set_running(running: bool) {
    with_runner(|r| r.set_running(running));
}

#[wasm_bindgen]
pub fn sandbox_set_grid_snapping(enabled: bool) {
    with_runner(|r| r.set_grid_snapping(enabled));
}

#[wasm_bindgen]
pub fn sandbox_merge_selected() -> bool {
    with_runner(|r| r.merge_selected()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn sandbox_delete_selected() -> u32 {
    with_runner(|r| r.delete_selected()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn sandbox_duplicate_selected() -> u32 {
    with_runner(|r| r.duplicate_selected()).unwrap_or(0)
}

// ---- Data accessors ----

/// Scene events since the last call, as a JSON array.
#[wasm_bindgen]
pub fn sandbox_drain_events() -> String {
    with_runner(|r| r.drain_events()).unwrap_or_else(|| "[]".to_string())
}

#[wasm_bindgen]
pub fn sandbox_parts() -> String {
    with_runner(|r| r.parts_json()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn sandbox_export() -> String {
    with_runner(|r| r.export()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn sandbox_view() -> Vec<f32> {
    with_runner(|r| r.view()).unwrap_or_default()
}

/// 16 floats, column-major.
#[wasm_bindgen]
pub fn sandbox_projection() -> Vec<f32> {
    with_runner(|r| r.projection()).unwrap_or_default()
}

#[cfg(feature = "overlay")]
#[wasm_bindgen]
pub fn sandbox_overlay_ptr() -> *const f32 {
    with_runner(|r| r.overlay_ptr()).unwrap_or(std::ptr::null())
}

/// Overlay vertices are `[x, y, r, g, b, a]`.
#[cfg(feature = "overlay")]
#[wasm_bindgen]
pub fn sandbox_overlay_vertex_count() -> u32 {
    with_runner(|r| r.overlay_vertex_count()).unwrap_or(0)
}
