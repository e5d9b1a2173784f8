//! Scene lifecycle: create a scene from navigation params, complete its
//! asynchronous load, drive it once per frame and tear it down.
//!
//! Loads are asynchronous on the web side. [`SceneHost::start`] hands out a
//! [`LoadTicket`]; whatever completes the load passes the ticket back to
//! [`SceneHost::finish_load`], which ignores tickets from a scene that has
//! since been replaced or stopped.

use crate::api::config::SandboxConfig;
use crate::api::context::SceneContext;
use crate::api::events::SceneEvent;
use crate::api::types::SceneKind;
use crate::core::time::FixedTimestep;
use crate::input::{InputEvent, InputQueue};
use crate::persist::{Autosave, BuildStore, MapData, StoreError};
#[cfg(feature = "overlay")]
use crate::systems::overlay::OverlayBuffer;
use crate::tools::ToolManager;

/// World-unit margin around loaded content when fitting the camera.
const FIT_PADDING: f32 = 50.0;

/// Navigation parameters for a scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneParams {
    pub scene: SceneKind,
    /// Opaque map id to load.
    pub map: Option<String>,
    /// Opaque build id to load on top of the map.
    pub build: Option<String>,
}

impl SceneParams {
    /// Parse a query string such as `?scene=play&map=m1&build=b7`. Unknown
    /// keys are ignored; an unknown scene name falls back to the editor.
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.trim();
            match key {
                "scene" => {
                    params.scene = match value {
                        "play" => SceneKind::Play,
                        "editor" | "" => SceneKind::Editor,
                        other => {
                            log::warn!("unknown scene {:?}, using the editor", other);
                            SceneKind::Editor
                        }
                    }
                }
                "map" if !value.is_empty() => params.map = Some(value.to_string()),
                "build" if !value.is_empty() => params.build = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }
}

/// Handed out by [`SceneHost::start`] and redeemed by
/// [`SceneHost::finish_load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub generation: u64,
    pub map: Option<String>,
    pub build: Option<String>,
}

struct ActiveScene {
    ctx: SceneContext,
    tools: ToolManager,
    input: InputQueue,
    timestep: FixedTimestep,
    autosave: Autosave,
    /// The build as it stood when the simulation started.
    build_snapshot: Option<MapData>,
    /// Tool to go back to when the simulation stops.
    tool_before_run: Option<String>,
    loaded: bool,
    #[cfg(feature = "overlay")]
    overlay: OverlayBuffer,
}

impl ActiveScene {
    /// Data worth saving: the edited build, never the simulated state.
    fn save_data(&self) -> MapData {
        match &self.build_snapshot {
            Some(snapshot) => snapshot.clone(),
            None => self.ctx.save_data(),
        }
    }

    /// Nothing is written before the load completes, so a slow load can
    /// never overwrite the stored build with a partial scene.
    fn flush(&mut self, store: &mut dyn BuildStore) -> Result<bool, StoreError> {
        if !self.loaded {
            return Ok(false);
        }
        let data = self.save_data();
        self.autosave.flush(store, move || data)
    }
}

pub struct SceneHost {
    config: SandboxConfig,
    generation: u64,
    scene: Option<ActiveScene>,
}

impl SceneHost {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            generation: 0,
            scene: None,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Replace any active scene with a fresh one: scenery built, select tool
    /// installed, nothing loaded yet.
    pub fn start(&mut self, params: SceneParams) -> LoadTicket {
        self.teardown();
        self.generation += 1;
        let mut ctx = SceneContext::new(params.scene, self.config.clone());
        ctx.build_scenery();
        let mut tools = ToolManager::new();
        tools.set_tool(&mut ctx, "select");
        log::info!("scene {:?} started (generation {})", params.scene, self.generation);
        self.scene = Some(ActiveScene {
            ctx,
            tools,
            input: InputQueue::new(),
            timestep: FixedTimestep::new(self.config.fixed_dt),
            autosave: Autosave::new(self.config.autosave_idle),
            build_snapshot: None,
            tool_before_run: None,
            loaded: false,
            #[cfg(feature = "overlay")]
            overlay: OverlayBuffer::new(),
        });
        LoadTicket {
            generation: self.generation,
            map: params.map,
            build: params.build,
        }
    }

    /// Complete a load. A ticket from a scene that is no longer active is
    /// ignored (`Ok(false)`); a failed load is passed through untouched.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<MapData, StoreError>,
    ) -> Result<bool, StoreError> {
        let current = self.generation;
        let Some(scene) = self.scene.as_mut().filter(|_| ticket.generation == current) else {
            log::debug!("ignoring load for stale generation {}", ticket.generation);
            return Ok(false);
        };
        let data = result.inspect_err(|e| log::warn!("load failed: {}", e))?;
        let ctx = &mut scene.ctx;
        let edited = ctx.take_dirty();
        let count = ctx.load_map(&data);
        if let Some(content) = ctx.content_bounds() {
            ctx.camera.fit(&content, FIT_PADDING);
        }
        // loading is not an edit
        ctx.take_dirty();
        if edited {
            ctx.mark_dirty();
        }
        scene.loaded = true;
        ctx.events.emit(SceneEvent::MapLoaded { parts: count });
        Ok(true)
    }

    /// One frame: input first, then physics, then autosave.
    ///
    /// Until the load completes only the camera can be moved: pointer and
    /// key input is dropped and nothing is autosaved.
    pub fn update(
        &mut self,
        dt: f32,
        now: f64,
        store: &mut dyn BuildStore,
    ) -> Result<(), StoreError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        for mut event in scene.input.drain() {
            match &mut event {
                InputEvent::PointerDown(e)
                | InputEvent::PointerMove(e)
                | InputEvent::PointerUp(e) => {
                    if !scene.loaded {
                        continue;
                    }
                    e.world = scene.ctx.camera.screen_to_world(e.screen);
                }
                InputEvent::KeyDown(_) if !scene.loaded => continue,
                InputEvent::KeyDown(_) | InputEvent::Wheel { .. } => {}
            }
            scene.tools.dispatch(&mut scene.ctx, &event);
        }

        if scene.ctx.is_running() {
            let steps = scene.timestep.accumulate(dt);
            for _ in 0..steps {
                scene.ctx.step();
            }
            return Ok(());
        }

        if !scene.loaded {
            return Ok(());
        }
        if scene.ctx.take_dirty() {
            scene.autosave.request(now);
        }
        let ctx = &scene.ctx;
        scene.autosave.poll(now, store, || ctx.save_data())?;
        Ok(())
    }

    /// Start or stop the simulation. Starting saves any pending edits and
    /// remembers the build; stopping puts the remembered build back.
    pub fn set_running(
        &mut self,
        running: bool,
        store: &mut dyn BuildStore,
    ) -> Result<(), StoreError> {
        let Some(scene) = self.scene.as_mut() else {
            return Err(StoreError::NoScene);
        };
        if scene.ctx.is_running() == running {
            return Ok(());
        }
        if running && !scene.loaded {
            log::debug!("run ignored: scene still loading");
            return Ok(());
        }
        let saved = if running {
            let saved = scene.flush(store);
            scene.build_snapshot = Some(scene.ctx.snapshot());
            scene.tool_before_run = scene.tools.key().map(str::to_string);
            scene.ctx.set_running_flag(true);
            scene.tools.set_tool(&mut scene.ctx, "pan");
            scene.timestep.reset();
            saved
        } else {
            scene.ctx.set_running_flag(false);
            if let Some(snapshot) = scene.build_snapshot.take() {
                scene.ctx.clear_parts();
                scene.ctx.load_map(&snapshot);
            }
            let tool = scene.tool_before_run.take().unwrap_or_else(|| "select".to_string());
            scene.tools.set_tool(&mut scene.ctx, &tool);
            scene.ctx.take_dirty();
            Ok(false)
        };
        scene.ctx.events.emit(SceneEvent::SetRunning { running });
        saved.map(|_| ())
    }

    pub fn push_input(&mut self, event: InputEvent) {
        if let Some(scene) = self.scene.as_mut() {
            scene.input.push(event);
        }
    }

    /// Switch tools. Refused while the simulation runs.
    pub fn set_tool(&mut self, key: &str) -> bool {
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };
        if scene.ctx.is_running() {
            log::debug!("tool {:?} ignored while running", key);
            return false;
        }
        scene.tools.set_tool(&mut scene.ctx, key)
    }

    pub fn tool_key(&self) -> Option<&str> {
        self.scene.as_ref().and_then(|s| s.tools.key())
    }

    pub fn scene(&self) -> Option<&SceneContext> {
        self.scene.as_ref().map(|s| &s.ctx)
    }

    pub fn scene_mut(&mut self) -> Option<&mut SceneContext> {
        self.scene.as_mut().map(|s| &mut s.ctx)
    }

    pub fn is_loaded(&self) -> bool {
        self.scene.as_ref().is_some_and(|s| s.loaded)
    }

    /// Redraw the tool overlay and return it.
    #[cfg(feature = "overlay")]
    pub fn overlay(&mut self) -> Option<&OverlayBuffer> {
        let scene = self.scene.as_mut()?;
        scene.overlay.clear();
        scene.tools.draw_overlay(&scene.ctx, &mut scene.overlay);
        Some(&scene.overlay)
    }

    /// The build as it would be saved right now.
    pub fn export(&self) -> Option<MapData> {
        self.scene.as_ref().map(ActiveScene::save_data)
    }

    /// Save pending edits, then tear the scene down. Outstanding load
    /// tickets become stale.
    pub fn stop(&mut self, store: &mut dyn BuildStore) -> Result<(), StoreError> {
        let saved = match self.scene.as_mut() {
            Some(scene) => scene.flush(store).map(|_| ()),
            None => Ok(()),
        };
        self.teardown();
        self.generation += 1;
        saved
    }

    /// Tools go first: their destroy hooks may still edit the scene.
    fn teardown(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            scene.tools.destroy(&mut scene.ctx);
            log::debug!("scene torn down with {} parts", scene.ctx.parts.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PartId;
    use crate::components::part::{Part, PartType};
    use crate::geometry::Bounds;
    use crate::input::PointerEvent;
    use crate::persist::MemoryStore;
    use glam::Vec2;

    fn loaded_host() -> SceneHost {
        let mut host = SceneHost::new(SandboxConfig::default());
        let ticket = host.start(SceneParams::default());
        host.finish_load(&ticket, Ok(MapData::default())).unwrap();
        host
    }

    fn map_with_wheel() -> MapData {
        let mut data = MapData::default();
        data.objects
            .push(Part::wheel(PartId(7), Vec2::new(0.0, -100.0), 20.0).to_save_json());
        data
    }

    #[test]
    fn parses_query_params() {
        let p = SceneParams::parse("?scene=play&map=m1&build=b7&x=1");
        assert_eq!(p.scene, SceneKind::Play);
        assert_eq!(p.map.as_deref(), Some("m1"));
        assert_eq!(p.build.as_deref(), Some("b7"));
        assert_eq!(SceneParams::parse(""), SceneParams::default());
        assert_eq!(SceneParams::parse("scene=moon").scene, SceneKind::Editor);
    }

    #[test]
    fn start_installs_select_chain() {
        let mut host = SceneHost::new(SandboxConfig::default());
        host.start(SceneParams::default());
        assert_eq!(host.tool_key(), Some("select"));
        let scene = host.scene().unwrap();
        assert_eq!(scene.terrain.len(), 1, "ground");
        assert!(!host.is_loaded());
    }

    #[test]
    fn finish_load_populates_and_emits() {
        let mut host = SceneHost::new(SandboxConfig::default());
        let ticket = host.start(SceneParams::parse("map=m1"));
        assert!(host.finish_load(&ticket, Ok(map_with_wheel())).unwrap());
        let scene = host.scene_mut().unwrap();
        assert_eq!(scene.parts.len(), 1);
        assert!(scene.ids.peek() > 7, "ids advanced past loaded data");
        assert!(scene.events.drain().contains(&SceneEvent::MapLoaded { parts: 1 }));
        assert!(host.is_loaded());
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut host = SceneHost::new(SandboxConfig::default());
        let old = host.start(SceneParams::default());
        let _new = host.start(SceneParams::default());
        assert!(!host.finish_load(&old, Ok(map_with_wheel())).unwrap());
        assert!(host.scene().unwrap().parts.is_empty());

        let mut store = MemoryStore::new();
        let ticket = host.start(SceneParams::default());
        host.stop(&mut store).unwrap();
        assert!(!host.finish_load(&ticket, Ok(map_with_wheel())).unwrap());
        assert!(host.scene().is_none());
    }

    #[test]
    fn failed_load_is_surfaced() {
        let mut host = SceneHost::new(SandboxConfig::default());
        let ticket = host.start(SceneParams::default());
        let err = host
            .finish_load(&ticket, Err(StoreError::Rejected("404".into())))
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[test]
    fn edits_autosave_after_idle_window() {
        let mut host = loaded_host();
        let mut store = MemoryStore::new();
        let scene = host.scene_mut().unwrap();
        let id = scene.ids.next_part();
        scene.insert_part(Part::rect(id, Bounds::from_corners(Vec2::ZERO, Vec2::splat(20.0))));
        host.update(0.016, 0.0, &mut store).unwrap();
        host.update(0.016, 1.0, &mut store).unwrap();
        assert_eq!(store.save_count(), 0, "still inside the idle window");
        host.update(0.016, 2.5, &mut store).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.last().unwrap().objects.len(), 1);
    }

    #[test]
    fn running_restores_the_build() {
        let mut host = SceneHost::new(SandboxConfig::default());
        let mut store = MemoryStore::new();
        let ticket = host.start(SceneParams::default());
        host.finish_load(&ticket, Ok(map_with_wheel())).unwrap();
        host.set_running(true, &mut store).unwrap();
        assert_eq!(host.tool_key(), Some("pan"));
        assert!(!host.set_tool("line"), "tools are locked while running");
        for _ in 0..30 {
            host.update(1.0 / 60.0, 0.0, &mut store).unwrap();
        }
        let fallen = host.scene().unwrap().parts.get(PartId(7)).unwrap().pos;
        assert!(fallen.y > -100.0, "gravity pulled the wheel down: {fallen:?}");

        host.set_running(false, &mut store).unwrap();
        let scene = host.scene_mut().unwrap();
        assert_eq!(scene.parts.get(PartId(7)).unwrap().pos, Vec2::new(0.0, -100.0));
        let events = scene.events.drain();
        assert!(events.contains(&SceneEvent::SetRunning { running: true }));
        assert!(events.contains(&SceneEvent::SetRunning { running: false }));
        assert_eq!(host.tool_key(), Some("select"));
    }

    #[test]
    fn pointer_input_goes_through_the_camera() {
        let mut host = loaded_host();
        let mut store = MemoryStore::new();
        let scene = host.scene_mut().unwrap();
        let id = scene.ids.next_part();
        scene.insert_part(Part::rect(id, Bounds::from_corners(Vec2::ZERO, Vec2::splat(20.0))));
        let screen = scene.camera.world_to_screen(Vec2::splat(10.0));
        let e = PointerEvent {
            screen,
            ..PointerEvent::at(Vec2::ZERO)
        };
        host.push_input(InputEvent::PointerDown(e));
        host.push_input(InputEvent::PointerUp(e));
        host.update(0.016, 0.0, &mut store).unwrap();
        assert_eq!(host.scene().unwrap().selected(), &[id]);
    }

    #[test]
    fn stop_flushes_pending_edits() {
        let mut host = loaded_host();
        let mut store = MemoryStore::new();
        let scene = host.scene_mut().unwrap();
        let id = scene.ids.next_part();
        scene.insert_part(Part::rect(id, Bounds::from_corners(Vec2::ZERO, Vec2::splat(20.0))));
        host.update(0.016, 0.0, &mut store).unwrap();
        host.stop(&mut store).unwrap();
        assert_eq!(store.save_count(), 1);
        assert!(host.scene().is_none());
    }

    #[test]
    fn pointer_and_keys_wait_for_the_load() {
        let mut host = SceneHost::new(SandboxConfig::default());
        let mut store = MemoryStore::new();
        let ticket = host.start(SceneParams::default());
        let scene = host.scene_mut().unwrap();
        let id = scene.ids.next_part();
        scene.insert_part(Part::rect(id, Bounds::from_corners(Vec2::ZERO, Vec2::splat(20.0))));
        let click = |host: &mut SceneHost| {
            let screen = host.scene().unwrap().camera.world_to_screen(Vec2::splat(10.0));
            let e = PointerEvent {
                screen,
                ..PointerEvent::at(Vec2::ZERO)
            };
            host.push_input(InputEvent::PointerDown(e));
            host.push_input(InputEvent::PointerUp(e));
        };

        click(&mut host);
        host.update(0.016, 0.0, &mut store).unwrap();
        assert!(host.scene().unwrap().selected().is_empty());

        host.finish_load(&ticket, Ok(MapData::default())).unwrap();
        click(&mut host);
        host.update(0.016, 0.1, &mut store).unwrap();
        assert_eq!(host.scene().unwrap().selected(), &[id]);
    }

    #[test]
    fn part_added_during_load_does_not_clobber_saved_ones() {
        use crate::persist::format::{Connection, SerializedJoint, SerializedPhysics};

        let mut host = SceneHost::new(SandboxConfig::default());
        let ticket = host.start(SceneParams::default());
        let scene = host.scene_mut().unwrap();
        let early = scene.ids.next_part();
        scene.insert_part(Part::rect(
            early,
            Bounds::from_corners(Vec2::new(200.0, 0.0), Vec2::new(220.0, 20.0)),
        ));

        let data = MapData {
            objects: vec![
                Part::wheel(PartId(1), Vec2::new(0.0, -100.0), 20.0).to_save_json(),
                Part::line(PartId(2), Vec2::new(0.0, -100.0), Vec2::new(60.0, -100.0))
                    .to_save_json(),
            ],
            physics: Some(SerializedPhysics {
                joints: vec![SerializedJoint {
                    connections: vec![
                        Connection { obj_id: PartId(1), anchor_id: 0 },
                        Connection { obj_id: PartId(2), anchor_id: 0 },
                    ],
                }],
            }),
        };
        assert!(host.finish_load(&ticket, Ok(data)).unwrap());

        let scene = host.scene().unwrap();
        assert_eq!(scene.parts.len(), 3, "early part and both saved parts");
        assert_eq!(scene.parts.get(early).unwrap().part_type(), PartType::Rect);
        let wheel = scene
            .parts
            .iter()
            .find(|p| p.part_type() == PartType::Wheel)
            .unwrap()
            .id;
        assert_ne!(wheel, early);
        assert!(scene.joints.joint_at(wheel, 0).is_some());
        assert!(scene.joints.joint_at(early, 0).is_none());
    }

    #[test]
    fn nothing_is_saved_before_the_load_completes() {
        let mut store = MemoryStore::new();
        let mut host = SceneHost::new(SandboxConfig::default());
        let ticket = host.start(SceneParams::default());
        let scene = host.scene_mut().unwrap();
        let id = scene.ids.next_part();
        scene.insert_part(Part::rect(id, Bounds::from_corners(Vec2::ZERO, Vec2::splat(20.0))));
        host.update(0.016, 0.0, &mut store).unwrap();
        host.update(0.016, 10.0, &mut store).unwrap();
        assert_eq!(store.save_count(), 0, "slow load, idle window long gone");

        host.finish_load(&ticket, Ok(map_with_wheel())).unwrap();
        host.update(0.016, 11.0, &mut store).unwrap();
        host.update(0.016, 14.0, &mut store).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.last().unwrap().objects.len(), 2, "early edit plus loaded wheel");

        let abandoned = host.start(SceneParams::default());
        let scene = host.scene_mut().unwrap();
        let id = scene.ids.next_part();
        scene.insert_part(Part::rect(id, Bounds::from_corners(Vec2::ZERO, Vec2::splat(20.0))));
        host.stop(&mut store).unwrap();
        assert_eq!(store.save_count(), 1, "stopping mid-load saves nothing");
        assert!(!host.finish_load(&abandoned, Ok(MapData::default())).unwrap());
    }

    #[test]
    fn run_waits_for_the_load() {
        let mut store = MemoryStore::new();
        let mut host = SceneHost::new(SandboxConfig::default());
        host.start(SceneParams::default());
        host.set_running(true, &mut store).unwrap();
        assert!(!host.scene().unwrap().is_running());
        assert_eq!(host.tool_key(), Some("select"));
    }
}
