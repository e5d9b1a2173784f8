use serde::Serialize;

use crate::api::types::PartId;

/// Notifications of committed scene state changes, for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SceneEvent {
    SetSelected { ids: Vec<PartId> },
    SetTool { key: String },
    SetRunning { running: bool },
    SetGridSnapping { enabled: bool },
    MapLoaded { parts: usize },
    ShowFlash { message: String },
    #[serde(rename = "polygon:start")]
    PolygonStart,
    #[serde(rename = "polygon:end")]
    PolygonEnd,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u32);

type Listener = Box<dyn FnMut(&SceneEvent)>;

/// Observer list plus a drainable queue for consumers that poll.
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    queue: Vec<SceneEvent>,
    next_listener: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            queue: Vec::with_capacity(16),
            next_listener: 1,
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SceneEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// Notify listeners and queue the event.
    pub fn emit(&mut self, event: SceneEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        self.queue.push(event);
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> &[SceneEvent] {
        &self.queue
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_see_events_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = seen.clone();
        let id = bus.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        bus.emit(SceneEvent::SetRunning { running: true });
        assert!(bus.unsubscribe(id));
        bus.emit(SceneEvent::SetRunning { running: false });
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(bus.drain().len(), 2, "queue keeps everything");
        assert!(bus.pending().is_empty());
    }

    #[test]
    fn events_serialize_with_type_tags() {
        let json = serde_json::to_string(&SceneEvent::SetSelected {
            ids: vec![PartId(3)],
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"setSelected","ids":[3]}"#);
        let json = serde_json::to_string(&SceneEvent::PolygonStart).unwrap();
        assert_eq!(json, r#"{"type":"polygon:start"}"#);
    }
}
