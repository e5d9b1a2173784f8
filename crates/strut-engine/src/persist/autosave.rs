use crate::core::time::Debounce;
use crate::persist::format::MapData;
use crate::persist::store::{BuildStore, StoreError};

/// Debounced saving: edits call [`Autosave::request`], the frame loop calls
/// [`Autosave::poll`], and pauses or scene changes call [`Autosave::flush`].
#[derive(Debug, Clone)]
pub struct Autosave {
    debounce: Debounce,
    saves: usize,
}

impl Autosave {
    /// `idle`: seconds without edits before a save goes out.
    pub fn new(idle: f64) -> Self {
        Self {
            debounce: Debounce::new(idle),
            saves: 0,
        }
    }

    pub fn request(&mut self, now: f64) {
        self.debounce.request(now);
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Save if the idle window has elapsed. `data` is only built when a save
    /// actually goes out. Returns whether one did.
    pub fn poll(
        &mut self,
        now: f64,
        store: &mut dyn BuildStore,
        data: impl FnOnce() -> MapData,
    ) -> Result<bool, StoreError> {
        if !self.debounce.poll(now) {
            return Ok(false);
        }
        self.write(store, data())
    }

    /// Save now if anything is pending.
    pub fn flush(
        &mut self,
        store: &mut dyn BuildStore,
        data: impl FnOnce() -> MapData,
    ) -> Result<bool, StoreError> {
        if !self.debounce.flush() {
            return Ok(false);
        }
        self.write(store, data())
    }

    fn write(&mut self, store: &mut dyn BuildStore, data: MapData) -> Result<bool, StoreError> {
        log::debug!("autosave: {} objects", data.objects.len());
        store.save(&data)?;
        self.saves += 1;
        Ok(true)
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::store::MemoryStore;

    #[test]
    fn saves_once_after_idle_window() {
        let mut store = MemoryStore::new();
        let mut autosave = Autosave::new(1.0);
        autosave.request(0.0);
        autosave.request(0.5);
        assert!(!autosave.poll(1.2, &mut store, MapData::default).unwrap());
        assert!(autosave.poll(1.5, &mut store, MapData::default).unwrap());
        assert!(!autosave.poll(9.0, &mut store, MapData::default).unwrap());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn flush_saves_immediately_only_when_pending() {
        let mut store = MemoryStore::new();
        let mut autosave = Autosave::new(10.0);
        assert!(!autosave.flush(&mut store, MapData::default).unwrap());
        autosave.request(0.0);
        assert!(autosave.flush(&mut store, MapData::default).unwrap());
        assert_eq!(store.save_count(), 1);
        assert_eq!(autosave.save_count(), 1);
    }

    #[test]
    fn rejection_is_surfaced() {
        let mut store = MemoryStore::rejecting("offline");
        let mut autosave = Autosave::new(0.0);
        autosave.request(0.0);
        let err = autosave.poll(0.0, &mut store, MapData::default).unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(autosave.save_count(), 0);
    }
}
