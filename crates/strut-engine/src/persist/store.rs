use crate::persist::format::MapData;

/// Failures at the persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Save rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error("No active scene")]
    NoScene,
}

/// Where saved maps and builds go. Implemented by the host environment.
pub trait BuildStore {
    fn save(&mut self, data: &MapData) -> Result<(), StoreError>;
}

/// In-memory store: keeps every save. Used natively and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saves: Vec<MapData>,
    reject_with: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose saves always fail with `message`.
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            saves: Vec::new(),
            reject_with: Some(message.into()),
        }
    }

    pub fn last(&self) -> Option<&MapData> {
        self.saves.last()
    }

    pub fn save_count(&self) -> usize {
        self.saves.len()
    }
}

impl BuildStore for MemoryStore {
    fn save(&mut self, data: &MapData) -> Result<(), StoreError> {
        if let Some(message) = &self.reject_with {
            return Err(StoreError::Rejected(message.clone()));
        }
        self.saves.push(data.clone());
        Ok(())
    }
}
