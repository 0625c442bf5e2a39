use async_trait::async_trait;
use academy_core::model::ProgressState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::record::StateRecord;

/// Key under which the whole progress record is stored.
pub const STATE_KEY: &str = "neonhack_state_v1";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Flat string key-value store, the persistence model of browser local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads and saves the single progress record kept at [`STATE_KEY`].
///
/// Loading never fails on bad data: an absent, blank or malformed entry
/// yields the default state. Saving always overwrites the whole record.
#[derive(Clone)]
pub struct StateStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl StateStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, STATE_KEY)
    }

    #[must_use]
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Read the stored record, filling defaults for anything missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load(&self) -> Result<ProgressState, StorageError> {
        let raw = self.kv.get_item(&self.key).await?;
        Ok(decode_state(&self.key, raw.as_deref()))
    }

    /// Serialize `state` and overwrite the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the backend write fails.
    pub async fn save(&self, state: &ProgressState) -> Result<(), StorageError> {
        let json = serde_json::to_string(&StateRecord::from_state(state))
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set_item(&self.key, &json).await
    }
}

fn decode_state(key: &str, raw: Option<&str>) -> ProgressState {
    let Some(raw) = raw.filter(|text| !text.trim().is_empty()) else {
        tracing::debug!(key, "no stored progress, starting fresh");
        return ProgressState::default();
    };

    match serde_json::from_str::<StateRecord>(raw) {
        Ok(record) => record.into_state(),
        Err(err) => {
            tracing::warn!(key, error = %err, "stored progress is corrupt, resetting to defaults");
            ProgressState::default()
        }
    }
}

/// Aggregates the key-value backend behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        Self { kv }
    }

    /// State store bound to the default progress key.
    #[must_use]
    pub fn state_store(&self) -> StateStore {
        StateStore::new(Arc::clone(&self.kv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::model::{LessonId, ModuleId, ProgressKey, Quest};

    async fn store_with(raw: Option<&str>) -> StateStore {
        let kv = InMemoryStore::new();
        if let Some(raw) = raw {
            kv.set_item(STATE_KEY, raw).await.unwrap();
        }
        StateStore::new(Arc::new(kv))
    }

    fn assert_default(state: &ProgressState) {
        assert_eq!(state.xp(), 0);
        assert_eq!(state.level(), 1);
        assert!(state.progress().is_empty());
        assert_eq!(state.quests(), [Quest::first_lesson()]);
    }

    #[tokio::test]
    async fn absent_entry_loads_default() {
        let store = store_with(None).await;
        assert_default(&store.load().await.unwrap());
    }

    #[tokio::test]
    async fn empty_entry_loads_default() {
        let store = store_with(Some("")).await;
        assert_default(&store.load().await.unwrap());
    }

    #[tokio::test]
    async fn malformed_entry_loads_default() {
        for raw in ["{ not json", "null", "42", r#"{"xp": -5}"#, r#"{"progress": {"m:a": "yes"}}"#] {
            let store = store_with(Some(raw)).await;
            assert_default(&store.load().await.unwrap());
        }
    }

    #[tokio::test]
    async fn blank_lesson_entry_keeps_rest_of_record() {
        let store = store_with(Some(
            r#"{"xp": 550, "progress": {"m:a": true, "m:": true}, "quests": [{"id": "q-one", "title": "Complete 1 lesson", "xp": 50, "done": true}]}"#,
        ))
        .await;
        let state = store.load().await.unwrap();
        assert_eq!(state.xp(), 550);
        assert_eq!(state.completed_count(), 1);
        assert!(state.quests()[0].is_done());
    }

    #[tokio::test]
    async fn empty_object_fills_every_field() {
        let store = store_with(Some("{}")).await;
        assert_default(&store.load().await.unwrap());
    }

    #[tokio::test]
    async fn stored_level_is_recomputed_from_xp() {
        let store = store_with(Some(r#"{"xp": 410, "level": 9, "progress": {}, "quests": []}"#)).await;
        let state = store.load().await.unwrap();
        assert_eq!(state.level(), 3);
        assert!(state.quests().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_state() {
        let store = store_with(None).await;
        let mut state = ProgressState::default();
        state.mark_complete(ProgressKey::new(ModuleId::new("web"), LessonId::new("xss")));
        state.award_xp(250.0);
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn save_overwrites_whole_record() {
        let kv = Arc::new(InMemoryStore::new());
        let store = StateStore::new(kv.clone());
        store.save(&ProgressState::default()).await.unwrap();

        let raw = kv.get_item(STATE_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["xp"], 0);
        assert_eq!(value["level"], 1);
        assert_eq!(value["progress"], serde_json::json!({}));
        assert_eq!(value["quests"][0]["id"], "q-one");
    }
}
