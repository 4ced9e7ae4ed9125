//! Persistence of per-timer state behind a key-value backend.

use crate::model::{PersistedState, TimerDefinition};
use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Failure to write the persisted state.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backend cannot be reached at all (e.g. storage disabled).
    Unavailable,
    Serialize(String),
    Write(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "Persistent storage is unavailable"),
            StoreError::Serialize(e) => write!(f, "Failed to serialize timer state: {}", e),
            StoreError::Write(e) => write!(f, "Failed to write timer state: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Byte-string store addressed by key, such as the browser's `localStorage`.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory backend. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Owns the state table of one widget instance and its backing store.
#[derive(Debug)]
pub struct StateStore<S> {
    backend: S,
    key: String,
    state: PersistedState,
}

impl<S: KeyValueStore> StateStore<S> {
    /// Read the persisted state under `key` and backfill defaults for every
    /// definition. Missing or corrupt values start from an empty table.
    pub fn load(backend: S, key: impl Into<String>, definitions: &[TimerDefinition]) -> Self {
        let key = key.into();
        let mut state = match backend.get_item(&key) {
            Some(raw) => serde_json::from_str::<PersistedState>(&raw).unwrap_or_else(|e| {
                debug!("Discarding unreadable state under '{}': {}", key, e);
                PersistedState::default()
            }),
            None => PersistedState::default(),
        };

        let added = state.backfill(definitions);
        info!(
            "Loaded state for {} timers under '{}' ({} new)",
            definitions.len(),
            key,
            added
        );

        Self {
            backend,
            key,
            state,
        }
    }

    /// Overwrite the whole persisted document.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(&self.state).map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.backend.set_item(&self.key, &raw)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PersistedState {
        &mut self.state
    }
}
