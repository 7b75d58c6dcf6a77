use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use portal_persistence::{load_json, save_json, KeyValueStore, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};

use crate::clock::TokioClock;
use crate::ports::Clock;

/// What the visitor has already seen, persisted across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryRecord {
    pub gate_opened: bool,
    /// Distinct routes in first-visit order.
    pub pages_visited: Vec<String>,
    pub animations_reduced: bool,
    pub last_visit: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    pub fn has_visited(&self, route: &str) -> bool {
        self.pages_visited.iter().any(|p| p == route)
    }
}

/// Read-modify-write access to the [`MemoryRecord`] under one storage key.
pub struct AnimationMemory {
    store: Arc<dyn KeyValueStore>,
    key: String,
    threshold: usize,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl AnimationMemory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: portal_config::MEMORY_STORAGE_KEY.to_string(),
            threshold: portal_config::REDUCE_ANIMATIONS_AFTER_VISITS,
            clock: Arc::new(TokioClock),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Reduction applies once the distinct visit count exceeds `threshold`.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Current record. An absent record is initialised; a corrupt one is reset.
    pub fn read(&self) -> Result<MemoryRecord, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load_or_init()
    }

    pub fn mark_gate_opened(&self) -> Result<MemoryRecord, StorageError> {
        self.update(|record| record.gate_opened = true)
    }

    /// Adds `route` if unseen and stamps the visit time. Repeat visits only
    /// refresh the timestamp.
    pub fn record_visit(&self, route: &str) -> Result<MemoryRecord, StorageError> {
        let threshold = self.threshold;
        let now = self.clock.utc_now();
        self.update(|record| {
            if !record.has_visited(route) {
                record.pages_visited.push(route.to_string());
            }
            record.animations_reduced = record.pages_visited.len() > threshold;
            record.last_visit = Some(now);
        })
    }

    pub fn has_visited(&self, route: &str) -> Result<bool, StorageError> {
        Ok(self.read()?.has_visited(route))
    }

    pub fn should_reduce_animations(&self) -> Result<bool, StorageError> {
        Ok(self.read()?.animations_reduced)
    }

    pub fn reset(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.remove(&self.key)?;
        tracing::info!(key = %self.key, "animation memory reset");
        Ok(())
    }

    fn update(&self, mutate: impl FnOnce(&mut MemoryRecord)) -> Result<MemoryRecord, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = self.load_or_init()?;
        mutate(&mut record);
        save_json(self.store.as_ref(), &self.key, &record)?;
        Ok(record)
    }

    fn load_or_init(&self) -> Result<MemoryRecord, StorageError> {
        match load_json::<MemoryRecord>(self.store.as_ref(), &self.key) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => {
                let record = MemoryRecord::default();
                save_json(self.store.as_ref(), &self.key, &record)?;
                Ok(record)
            }
            Err(e) if e.kind() == StorageErrorKind::Codec => {
                tracing::warn!(key = %self.key, error = %e, "corrupt animation memory, resetting");
                let record = MemoryRecord::default();
                save_json(self.store.as_ref(), &self.key, &record)?;
                Ok(record)
            }
            Err(e) => Err(e),
        }
    }
}
