use crate::store::{DocumentKey, DocumentStore};
use crate::{RecordError, RecordResult};
use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-process document store.
///
/// Documents are kept as serialised JSON text so loads go through the same parse step as
/// the file store. Every successful save is appended to a write log.
#[derive(Debug)]
pub struct MemoryStore {
    documents: Mutex<HashMap<DocumentKey, String>>,
    writes: Mutex<Vec<DocumentKey>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// When `false`, every load and save fails with `StorageUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Store raw text under `key` without validation.
    pub fn insert_raw(&self, key: DocumentKey, raw: impl Into<String>) -> RecordResult<()> {
        self.documents
            .lock()
            .map_err(|_| poisoned(key))?
            .insert(key, raw.into());
        Ok(())
    }

    /// Raw text currently stored under `key`.
    pub fn raw(&self, key: DocumentKey) -> Option<String> {
        self.documents
            .lock()
            .ok()
            .and_then(|documents| documents.get(&key).cloned())
    }

    /// Keys of successful saves, in the order they were applied.
    pub fn writes(&self) -> Vec<DocumentKey> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    fn ensure_available(&self, key: DocumentKey) -> RecordResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RecordError::StorageUnavailable {
                key: key.to_string(),
                source: io::Error::other("storage disabled"),
            })
        }
    }
}

fn poisoned(key: DocumentKey) -> RecordError {
    RecordError::StorageUnavailable {
        key: key.to_string(),
        source: io::Error::other("memory store lock poisoned"),
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, key: DocumentKey) -> RecordResult<Option<Value>> {
        self.ensure_available(key)?;

        let raw = self
            .documents
            .lock()
            .map_err(|_| poisoned(key))?
            .get(&key)
            .cloned();

        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|source| RecordError::CorruptDocument {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn save(&self, key: DocumentKey, document: &Value) -> RecordResult<()> {
        self.ensure_available(key)?;

        let raw = serde_json::to_string(document).map_err(RecordError::Serialization)?;
        self.documents
            .lock()
            .map_err(|_| poisoned(key))?
            .insert(key, raw);
        self.writes.lock().map_err(|_| poisoned(key))?.push(key);
        Ok(())
    }
}
