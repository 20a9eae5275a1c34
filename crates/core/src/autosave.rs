//! Autosave: keeps the document store in step with the cache.
//!
//! Every mutation in a Real session writes the full snapshot of each touched collection, in
//! the order the mutations happened. A failed write is logged and reported, and the cache
//! stays authoritative. The failed key stays pending and is written again by every later
//! save until it succeeds.

use crate::cache::RecordCache;
use crate::store::{save_collection, DocumentKey, DocumentStore};
use crate::RecordResult;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Result of one snapshot write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { at: DateTime<Utc> },
    /// Session does not persist (Demo).
    Skipped,
    Failed { key: DocumentKey, error: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Autosave {
    enabled: bool,
    last_saved: Option<DateTime<Utc>>,
    last_failure: Option<String>,
    /// Keys whose last write failed, in save order.
    pending: BTreeSet<DocumentKey>,
}

impl Autosave {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            last_saved: None,
            last_failure: None,
            pending: BTreeSet::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::enabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Time of the last fully successful save.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Set while any collection is out of step with the store.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Collections still waiting for a successful write.
    pub fn pending_keys(&self) -> Vec<DocumentKey> {
        self.pending.iter().copied().collect()
    }

    /// Write the snapshots of `keys` after a mutation.
    pub fn after_mutation(
        &mut self,
        store: &dyn DocumentStore,
        cache: &RecordCache,
        keys: &[DocumentKey],
    ) -> SaveOutcome {
        if !self.enabled {
            return SaveOutcome::Skipped;
        }
        self.write(store, cache, keys)
    }

    /// Write every session collection regardless of what changed.
    pub fn force_save(&mut self, store: &dyn DocumentStore, cache: &RecordCache) -> SaveOutcome {
        if !self.enabled {
            tracing::info!("force save ignored: session does not persist");
            return SaveOutcome::Skipped;
        }
        let outcome = self.write(store, cache, &DocumentKey::SESSION);
        if outcome.is_saved() {
            tracing::info!("all collections saved");
        }
        outcome
    }

    fn write(
        &mut self,
        store: &dyn DocumentStore,
        cache: &RecordCache,
        keys: &[DocumentKey],
    ) -> SaveOutcome {
        let mut due = std::mem::take(&mut self.pending);
        due.extend(keys.iter().copied().filter(|k| DocumentKey::SESSION.contains(k)));

        let mut first_failure = None;
        for key in due {
            match write_snapshot(store, cache, key) {
                Ok(()) => tracing::debug!(key = %key, "snapshot saved"),
                Err(e) => {
                    tracing::warn!(key = %key, "autosave failed, edits kept in memory only: {}", e);
                    self.pending.insert(key);
                    first_failure.get_or_insert((key, e.to_string()));
                }
            }
        }

        if let Some((key, error)) = first_failure {
            self.last_failure = Some(error.clone());
            return SaveOutcome::Failed { key, error };
        }

        let at = Utc::now();
        self.last_saved = Some(at);
        self.last_failure = None;
        SaveOutcome::Saved { at }
    }
}

fn write_snapshot(
    store: &dyn DocumentStore,
    cache: &RecordCache,
    key: DocumentKey,
) -> RecordResult<()> {
    match key {
        DocumentKey::Patients => save_collection(store, key, cache.patients().as_slice()),
        DocumentKey::Appointments => save_collection(store, key, cache.appointments().as_slice()),
        // Clinician accounts are written by the directory, not the session cache.
        DocumentKey::AuthUsers => Ok(()),
    }
}
