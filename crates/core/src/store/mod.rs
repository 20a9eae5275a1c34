//! Local document store.
//!
//! Durable key-value persistence for a small fixed set of JSON documents. A document is
//! always written whole; the store never sees partial updates. Reads of a key that was never
//! written return `Ok(None)`.
//!
//! Two implementations are provided:
//! - [`FileStore`]: one `<key>.json` file per key under the data directory
//! - [`MemoryStore`]: in-process map, switchable to "unavailable" for failure handling

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::constants::{APPOINTMENTS_KEY, AUTH_USERS_KEY, PATIENTS_KEY};
use crate::{RecordError, RecordResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Logical document names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKey {
    Patients,
    Appointments,
    AuthUsers,
}

impl DocumentKey {
    /// Keys owned by a session cache, in save order.
    pub const SESSION: [DocumentKey; 2] = [DocumentKey::Patients, DocumentKey::Appointments];

    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentKey::Patients => PATIENTS_KEY,
            DocumentKey::Appointments => APPOINTMENTS_KEY,
            DocumentKey::AuthUsers => AUTH_USERS_KEY,
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable key-value medium holding whole JSON documents.
pub trait DocumentStore: Send + Sync {
    /// Previously stored document for `key`, or `None` if it was never written.
    fn load(&self, key: DocumentKey) -> RecordResult<Option<Value>>;

    /// Overwrite the document for `key`. Readers observe either the old or the new document.
    fn save(&self, key: DocumentKey, document: &Value) -> RecordResult<()>;
}

/// Serialise `items` as a JSON array and save it under `key`.
pub fn save_collection<T: Serialize>(
    store: &dyn DocumentStore,
    key: DocumentKey,
    items: &[T],
) -> RecordResult<()> {
    let document = serde_json::to_value(items).map_err(RecordError::Serialization)?;
    store.save(key, &document)
}

/// Records decoded from one stored collection.
#[derive(Debug)]
pub struct LoadedCollection<T> {
    pub items: Vec<T>,
    /// One message per record that could not be decoded.
    pub skipped: Vec<String>,
}

/// Load the array stored under `key`, decoding records one by one.
///
/// An absent key is an empty collection. Records that fail to decode are skipped with a
/// warning and listed in [`LoadedCollection::skipped`]; a document that is not an array at
/// all is `CorruptDocument`.
pub fn load_collection_reporting<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: DocumentKey,
) -> RecordResult<LoadedCollection<T>> {
    let Some(document) = store.load(key)? else {
        return Ok(LoadedCollection {
            items: Vec::new(),
            skipped: Vec::new(),
        });
    };

    let records: Vec<Value> =
        serde_json::from_value(document).map_err(|source| RecordError::CorruptDocument {
            key: key.to_string(),
            source,
        })?;

    let mut items = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<T>(record) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(key = %key, index, "skipping malformed record: {}", e);
                skipped.push(format!("{key}: record {index} skipped: {e}"));
            }
        }
    }
    Ok(LoadedCollection { items, skipped })
}

/// [`load_collection_reporting`] without the skip list; skipped records are only logged.
pub fn load_collection<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: DocumentKey,
) -> RecordResult<Vec<T>> {
    load_collection_reporting(store, key).map(|loaded| loaded.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Appointment;
    use serde_json::json;

    #[test]
    fn test_absent_key_loads_as_empty_collection() {
        let store = MemoryStore::new();
        let items: Vec<Appointment> = load_collection(&store, DocumentKey::Appointments).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let store = MemoryStore::new();
        store
            .save(
                DocumentKey::Appointments,
                &json!([
                    {"id": "c1", "patientId": "p1", "date": "2024-05-01", "time": "10:00", "type": "Revisión"},
                    {"patientId": "missing-id"},
                    42
                ]),
            )
            .unwrap();

        let loaded: LoadedCollection<Appointment> =
            load_collection_reporting(&store, DocumentKey::Appointments).unwrap();

        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].id, "c1");
        assert_eq!(loaded.skipped.len(), 2);
        assert!(loaded.skipped[0].contains("record 1"));
        assert!(loaded.skipped[1].contains("record 2"));
    }

    #[test]
    fn test_non_array_document_is_corrupt() {
        let store = MemoryStore::new();
        store
            .save(DocumentKey::Patients, &json!({"patients": []}))
            .unwrap();

        let err = load_collection::<Appointment>(&store, DocumentKey::Patients)
            .expect_err("object document should be rejected");
        assert!(matches!(err, RecordError::CorruptDocument { .. }));
    }

    #[test]
    fn test_keys_use_clinic_storage_names() {
        assert_eq!(DocumentKey::Patients.as_str(), "fisio_sevilla_patients");
        assert_eq!(DocumentKey::Appointments.as_str(), "fisio_sevilla_appointments");
        assert_eq!(DocumentKey::AuthUsers.as_str(), "fisio_sevilla_auth_users");
    }
}
