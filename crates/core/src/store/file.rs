use crate::constants::DOCUMENT_EXTENSION;
use crate::store::{DocumentKey, DocumentStore};
use crate::{CoreConfig, RecordError, RecordResult};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Document store backed by one JSON file per key.
///
/// Writes go to a temporary file in the same directory which is then renamed over the
/// target, so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> RecordResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(RecordError::StorageDirCreation)?;
        Ok(Self { root })
    }

    pub fn from_config(cfg: &CoreConfig) -> RecordResult<Self> {
        Self::new(cfg.data_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: DocumentKey) -> PathBuf {
        self.root
            .join(format!("{}.{}", key.as_str(), DOCUMENT_EXTENSION))
    }
}

fn unavailable(key: DocumentKey, source: io::Error) -> RecordError {
    RecordError::StorageUnavailable {
        key: key.to_string(),
        source,
    }
}

impl DocumentStore for FileStore {
    fn load(&self, key: DocumentKey) -> RecordResult<Option<Value>> {
        let contents = match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unavailable(key, e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| RecordError::CorruptDocument {
                key: key.to_string(),
                source,
            })
    }

    fn save(&self, key: DocumentKey, document: &Value) -> RecordResult<()> {
        let bytes = serde_json::to_vec_pretty(document).map_err(RecordError::Serialization)?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| unavailable(key, e))?;
        tmp.write_all(&bytes).map_err(|e| unavailable(key, e))?;
        tmp.as_file().sync_all().map_err(|e| unavailable(key, e))?;
        tmp.persist(self.path_for(key))
            .map_err(|e| unavailable(key, e.error))?;

        tracing::debug!(key = %key, bytes = bytes.len(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_absent_key_returns_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path()).expect("store should open");

        let loaded = store.load(DocumentKey::Patients).expect("load should succeed");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path()).expect("store should open");
        let document = json!([{"id": "p1", "name": "Ana"}]);

        store
            .save(DocumentKey::Patients, &document)
            .expect("save should succeed");

        assert!(store.path_for(DocumentKey::Patients).exists());
        let loaded = store.load(DocumentKey::Patients).expect("load should succeed");
        assert_eq!(loaded, Some(document));
    }

    #[test]
    fn test_save_overwrites_whole_document() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path()).expect("store should open");

        store
            .save(DocumentKey::Appointments, &json!([1, 2, 3]))
            .expect("first save should succeed");
        store
            .save(DocumentKey::Appointments, &json!([]))
            .expect("second save should succeed");

        let loaded = store.load(DocumentKey::Appointments).unwrap();
        assert_eq!(loaded, Some(json!([])));

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(leftovers.len(), 1, "temporary files should not remain");
    }

    #[test]
    fn test_unparseable_file_is_corrupt_document() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path()).expect("store should open");
        fs::write(store.path_for(DocumentKey::Patients), "{not json").unwrap();

        let err = store
            .load(DocumentKey::Patients)
            .expect_err("corrupt file should fail to load");
        assert!(matches!(err, RecordError::CorruptDocument { .. }));
    }

    #[test]
    fn test_save_into_missing_directory_is_unavailable() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("data");
        let store = FileStore::new(&root).expect("store should open");
        fs::remove_dir_all(&root).unwrap();

        let err = store
            .save(DocumentKey::Patients, &json!([]))
            .expect_err("save should fail without a directory");
        assert!(matches!(err, RecordError::StorageUnavailable { .. }));
    }
}
