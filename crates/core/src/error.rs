/// Errors produced by the record core.
///
/// `DuplicateId` and `NotFound` are contract violations by the caller. `StorageUnavailable`
/// and `CorruptDocument` come from the local document store and are expected to be degraded
/// (empty state on load, in-memory only on save) rather than surfaced as fatal.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{collection} already contains an entry with id {id}")]
    DuplicateId { collection: &'static str, id: String },
    #[error("{collection} has no entry with id {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("storage unavailable for {key}: {source}")]
    StorageUnavailable {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stored document {key} is corrupt: {source}")]
    CorruptDocument {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),

    #[error("import rejected: {0}")]
    ImportValidationFailed(String),

    #[error("professional id {0} is already registered")]
    DuplicateProfessionalId(String),
    #[error("professional id or password is incorrect")]
    InvalidCredentials,
    #[error("no clinician registered with professional id {0}")]
    UnknownClinician(String),
    #[error("security answer does not match")]
    SecurityAnswerMismatch,

    #[error(transparent)]
    Text(#[from] fisio_types::TextError),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
