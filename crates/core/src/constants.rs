//! Constants used throughout the Fisio core crate.
//!
//! Storage key names and filenames live here so the on-disk layout stays consistent
//! across the store, the exchange format, and the command-line front end.

/// Default directory for local document storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "fisio_data";

/// Application version stamped into exports when none is configured.
pub const DEFAULT_APP_VERSION: &str = "v2.6.5-Clinical";

/// Store key holding the patient collection.
pub const PATIENTS_KEY: &str = "fisio_sevilla_patients";

/// Store key holding the appointment collection.
pub const APPOINTMENTS_KEY: &str = "fisio_sevilla_appointments";

/// Store key holding the registered clinician accounts.
pub const AUTH_USERS_KEY: &str = "fisio_sevilla_auth_users";

/// Extension appended to a store key to form its document filename.
pub const DOCUMENT_EXTENSION: &str = "json";

/// PBKDF2-SHA256 rounds applied to clinician credentials.
pub const CREDENTIAL_ITERATIONS: u32 = 210_000;

/// Salt length in bytes for clinician credentials.
pub const CREDENTIAL_SALT_LENGTH: usize = 16;

/// Derived hash length in bytes for clinician credentials.
pub const CREDENTIAL_HASH_LENGTH: usize = 32;

/// Prefix marking a hashed credential; anything else is a legacy clear-text value.
pub const CREDENTIAL_SCHEME: &str = "pbkdf2-sha256";
