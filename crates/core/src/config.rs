//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the session and the
//! clinician directory as `Arc<CoreConfig>`. Nothing in the core reads environment variables
//! while handling a mutation; the helpers below take the raw `Option<String>` values so the
//! caller decides where they come from.

use crate::constants::{CREDENTIAL_ITERATIONS, DEFAULT_APP_VERSION, DEFAULT_DATA_DIR};
use crate::{NonEmptyText, RecordError, RecordResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    app_version: NonEmptyText,
    credential_iterations: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `credential_iterations` must be non-zero; it only affects newly written credentials,
    /// since every stored hash records its own round count.
    pub fn new(
        data_dir: PathBuf,
        app_version: NonEmptyText,
        credential_iterations: u32,
    ) -> RecordResult<Self> {
        if credential_iterations == 0 {
            return Err(RecordError::InvalidInput(
                "credential_iterations must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            app_version,
            credential_iterations,
        })
    }

    /// Configuration with every value at its default, rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            app_version: default_app_version(),
            credential_iterations: CREDENTIAL_ITERATIONS,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn app_version(&self) -> &str {
        self.app_version.as_str()
    }

    pub fn credential_iterations(&self) -> u32 {
        self.credential_iterations
    }
}

fn default_app_version() -> NonEmptyText {
    NonEmptyText::new(DEFAULT_APP_VERSION).expect("default app version is non-empty")
}

/// Resolve the data directory from an optional override value.
///
/// Empty or whitespace-only values fall back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Resolve the application version from an optional override value.
pub fn app_version_from_env_value(value: Option<String>) -> NonEmptyText {
    value
        .and_then(|v| NonEmptyText::new(v).ok())
        .unwrap_or_else(default_app_version)
}

/// Parse the credential round count. `None` or blank selects [`CREDENTIAL_ITERATIONS`].
pub fn credential_iterations_from_env_value(value: Option<String>) -> RecordResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(CREDENTIAL_ITERATIONS),
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            RecordError::InvalidInput(format!("credential iterations must be a number: {raw}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_defaults_when_blank() {
        assert_eq!(
            data_dir_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(data_dir_from_env_value(None), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            data_dir_from_env_value(Some("/var/fisio".into())),
            PathBuf::from("/var/fisio")
        );
    }

    #[test]
    fn test_app_version_falls_back_to_default() {
        assert_eq!(app_version_from_env_value(None).as_str(), DEFAULT_APP_VERSION);
        assert_eq!(
            app_version_from_env_value(Some("v3.0".into())).as_str(),
            "v3.0"
        );
    }

    #[test]
    fn test_credential_iterations_parsing() {
        assert_eq!(
            credential_iterations_from_env_value(None).unwrap(),
            CREDENTIAL_ITERATIONS
        );
        assert_eq!(
            credential_iterations_from_env_value(Some("1000".into())).unwrap(),
            1000
        );
        assert!(matches!(
            credential_iterations_from_env_value(Some("many".into())),
            Err(RecordError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_new_rejects_zero_iterations() {
        let err = CoreConfig::new(
            PathBuf::from("data"),
            NonEmptyText::new("v1").unwrap(),
            0,
        )
        .expect_err("zero iterations should be rejected");
        assert!(matches!(err, RecordError::InvalidInput(_)));
    }
}
