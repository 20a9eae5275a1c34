//! Language-model service configuration, resolved once at startup.

use crate::AdvisoryError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryConfig {
    base_url: String,
    model: String,
    timeout_secs: u64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AdvisoryConfig {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, AdvisoryError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AdvisoryError::InvalidConfig(format!(
                "base url must be http(s): {base_url}"
            )));
        }
        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(AdvisoryError::InvalidConfig("model must not be empty".into()));
        }
        if timeout_secs == 0 {
            return Err(AdvisoryError::InvalidConfig(
                "timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            base_url,
            model,
            timeout_secs,
        })
    }

    /// Build from raw environment values; `None` or blank picks each default.
    pub fn from_env_values(
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<Self, AdvisoryError> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let timeout_secs = match non_blank(timeout_secs) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AdvisoryError::InvalidConfig(format!("timeout must be whole seconds: {raw}"))
            })?,
        };

        Self::new(
            non_blank(base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            non_blank(model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}
