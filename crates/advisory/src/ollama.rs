use crate::{AdvisoryConfig, AdvisoryError, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama HTTP client for local inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(cfg: &AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs()))
            .build()
            .map_err(|e| AdvisoryError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: cfg.base_url().to_string(),
            model: cfg.model().to_string(),
            client,
            timeout_secs: cfg.timeout_secs(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl TextGenerator for OllamaClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdvisoryError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions { temperature: 0.7 },
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                AdvisoryError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                AdvisoryError::Timeout(self.timeout_secs)
            } else {
                AdvisoryError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AdvisoryError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            model: "llama3.2",
            prompt: "hola",
            system: "eres fisio",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.5);
    }

    #[test]
    fn test_unreachable_service_is_an_error() {
        // Port 9 (discard) on loopback is closed on test machines.
        let cfg = AdvisoryConfig::new("http://127.0.0.1:9", "llama3.2", 2).unwrap();
        let client = OllamaClient::new(&cfg).unwrap();

        assert!(client.generate("system", "prompt").is_err());
    }
}
