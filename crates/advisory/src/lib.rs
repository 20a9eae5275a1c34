//! # Fisio Advisory
//!
//! Optional assistant text for clinicians and patients, produced by a local language model.
//!
//! The service is treated as an opaque `generate(prompt, context) -> text` collaborator.
//! It never blocks or fails a clinical data flow: requests can run on a background thread,
//! their results can be dropped unread, and every failure resolves to a fixed fallback
//! sentence.

mod advisor;
mod config;
mod error;
mod generator;
mod ollama;
pub mod prompt;

pub use advisor::{Advisor, PendingAdvice};
pub use config::{AdvisoryConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
pub use error::AdvisoryError;
pub use generator::{MockGenerator, TextGenerator};
pub use ollama::OllamaClient;
pub use prompt::{AssistantRole, JointAngles, PatientSnapshot};
