//! # Fisio Core
//!
//! Clinical record keeping for a physiotherapy practice, stored locally.
//!
//! This crate contains the record model and everything that keeps it consistent:
//! - The in-memory cache that is authoritative for a session
//! - A key-value document store (files on disk, or in memory) holding whole JSON snapshots
//! - Demo and Real sessions, with autosave of every mutation in Real
//! - Export/import of whole-clinic backups
//! - Clinician accounts with hashed credentials
//!
//! **No presentation concerns**: Forms, views and the language-model assistant belong in
//! `fisio-cli` and `fisio-advisory`.

pub mod accounts;
pub mod autosave;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod demo;
pub mod dosage;
pub mod error;
pub mod exchange;
pub mod records;
pub mod session;
pub mod store;

pub use fisio_types::{NonEmptyText, PainLevel, Progress, TextError};

pub use accounts::{ClinicianDirectory, ClinicianProfile, Registration};
pub use autosave::SaveOutcome;
pub use cache::{PatientPatch, PatientRemoval, View};
pub use config::CoreConfig;
pub use error::{RecordError, RecordResult};
pub use exchange::{ExportDocument, PendingImport};
pub use session::{Applied, Environment, EnvironmentSelector, Session};
pub use store::{DocumentKey, DocumentStore, FileStore, MemoryStore};
