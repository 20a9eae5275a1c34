//! Session lifecycle.
//!
//! A session starts unselected. Choosing an environment consumes the
//! [`EnvironmentSelector`] and produces a [`Session`] that owns the cache for its whole
//! lifetime:
//!
//! - **Demo** seeds the fixed sample dataset and never writes to the store
//! - **Real** hydrates every collection from the store and autosaves each mutation
//!
//! [`Session::logout`] drops the cache and hands back a fresh selector. Demo and Real
//! sessions never share cache state.

use crate::accounts::ClinicianDirectory;
use crate::autosave::{Autosave, SaveOutcome};
use crate::cache::{PatientPatch, PatientRemoval, RecordCache, View};
use crate::catalog::ExerciseCatalog;
use crate::demo::demo_dataset;
use crate::exchange::{parse_import, ExportDocument, PendingImport};
use crate::records::{Appointment, ClinicalNote, Exercise, Patient};
use crate::store::{load_collection_reporting, DocumentKey, DocumentStore};
use crate::{CoreConfig, RecordResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Disposable sample data; nothing is persisted.
    Demo,
    /// Genuine records backed by the document store.
    Real,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Demo => f.write_str("demo"),
            Environment::Real => f.write_str("real"),
        }
    }
}

/// Result of a mutation: the affected value and what happened when it was saved.
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub value: T,
    pub save: SaveOutcome,
}

// ============================================================================
// UNSELECTED STATE
// ============================================================================

/// No environment chosen yet. Holds only configuration and the store handle.
pub struct EnvironmentSelector {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl EnvironmentSelector {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    /// Clinician accounts are available before any environment is chosen.
    pub fn clinicians(&self) -> ClinicianDirectory {
        ClinicianDirectory::new(self.cfg.clone(), self.store.clone())
    }

    /// Start a session in `environment`.
    ///
    /// Never fails: unreadable stored collections start empty, and they are listed in
    /// [`Session::hydration_warnings`] together with any single records that were skipped.
    pub fn select(self, environment: Environment) -> Session {
        let mut warnings = Vec::new();

        let (cache, autosave) = match environment {
            Environment::Demo => {
                let today = Utc::now().format("%Y-%m-%d").to_string();
                let cache = match demo_dataset(&today) {
                    Ok((patients, appointments)) => RecordCache::hydrate(patients, appointments),
                    Err(e) => {
                        tracing::warn!("demo dataset unavailable, starting empty: {}", e);
                        warnings.push(e.to_string());
                        RecordCache::new()
                    }
                };
                (cache, Autosave::disabled())
            }
            Environment::Real => {
                let store = self.store.as_ref();
                let patients = hydrate_or_empty(store, DocumentKey::Patients, &mut warnings);
                let appointments =
                    hydrate_or_empty(store, DocumentKey::Appointments, &mut warnings);
                (
                    RecordCache::hydrate(patients, appointments),
                    Autosave::enabled(),
                )
            }
        };

        tracing::info!(
            environment = %environment,
            patients = cache.patients().len(),
            appointments = cache.appointments().len(),
            "session started"
        );

        Session {
            cfg: self.cfg,
            store: self.store,
            environment,
            cache,
            catalog: ExerciseCatalog::with_defaults(),
            autosave,
            hydration_warnings: warnings,
        }
    }
}

fn hydrate_or_empty<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: DocumentKey,
    warnings: &mut Vec<String>,
) -> Vec<T> {
    match load_collection_reporting(store, key) {
        Ok(loaded) => {
            warnings.extend(loaded.skipped);
            loaded.items
        }
        Err(e) => {
            tracing::warn!(key = %key, "starting with an empty collection: {}", e);
            warnings.push(format!("{key}: {e}"));
            Vec::new()
        }
    }
}

// ============================================================================
// ACTIVE SESSION
// ============================================================================

/// Active Demo or Real session. The single owner of the record cache.
pub struct Session {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
    environment: Environment,
    cache: RecordCache,
    catalog: ExerciseCatalog,
    autosave: Autosave,
    hydration_warnings: Vec<String>,
}

impl Session {
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_persistent(&self) -> bool {
        self.autosave.is_enabled()
    }

    /// Problems met while loading stored collections.
    pub fn hydration_warnings(&self) -> &[String] {
        &self.hydration_warnings
    }

    pub fn clinicians(&self) -> ClinicianDirectory {
        ClinicianDirectory::new(self.cfg.clone(), self.store.clone())
    }

    /// End the session, discarding the cache.
    pub fn logout(self) -> EnvironmentSelector {
        tracing::info!(environment = %self.environment, "session closed");
        EnvironmentSelector {
            cfg: self.cfg,
            store: self.store,
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn patients(&self) -> &[Patient] {
        self.cache.patients().as_slice()
    }

    pub fn appointments(&self) -> &[Appointment] {
        self.cache.appointments().as_slice()
    }

    pub fn patient(&self, id: &str) -> RecordResult<&Patient> {
        self.cache.patient(id)
    }

    pub fn appointments_for<'a>(
        &'a self,
        patient_id: &'a str,
    ) -> impl Iterator<Item = &'a Appointment> + 'a {
        self.cache.appointments_for(patient_id)
    }

    pub fn appointments_on<'a>(&'a self, date: &'a str) -> impl Iterator<Item = &'a Appointment> + 'a {
        self.cache.appointments_on(date)
    }

    pub fn selected_patient(&self) -> Option<&Patient> {
        self.cache.selected_patient()
    }

    pub fn view(&self) -> View {
        self.cache.view()
    }

    pub fn catalog(&self) -> &ExerciseCatalog {
        &self.catalog
    }

    /// Catalog edits are session-local and never saved.
    pub fn catalog_mut(&mut self) -> &mut ExerciseCatalog {
        &mut self.catalog
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn select_patient(&mut self, id: &str) -> RecordResult<&Patient> {
        self.cache.select_patient(id)
    }

    pub fn close_patient(&mut self) {
        self.cache.close_patient();
    }

    pub fn set_view(&mut self, view: View) -> RecordResult<()> {
        self.cache.set_view(view)
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    pub fn add_patient(&mut self, patient: Patient) -> RecordResult<Applied<Patient>> {
        let (added, key) = self.cache.add_patient(patient)?;
        let value = added.clone();
        let save = self.persist(&[key]);
        Ok(Applied { value, save })
    }

    pub fn update_patient(
        &mut self,
        id: &str,
        patch: PatientPatch,
    ) -> RecordResult<Applied<Patient>> {
        let (updated, key) = self.cache.update_patient(id, patch)?;
        let value = updated.clone();
        let save = self.persist(&[key]);
        Ok(Applied { value, save })
    }

    /// Delete a patient and cascade to its appointments.
    pub fn remove_patient(&mut self, id: &str) -> RecordResult<Applied<PatientRemoval>> {
        let (removal, touched) = self.cache.remove_patient(id)?;
        tracing::info!(
            patient_id = %removal.patient.id,
            appointments_removed = removal.appointments_removed,
            "patient removed"
        );
        let save = self.persist(&touched);
        Ok(Applied {
            value: removal,
            save,
        })
    }

    pub fn add_note(
        &mut self,
        patient_id: &str,
        note: ClinicalNote,
    ) -> RecordResult<Applied<Patient>> {
        let (updated, key) = self.cache.add_note(patient_id, note)?;
        let value = updated.clone();
        let save = self.persist(&[key]);
        Ok(Applied { value, save })
    }

    pub fn assign_exercises(
        &mut self,
        patient_id: &str,
        exercises: &[Exercise],
    ) -> RecordResult<Applied<Patient>> {
        let (updated, key) = self.cache.assign_exercises(patient_id, exercises)?;
        let value = updated.clone();
        let save = self.persist(&[key]);
        Ok(Applied { value, save })
    }

    /// Assign copies of the named catalog exercises.
    pub fn assign_from_catalog(
        &mut self,
        patient_id: &str,
        exercise_ids: &[&str],
    ) -> RecordResult<Applied<Patient>> {
        let exercises = self.catalog.select(exercise_ids)?;
        self.assign_exercises(patient_id, &exercises)
    }

    pub fn add_appointment(&mut self, appointment: Appointment) -> RecordResult<Applied<Appointment>> {
        let (added, key) = self.cache.add_appointment(appointment)?;
        let value = added.clone();
        let save = self.persist(&[key]);
        Ok(Applied { value, save })
    }

    // ------------------------------------------------------------------------
    // Saving and exchange
    // ------------------------------------------------------------------------

    /// Write every collection now.
    pub fn force_save(&mut self) -> SaveOutcome {
        self.autosave.force_save(self.store.as_ref(), &self.cache)
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.autosave.last_saved()
    }

    pub fn last_save_failure(&self) -> Option<&str> {
        self.autosave.last_failure()
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument::from_cache(&self.cache, self.cfg.app_version())
    }

    /// Validate an import file. No state changes until [`Session::confirm_import`].
    pub fn stage_import(&self, raw: &str) -> RecordResult<PendingImport> {
        parse_import(raw)
    }

    /// Replace the cache collections with a validated import and save them.
    pub fn confirm_import(&mut self, pending: PendingImport) -> SaveOutcome {
        let (patients, appointments) = pending.into_parts();
        let touched = self.cache.replace_all(patients, appointments);

        let orphaned = self
            .cache
            .appointments()
            .iter()
            .filter(|a| !self.cache.patients().contains(&a.patient_id))
            .count();
        if orphaned > 0 {
            tracing::warn!(orphaned, "imported data leaves appointments without a patient");
        }

        tracing::info!(
            patients = self.cache.patients().len(),
            appointments = self.cache.appointments().len(),
            "import applied"
        );
        self.persist(&touched)
    }

    fn persist(&mut self, keys: &[DocumentKey]) -> SaveOutcome {
        self.autosave
            .after_mutation(self.store.as_ref(), &self.cache, keys)
    }
}
