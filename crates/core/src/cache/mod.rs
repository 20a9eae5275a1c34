//! In-memory record cache and mutation rules.
//!
//! The cache is the authoritative copy of every collection for the current session. Views
//! read through it and never through the store. Each mutating method reports which
//! documents it touched so the owning [`Session`](crate::session::Session) can hand them to
//! autosave.

mod collection;
mod patch;

pub use collection::Collection;
pub use patch::PatientPatch;

use crate::records::{Appointment, ClinicalNote, Exercise, Patient};
use crate::store::DocumentKey;
use crate::{RecordError, RecordResult};
use chrono::Utc;

/// Screen the clinician is on, as far as the cache needs to know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    PatientList,
    NewPatient,
    ClinicalRecord,
    ExerciseManager,
}

impl View {
    fn needs_selection(self) -> bool {
        matches!(self, View::ClinicalRecord)
    }
}

/// Outcome of removing a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRemoval {
    pub patient: Patient,
    pub appointments_removed: usize,
}

#[derive(Debug, Default, Clone)]
pub struct RecordCache {
    patients: Collection<Patient>,
    appointments: Collection<Appointment>,
    selected: Option<String>,
    view: View,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache populated from stored or seeded records. Repeated ids keep the first entry.
    pub fn hydrate(patients: Vec<Patient>, appointments: Vec<Appointment>) -> Self {
        let patients = patients
            .into_iter()
            .map(|mut patient| {
                patient.normalise();
                patient
            })
            .collect();

        Self {
            patients: Collection::from_hydrated(patients),
            appointments: Collection::from_hydrated(appointments),
            selected: None,
            view: View::PatientList,
        }
    }

    pub fn patients(&self) -> &Collection<Patient> {
        &self.patients
    }

    pub fn appointments(&self) -> &Collection<Appointment> {
        &self.appointments
    }

    pub fn patient(&self, id: &str) -> RecordResult<&Patient> {
        self.patients.get(id).ok_or_else(|| RecordError::NotFound {
            collection: "patients",
            id: id.to_string(),
        })
    }

    pub fn appointments_for<'a>(
        &'a self,
        patient_id: &'a str,
    ) -> impl Iterator<Item = &'a Appointment> + 'a {
        self.appointments
            .iter()
            .filter(move |appointment| appointment.patient_id == patient_id)
    }

    pub fn appointments_on<'a>(&'a self, date: &'a str) -> impl Iterator<Item = &'a Appointment> + 'a {
        self.appointments
            .iter()
            .filter(move |appointment| appointment.date == date)
    }

    /// The open patient. Always the current stored value, so edits show up immediately.
    pub fn selected_patient(&self) -> Option<&Patient> {
        self.selected.as_deref().and_then(|id| self.patients.get(id))
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn select_patient(&mut self, id: &str) -> RecordResult<&Patient> {
        let patient = self.patients.get(id).ok_or_else(|| RecordError::NotFound {
            collection: "patients",
            id: id.to_string(),
        })?;
        self.selected = Some(patient.id.clone());
        self.view = View::ClinicalRecord;
        Ok(patient)
    }

    /// Close the open patient and return to the list.
    pub fn close_patient(&mut self) {
        self.selected = None;
        self.view = View::PatientList;
    }

    pub fn set_view(&mut self, view: View) -> RecordResult<()> {
        if view.needs_selection() && self.selected_patient().is_none() {
            return Err(RecordError::InvalidInput(
                "a patient must be selected to open the clinical record".into(),
            ));
        }
        self.view = view;
        Ok(())
    }

    pub fn add_patient(&mut self, mut patient: Patient) -> RecordResult<(&Patient, DocumentKey)> {
        if patient.id.trim().is_empty() {
            return Err(RecordError::InvalidInput("patient id must not be empty".into()));
        }
        patient.normalise();
        let added = self.patients.add(patient)?;
        Ok((added, DocumentKey::Patients))
    }

    pub fn update_patient(
        &mut self,
        id: &str,
        patch: PatientPatch,
    ) -> RecordResult<(&Patient, DocumentKey)> {
        let updated = self.patients.update_with(id, |patient| {
            patch.apply_to(patient);
            Ok(())
        })?;
        Ok((updated, DocumentKey::Patients))
    }

    /// Remove a patient together with every appointment that references it.
    pub fn remove_patient(&mut self, id: &str) -> RecordResult<(PatientRemoval, Vec<DocumentKey>)> {
        let patient = self.patients.remove(id)?;
        let appointments_removed = self
            .appointments
            .retain(|appointment| appointment.patient_id != patient.id);

        if self.selected.as_deref() == Some(patient.id.as_str()) {
            self.close_patient();
        }

        let mut touched = vec![DocumentKey::Patients];
        if appointments_removed > 0 {
            touched.push(DocumentKey::Appointments);
        }

        Ok((
            PatientRemoval {
                patient,
                appointments_removed,
            },
            touched,
        ))
    }

    /// Prepend `note` to the patient's log.
    ///
    /// An evolution note also becomes the patient's current state: its vitals replace the
    /// current vitals, its exam (when present) replaces the current exam, and `lastSession`
    /// is set to today.
    pub fn add_note(
        &mut self,
        patient_id: &str,
        note: ClinicalNote,
    ) -> RecordResult<(&Patient, DocumentKey)> {
        if note.is_evolution() && note.vital_signs.is_none() {
            return Err(RecordError::InvalidInput(
                "evolution notes must record vital signs".into(),
            ));
        }

        let updated = self.patients.update_with(patient_id, |patient| {
            if patient.notes.iter().any(|existing| existing.id == note.id) {
                return Err(RecordError::DuplicateId {
                    collection: "notes",
                    id: note.id.clone(),
                });
            }

            if note.is_evolution() {
                if let Some(vitals) = &note.vital_signs {
                    patient.vital_signs = vitals.clone();
                }
                if let Some(exam) = &note.physical_exam {
                    patient.physical_exam = exam.clone();
                }
                patient.last_session = Utc::now().format("%Y-%m-%d").to_string();
            }

            patient.notes.insert(0, note);
            patient.normalise();
            Ok(())
        })?;
        Ok((updated, DocumentKey::Patients))
    }

    /// Replace a patient's plan with copies of `exercises`.
    pub fn assign_exercises(
        &mut self,
        patient_id: &str,
        exercises: &[Exercise],
    ) -> RecordResult<(&Patient, DocumentKey)> {
        let updated = self.patients.update_with(patient_id, |patient| {
            patient.assigned_exercises = exercises.to_vec();
            Ok(())
        })?;
        Ok((updated, DocumentKey::Patients))
    }

    pub fn add_appointment(
        &mut self,
        appointment: Appointment,
    ) -> RecordResult<(&Appointment, DocumentKey)> {
        if appointment.id.trim().is_empty() {
            return Err(RecordError::InvalidInput(
                "appointment id must not be empty".into(),
            ));
        }
        if !self.patients.contains(&appointment.patient_id) {
            return Err(RecordError::NotFound {
                collection: "patients",
                id: appointment.patient_id,
            });
        }
        let added = self.appointments.add(appointment)?;
        Ok((added, DocumentKey::Appointments))
    }

    /// Swap in imported collections. `None` keeps the current appointments.
    pub fn replace_all(
        &mut self,
        patients: Collection<Patient>,
        appointments: Option<Collection<Appointment>>,
    ) -> Vec<DocumentKey> {
        self.patients = patients;
        let mut touched = vec![DocumentKey::Patients];
        if let Some(appointments) = appointments {
            self.appointments = appointments;
            touched.push(DocumentKey::Appointments);
        }

        if self.selected.is_some() && self.selected_patient().is_none() {
            self.close_patient();
        }
        touched
    }
}
