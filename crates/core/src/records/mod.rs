//! Record model.
//!
//! Plain serde data types for every entity the cache holds. The wire format is the JSON the
//! clinic application has always written: camelCase field names and the Spanish enumeration
//! values used by its forms. Fields that are missing from a stored document, or that hold a
//! `null` where a blank form input was saved, construct-default instead of failing the
//! record.

pub mod appointment;
pub mod clinical;
pub mod exercise;
pub(crate) mod lenient;
pub mod patient;

pub use appointment::{Appointment, AppointmentType};
pub use clinical::{
    compute_bmi, ClinicalNote, DiagnosticStudy, DiagnosticType, GoniometryRecord, NoteType,
    OrthopedicTestResult, PhysicalExam, TestResult, Vitals,
};
pub use exercise::{Exercise, ExerciseCategory};
pub use patient::{ActivityLevel, Patient, PatientType};

/// An entity stored in a cache collection under a unique string id.
pub trait Identified {
    /// Collection name used in `DuplicateId` / `NotFound` errors.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Fresh record id: 32 lowercase hex characters.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
