use crate::records::{
    lenient, new_record_id, ClinicalNote, DiagnosticStudy, Exercise, Identified, PhysicalExam, Vitals,
};
use fisio_types::{NonEmptyText, Progress};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLevel {
    #[default]
    #[serde(rename = "Sedentario")]
    Sedentary,
    #[serde(rename = "Leve")]
    Light,
    #[serde(rename = "Moderado")]
    Moderate,
    #[serde(rename = "Activo", alias = "Muy Activo")]
    Active,
    #[serde(rename = "Deportista Competición")]
    CompetitiveSport,
    #[serde(rename = "Atleta Alto Rendimiento")]
    EliteAthlete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientType {
    #[serde(rename = "Intrahospitalario")]
    Inpatient,
    #[default]
    #[serde(rename = "Ambulatorio")]
    Outpatient,
}

/// Patient record, the root aggregate of the clinical data.
///
/// `vital_signs` and `physical_exam` hold the patient's *current* state; the notes carry the
/// historical snapshots. `notes` is newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: NonEmptyText,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub age: u32,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub id_number: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub condition: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub diagnosis: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub admission_date: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub treatment_response: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub illness_history: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub treatment_received: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub treatment_reason: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub warning_signs: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub medical_history: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub allergies: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub other_treatments: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub clinical_findings: String,
    #[serde(default)]
    pub physical_activity_level: ActivityLevel,
    #[serde(default)]
    pub physical_exam: PhysicalExam,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub drug_interactions: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub referral_source: String,
    #[serde(default)]
    pub patient_type: PatientType,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub ambulation_type: String,
    #[serde(default)]
    pub vital_signs: Vitals,
    #[serde(default)]
    pub diagnostic_studies: Vec<DiagnosticStudy>,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub last_session: String,
    #[serde(default)]
    pub notes: Vec<ClinicalNote>,
    #[serde(default)]
    pub assigned_exercises: Vec<Exercise>,
}

impl Patient {
    /// New patient with a generated id and every other field at its default.
    pub fn new(name: NonEmptyText) -> Self {
        Self::with_id(new_record_id(), name)
    }

    pub fn with_id(id: impl Into<String>, name: NonEmptyText) -> Self {
        Self {
            id: id.into(),
            name,
            age: 0,
            id_number: String::new(),
            email: String::new(),
            phone: String::new(),
            condition: String::new(),
            diagnosis: String::new(),
            admission_date: String::new(),
            treatment_response: String::new(),
            illness_history: String::new(),
            treatment_received: String::new(),
            treatment_reason: String::new(),
            warning_signs: String::new(),
            medical_history: String::new(),
            allergies: String::new(),
            other_treatments: String::new(),
            clinical_findings: String::new(),
            physical_activity_level: ActivityLevel::default(),
            physical_exam: PhysicalExam::default(),
            drug_interactions: String::new(),
            referral_source: String::new(),
            patient_type: PatientType::default(),
            ambulation_type: String::new(),
            vital_signs: Vitals::default(),
            diagnostic_studies: Vec::new(),
            progress: Progress::default(),
            last_session: String::new(),
            notes: Vec::new(),
            assigned_exercises: Vec::new(),
        }
    }

    /// Re-derive computed fields. Applied to every record entering the cache.
    pub fn normalise(&mut self) {
        self.vital_signs.recompute_bmi();
    }

    pub fn latest_note(&self) -> Option<&ClinicalNote> {
        self.notes.first()
    }
}

impl Identified for Patient {
    const COLLECTION: &'static str = "patients";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_constructs_defaults() {
        let patient: Patient = serde_json::from_str(r#"{"id":"p1","name":"Ana"}"#).unwrap();

        assert_eq!(patient.id, "p1");
        assert_eq!(patient.name.as_str(), "Ana");
        assert_eq!(patient.patient_type, PatientType::Outpatient);
        assert!(patient.notes.is_empty());
        assert_eq!(patient.progress.value(), 0);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result = serde_json::from_str::<Patient>(r#"{"id":"p1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_activity_level_accepts_legacy_alias() {
        let patient: Patient = serde_json::from_str(
            r#"{"id":"p1","name":"Ana","physicalActivityLevel":"Muy Activo"}"#,
        )
        .unwrap();
        assert_eq!(patient.physical_activity_level, ActivityLevel::Active);
    }

    #[test]
    fn test_progress_is_clamped_on_load() {
        let patient: Patient =
            serde_json::from_str(r#"{"id":"p1","name":"Ana","progress":140}"#).unwrap();
        assert_eq!(patient.progress.value(), 100);
    }

    #[test]
    fn test_blank_form_numbers_stored_as_null_still_load() {
        let patient: Patient = serde_json::from_str(
            r#"{"id":"p1","name":"Ana","age":null,"phone":null,"progress":null,
                "vitalSigns":{"heartRate":null,"respiratoryRate":null,"bloodPressure":"120/80",
                "oxygenSaturation":null,"temperature":null,"weight":60,"height":null,"bmi":null}}"#,
        )
        .unwrap();

        assert_eq!(patient.age, 0);
        assert_eq!(patient.phone, "");
        assert_eq!(patient.vital_signs.heart_rate, 0);
        assert_eq!(patient.vital_signs.weight, 60.0);
        assert_eq!(patient.vital_signs.height, 0.0);
        assert_eq!(patient.vital_signs.blood_pressure, "120/80");
    }

    #[test]
    fn test_non_finite_weight_survives_a_round_trip() {
        let mut patient = Patient::with_id("p1", NonEmptyText::new("Ana").unwrap());
        patient.vital_signs.weight = f64::NAN;
        patient.vital_signs.height = 165.0;

        let json = serde_json::to_string(&patient).unwrap();
        let reloaded: Patient = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.vital_signs.weight, 0.0);

        patient.normalise();
        assert_eq!(patient.vital_signs.weight, 0.0);
        assert_eq!(patient.vital_signs.bmi, 0.0);
    }

    #[test]
    fn test_normalise_recomputes_stale_bmi() {
        let mut patient = Patient::with_id("p1", NonEmptyText::new("Ana").unwrap());
        patient.vital_signs = Vitals {
            weight: 60.0,
            height: 160.0,
            bmi: 99.0,
            ..Vitals::default()
        };

        patient.normalise();

        assert!((patient.vital_signs.bmi - 23.44).abs() < 1e-9);
    }

    #[test]
    fn test_serialises_camel_case_fields() {
        let mut patient = Patient::with_id("p1", NonEmptyText::new("Ana").unwrap());
        patient.id_number = "12345678Z".into();
        patient.patient_type = PatientType::Inpatient;

        let json = serde_json::to_value(&patient).unwrap();

        assert_eq!(json["idNumber"], "12345678Z");
        assert_eq!(json["patientType"], "Intrahospitalario");
        assert_eq!(json["physicalActivityLevel"], "Sedentario");
        assert!(json["assignedExercises"].is_array());
    }
}
