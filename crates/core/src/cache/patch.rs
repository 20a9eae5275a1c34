use crate::records::{
    ActivityLevel, DiagnosticStudy, Exercise, Patient, PatientType, PhysicalExam, Vitals,
};
use fisio_types::{NonEmptyText, Progress};
use serde::Deserialize;

/// Partial patient update.
///
/// Shallow merge: every `Some` field replaces the stored value, nested objects included.
/// `id` and `notes` are not patchable; notes only grow through `add_note`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientPatch {
    pub name: Option<NonEmptyText>,
    pub age: Option<u32>,
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub condition: Option<String>,
    pub diagnosis: Option<String>,
    pub admission_date: Option<String>,
    pub treatment_response: Option<String>,
    pub illness_history: Option<String>,
    pub treatment_received: Option<String>,
    pub treatment_reason: Option<String>,
    pub warning_signs: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub other_treatments: Option<String>,
    pub clinical_findings: Option<String>,
    pub physical_activity_level: Option<ActivityLevel>,
    pub physical_exam: Option<PhysicalExam>,
    pub drug_interactions: Option<String>,
    pub referral_source: Option<String>,
    pub patient_type: Option<PatientType>,
    pub ambulation_type: Option<String>,
    pub vital_signs: Option<Vitals>,
    pub diagnostic_studies: Option<Vec<DiagnosticStudy>>,
    pub progress: Option<Progress>,
    pub last_session: Option<String>,
    pub assigned_exercises: Option<Vec<Exercise>>,
}

impl PatientPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Patch that changes only weight and height, keeping the other current vitals.
    pub fn body_measurements(current: &Vitals, weight_kg: f64, height_cm: f64) -> Self {
        Self {
            vital_signs: Some(Vitals {
                weight: weight_kg,
                height: height_cm,
                ..current.clone()
            }),
            ..Self::default()
        }
    }

    /// Merge onto `patient`. BMI is re-derived in the same edit.
    pub fn apply_to(self, patient: &mut Patient) {
        if let Some(v) = self.name {
            patient.name = v;
        }
        if let Some(v) = self.age {
            patient.age = v;
        }
        if let Some(v) = self.id_number {
            patient.id_number = v;
        }
        if let Some(v) = self.email {
            patient.email = v;
        }
        if let Some(v) = self.phone {
            patient.phone = v;
        }
        if let Some(v) = self.condition {
            patient.condition = v;
        }
        if let Some(v) = self.diagnosis {
            patient.diagnosis = v;
        }
        if let Some(v) = self.admission_date {
            patient.admission_date = v;
        }
        if let Some(v) = self.treatment_response {
            patient.treatment_response = v;
        }
        if let Some(v) = self.illness_history {
            patient.illness_history = v;
        }
        if let Some(v) = self.treatment_received {
            patient.treatment_received = v;
        }
        if let Some(v) = self.treatment_reason {
            patient.treatment_reason = v;
        }
        if let Some(v) = self.warning_signs {
            patient.warning_signs = v;
        }
        if let Some(v) = self.medical_history {
            patient.medical_history = v;
        }
        if let Some(v) = self.allergies {
            patient.allergies = v;
        }
        if let Some(v) = self.other_treatments {
            patient.other_treatments = v;
        }
        if let Some(v) = self.clinical_findings {
            patient.clinical_findings = v;
        }
        if let Some(v) = self.physical_activity_level {
            patient.physical_activity_level = v;
        }
        if let Some(v) = self.physical_exam {
            patient.physical_exam = v;
        }
        if let Some(v) = self.drug_interactions {
            patient.drug_interactions = v;
        }
        if let Some(v) = self.referral_source {
            patient.referral_source = v;
        }
        if let Some(v) = self.patient_type {
            patient.patient_type = v;
        }
        if let Some(v) = self.ambulation_type {
            patient.ambulation_type = v;
        }
        if let Some(v) = self.vital_signs {
            patient.vital_signs = v;
        }
        if let Some(v) = self.diagnostic_studies {
            patient.diagnostic_studies = v;
        }
        if let Some(v) = self.progress {
            patient.progress = v;
        }
        if let Some(v) = self.last_session {
            patient.last_session = v;
        }
        if let Some(v) = self.assigned_exercises {
            patient.assigned_exercises = v;
        }

        patient.normalise();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::GoniometryRecord;

    fn ana() -> Patient {
        let mut patient = Patient::with_id("a1", NonEmptyText::new("Ana").unwrap());
        patient.condition = "Lumbalgia".into();
        patient.vital_signs = Vitals {
            heart_rate: 72,
            ..Vitals::with_body(60.0, 160.0)
        };
        patient.physical_exam.goniometry.push(GoniometryRecord {
            joint: "Rodilla".into(),
            ..GoniometryRecord::default()
        });
        patient
    }

    #[test]
    fn test_unset_fields_are_left_alone() {
        let mut patient = ana();
        let patch = PatientPatch {
            phone: Some("600000000".into()),
            ..PatientPatch::default()
        };

        patch.apply_to(&mut patient);

        assert_eq!(patient.phone, "600000000");
        assert_eq!(patient.condition, "Lumbalgia");
        assert_eq!(patient.vital_signs.heart_rate, 72);
    }

    #[test]
    fn test_nested_objects_are_replaced_wholesale() {
        let mut patient = ana();
        let patch = PatientPatch {
            physical_exam: Some(PhysicalExam {
                palpation: "Contractura paravertebral".into(),
                ..PhysicalExam::default()
            }),
            ..PatientPatch::default()
        };

        patch.apply_to(&mut patient);

        assert_eq!(patient.physical_exam.palpation, "Contractura paravertebral");
        assert!(patient.physical_exam.goniometry.is_empty());
    }

    #[test]
    fn test_body_measurement_change_recomputes_bmi() {
        let mut patient = ana();
        let patch = PatientPatch::body_measurements(&patient.vital_signs, 58.0, 160.0);

        patch.apply_to(&mut patient);

        assert_eq!(patient.vital_signs.weight, 58.0);
        assert_eq!(patient.vital_signs.heart_rate, 72);
        assert!((patient.vital_signs.bmi - 22.66).abs() < 1e-9);
    }

    #[test]
    fn test_patch_deserialises_from_partial_json() {
        let patch: PatientPatch =
            serde_json::from_str(r#"{"diagnosis":"Tendinopatía","progress":55}"#).unwrap();

        assert_eq!(patch.diagnosis.as_deref(), Some("Tendinopatía"));
        assert_eq!(patch.progress.map(|p| p.value()), Some(55));
        assert!(patch.name.is_none());
        assert!(!patch.is_empty());
        assert!(PatientPatch::default().is_empty());
    }
}
