//! Clinical value objects: vital signs, physical examination, diagnostic studies and notes.

use crate::records::{lenient, new_record_id};
use chrono::{SecondsFormat, Utc};
use fisio_types::PainLevel;
use serde::{Deserialize, Serialize};

/// Body-mass index from weight in kilograms and height in centimetres.
///
/// Rounded to two decimals. Returns `0.0` when either input is not a positive finite number,
/// so the stored value is always representable in JSON.
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if !(weight_kg.is_finite() && height_cm.is_finite()) || weight_kg <= 0.0 || height_cm <= 0.0 {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    (bmi * 100.0).round() / 100.0
}

/// Vital signs and body measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vitals {
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub heart_rate: u32,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub respiratory_rate: u32,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub blood_pressure: String,
    #[serde(deserialize_with = "lenient::u32_or_zero")]
    pub oxygen_saturation: u32,
    #[serde(deserialize_with = "lenient::f64_or_zero", serialize_with = "lenient::finite_or_zero")]
    pub temperature: f64,
    /// Kilograms.
    #[serde(deserialize_with = "lenient::f64_or_zero", serialize_with = "lenient::finite_or_zero")]
    pub weight: f64,
    /// Centimetres.
    #[serde(deserialize_with = "lenient::f64_or_zero", serialize_with = "lenient::finite_or_zero")]
    pub height: f64,
    #[serde(deserialize_with = "lenient::f64_or_zero", serialize_with = "lenient::finite_or_zero")]
    pub bmi: f64,
}

impl Vitals {
    /// Vitals carrying only body measurements, with BMI already derived.
    pub fn with_body(weight_kg: f64, height_cm: f64) -> Self {
        let mut vitals = Self {
            weight: weight_kg,
            height: height_cm,
            ..Self::default()
        };
        vitals.recompute_bmi();
        vitals
    }

    /// Zero any non-finite measurement, then derive BMI.
    pub fn recompute_bmi(&mut self) {
        for value in [&mut self.temperature, &mut self.weight, &mut self.height] {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        self.bmi = compute_bmi(self.weight, self.height);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoniometryRecord {
    pub joint: String,
    pub movement: String,
    pub active_range: String,
    pub passive_range: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestResult {
    #[serde(rename = "Positivo")]
    Positive,
    #[serde(rename = "Negativo")]
    Negative,
    #[default]
    #[serde(rename = "Dudoso")]
    Inconclusive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrthopedicTestResult {
    pub id: String,
    pub category: String,
    pub test_name: String,
    pub result: TestResult,
    pub observations: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicalExam {
    pub visual_inspection: String,
    pub palpation: String,
    pub goniometry: Vec<GoniometryRecord>,
    pub orthopedic_tests: Vec<OrthopedicTestResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticType {
    #[serde(rename = "Sanguínea")]
    Blood,
    #[serde(rename = "Radiología")]
    Radiology,
    #[serde(rename = "Neuroconducción")]
    NerveConduction,
    #[serde(rename = "Imagen Avanzada")]
    AdvancedImaging,
    #[default]
    #[serde(rename = "Otros")]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticStudy {
    pub id: String,
    #[serde(rename = "type")]
    pub study_type: DiagnosticType,
    pub title: String,
    pub date: String,
    pub result_summary: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    /// Progress note; its vitals and exam become the patient's current state.
    #[serde(rename = "Evolución")]
    Evolution,
    #[serde(rename = "Plan de Trabajo")]
    WorkPlan,
    #[default]
    General,
}

/// Append-only clinical log entry.
///
/// The optional vitals and exam are a snapshot taken when the note was authored; they are
/// distinct from the patient's current, mutable vitals and exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalNote {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pain_level: PainLevel,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_signs: Option<Vitals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_exam: Option<PhysicalExam>,
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
}

impl ClinicalNote {
    /// New note stamped with a fresh id and the current UTC time.
    pub fn new(
        note_type: NoteType,
        content: impl Into<String>,
        author: impl Into<String>,
        pain_level: PainLevel,
    ) -> Self {
        Self {
            id: new_record_id(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            content: content.into(),
            pain_level,
            author: author.into(),
            vital_signs: None,
            physical_exam: None,
            note_type,
        }
    }

    /// Evolution note capturing the vitals measured during the session.
    pub fn evolution(
        content: impl Into<String>,
        author: impl Into<String>,
        pain_level: PainLevel,
        vitals: Vitals,
    ) -> Self {
        Self::new(NoteType::Evolution, content, author, pain_level).with_vitals(vitals)
    }

    pub fn with_vitals(mut self, mut vitals: Vitals) -> Self {
        vitals.recompute_bmi();
        self.vital_signs = Some(vitals);
        self
    }

    pub fn with_physical_exam(mut self, exam: PhysicalExam) -> Self {
        self.physical_exam = Some(exam);
        self
    }

    pub fn is_evolution(&self) -> bool {
        self.note_type == NoteType::Evolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_compute_bmi_matches_reference_values() {
        assert!(approx(compute_bmi(60.0, 160.0), 23.44));
        assert!(approx(compute_bmi(58.0, 160.0), 22.66));
        assert!(approx(compute_bmi(82.0, 178.0), 25.88));
    }

    #[test]
    fn test_compute_bmi_is_idempotent() {
        for (w, h) in [(60.0, 160.0), (91.3, 187.2), (45.5, 150.0)] {
            assert_eq!(compute_bmi(w, h), compute_bmi(w, h));
            let mut vitals = Vitals::with_body(w, h);
            let first = vitals.bmi;
            vitals.recompute_bmi();
            assert_eq!(vitals.bmi, first);
        }
    }

    #[test]
    fn test_compute_bmi_never_produces_non_finite() {
        assert_eq!(compute_bmi(70.0, 0.0), 0.0);
        assert_eq!(compute_bmi(0.0, 170.0), 0.0);
        assert_eq!(compute_bmi(f64::NAN, 170.0), 0.0);
        assert_eq!(compute_bmi(70.0, -10.0), 0.0);
    }

    #[test]
    fn test_note_serialises_with_original_wire_names() {
        let note = ClinicalNote::evolution(
            "Less pain on flexion",
            "Fisio M.",
            PainLevel::new(3),
            Vitals::with_body(70.0, 175.0),
        );
        let json = serde_json::to_value(&note).unwrap();

        assert_eq!(json["type"], "Evolución");
        assert_eq!(json["painLevel"], 3);
        assert!(json["vitalSigns"]["bmi"].as_f64().unwrap() > 0.0);
        assert!(json.get("physicalExam").is_none());
    }

    #[test]
    fn test_partial_vitals_construct_default() {
        let vitals: Vitals =
            serde_json::from_str(r#"{"heartRate":70,"bloodPressure":"120/80"}"#).unwrap();
        assert_eq!(vitals.heart_rate, 70);
        assert_eq!(vitals.weight, 0.0);
        assert_eq!(vitals.bmi, 0.0);
    }

    #[test]
    fn test_note_type_round_trips_work_plan() {
        let parsed: NoteType = serde_json::from_str("\"Plan de Trabajo\"").unwrap();
        assert_eq!(parsed, NoteType::WorkPlan);
    }
}
