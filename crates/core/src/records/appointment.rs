use crate::records::{new_record_id, Identified, Patient};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentType {
    #[default]
    #[serde(rename = "Tratamiento")]
    Treatment,
    #[serde(rename = "Revisión")]
    Review,
    #[serde(rename = "Evaluación")]
    Assessment,
    #[serde(rename = "Domicilio")]
    HomeVisit,
}

/// Calendar entry. Never updated in place; removed only when its patient is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    /// Copy of the patient's name at booking time.
    #[serde(default)]
    pub patient_name: String,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// `HH:MM`.
    #[serde(default)]
    pub time: String,
    #[serde(rename = "type", default)]
    pub appointment_type: AppointmentType,
}

impl Appointment {
    pub fn for_patient(
        patient: &Patient,
        date: impl Into<String>,
        time: impl Into<String>,
        appointment_type: AppointmentType,
    ) -> Self {
        Self {
            id: new_record_id(),
            patient_id: patient.id.clone(),
            patient_name: patient.name.to_string(),
            date: date.into(),
            time: time.into(),
            appointment_type,
        }
    }
}

impl Identified for Appointment {
    const COLLECTION: &'static str = "appointments";

    fn id(&self) -> &str {
        &self.id
    }
}
