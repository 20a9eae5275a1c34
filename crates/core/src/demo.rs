//! Fixed sample data for Demo sessions.

use crate::records::{Appointment, AppointmentType, Patient};
use crate::{RecordError, RecordResult};

const DEMO_PATIENTS: &str = include_str!("../resources/demo_patients.json");

/// Sample patients, normalised.
pub fn demo_patients() -> RecordResult<Vec<Patient>> {
    let mut patients: Vec<Patient> =
        serde_json::from_str(DEMO_PATIENTS).map_err(|source| RecordError::CorruptDocument {
            key: "demo_patients".into(),
            source,
        })?;
    for patient in &mut patients {
        patient.normalise();
    }
    Ok(patients)
}

/// Sample patients and the two appointments booked for `today` (`YYYY-MM-DD`).
pub fn demo_dataset(today: &str) -> RecordResult<(Vec<Patient>, Vec<Appointment>)> {
    let patients = demo_patients()?;

    let booked = [
        ("a1", "demo-1", "10:30", AppointmentType::Treatment),
        ("a2", "demo-3", "12:00", AppointmentType::Assessment),
    ];
    let appointments = booked
        .into_iter()
        .filter_map(|(id, patient_id, time, appointment_type)| {
            let patient = patients.iter().find(|p| p.id == patient_id)?;
            Some(Appointment {
                id: id.into(),
                patient_id: patient.id.clone(),
                patient_name: patient.name.to_string(),
                date: today.into(),
                time: time.into(),
                appointment_type,
            })
        })
        .collect();

    Ok((patients, appointments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ActivityLevel;

    #[test]
    fn test_demo_dataset_is_consistent() {
        let (patients, appointments) = demo_dataset("2024-05-01").unwrap();

        assert_eq!(patients.len(), 4);
        assert_eq!(appointments.len(), 2);
        for appointment in &appointments {
            assert_eq!(appointment.date, "2024-05-01");
            assert!(patients.iter().any(|p| p.id == appointment.patient_id));
        }
    }

    #[test]
    fn test_demo_bmi_matches_measurements() {
        let patients = demo_patients().unwrap();
        let juan = patients.iter().find(|p| p.id == "demo-1").unwrap();

        assert!((juan.vital_signs.bmi - 25.88).abs() < 1e-9);
        assert_eq!(juan.progress.value(), 45);
    }

    #[test]
    fn test_legacy_activity_level_in_sample_data() {
        let patients = demo_patients().unwrap();
        let sofia = patients.iter().find(|p| p.id == "demo-4").unwrap();
        assert_eq!(sofia.physical_activity_level, ActivityLevel::Active);
    }
}
