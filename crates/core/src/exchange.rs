//! Export and import of whole-clinic snapshots.
//!
//! An export is a single JSON document `{ patients, appointments, version, date }`. Importing
//! is two-step: [`parse_import`] validates a file into a [`PendingImport`] without touching
//! any state, and the session applies it only when the caller confirms. Confirmation
//! replaces collections; it never merges.

use crate::cache::{Collection, RecordCache};
use crate::records::{Appointment, Identified, Patient};
use crate::{RecordError, RecordResult};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub version: String,
    /// ISO-8601 UTC timestamp.
    pub date: String,
}

impl ExportDocument {
    pub fn from_cache(cache: &RecordCache, version: &str) -> Self {
        Self {
            patients: cache.patients().as_slice().to_vec(),
            appointments: cache.appointments().as_slice().to_vec(),
            version: version.to_string(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_json_pretty(&self) -> RecordResult<String> {
        serde_json::to_string_pretty(self).map_err(RecordError::Serialization)
    }

    /// Suggested download filename, e.g. `fisio_backup_2024-05-01.json`.
    pub fn file_name(&self) -> String {
        let day = self.date.get(..10).unwrap_or("export");
        format!("fisio_backup_{day}.json")
    }
}

/// Validated import awaiting confirmation.
#[derive(Debug, Clone)]
pub struct PendingImport {
    patients: Collection<Patient>,
    appointments: Option<Collection<Appointment>>,
    version: Option<String>,
    date: Option<String>,
}

impl PendingImport {
    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// `None` when the file carried no appointments; current appointments are then kept.
    pub fn appointment_count(&self) -> Option<usize> {
        self.appointments.as_ref().map(Collection::len)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Collection<Patient>, Option<Collection<Appointment>>) {
        (self.patients, self.appointments)
    }
}

fn rejected(reason: impl Into<String>) -> RecordError {
    RecordError::ImportValidationFailed(reason.into())
}

/// Validate an import file. All-or-nothing: any problem rejects the whole file.
pub fn parse_import(raw: &str) -> RecordResult<PendingImport> {
    let document: Value =
        serde_json::from_str(raw).map_err(|e| rejected(format!("file is not valid JSON: {e}")))?;

    let Value::Object(mut fields) = document else {
        return Err(rejected("top level must be a JSON object"));
    };

    let patients = match fields.remove("patients") {
        Some(Value::Array(records)) => records,
        Some(_) => return Err(rejected("`patients` must be an array")),
        None => return Err(rejected("missing `patients` array")),
    };
    let mut patients: Vec<Patient> = decode_records(patients, "patient")?;
    for patient in &mut patients {
        patient.normalise();
    }
    let patients = unique(patients)?;

    let appointments = match fields.remove("appointments") {
        None | Some(Value::Null) => None,
        Some(Value::Array(records)) => {
            let appointments: Vec<Appointment> = decode_records(records, "appointment")?;
            Some(unique(appointments)?)
        }
        Some(_) => return Err(rejected("`appointments` must be an array")),
    };

    let text = |value: Option<Value>| value.and_then(|v| v.as_str().map(str::to_string));

    Ok(PendingImport {
        patients,
        appointments,
        version: text(fields.remove("version")),
        date: text(fields.remove("date")),
    })
}

fn decode_records<T>(records: Vec<Value>, label: &str) -> RecordResult<Vec<T>>
where
    T: DeserializeOwned + Identified,
{
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let item: T = serde_json::from_value(record)
                .map_err(|e| rejected(format!("{label} #{index} is malformed: {e}")))?;
            if item.id().trim().is_empty() {
                return Err(rejected(format!("{label} #{index} has an empty id")));
            }
            Ok(item)
        })
        .collect()
}

fn unique<T: Identified>(items: Vec<T>) -> RecordResult<Collection<T>> {
    Collection::try_from_vec(items).map_err(|e| rejected(e.to_string()))
}
