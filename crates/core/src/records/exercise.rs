use crate::records::{new_record_id, Identified};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseCategory {
    #[default]
    #[serde(rename = "Movilidad")]
    Mobility,
    #[serde(rename = "Fuerza")]
    Strength,
    #[serde(rename = "Estiramiento")]
    Stretch,
}

/// Catalog exercise. Patients hold value copies, never references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: ExerciseCategory,
    /// Dosage, e.g. "3x12".
    #[serde(default)]
    pub reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl Exercise {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: ExerciseCategory,
        reps: impl Into<String>,
    ) -> Self {
        Self {
            id: new_record_id(),
            title: title.into(),
            description: description.into(),
            category,
            reps: reps.into(),
            video_url: None,
        }
    }
}

impl Identified for Exercise {
    const COLLECTION: &'static str = "exercises";

    fn id(&self) -> &str {
        &self.id
    }
}
