//! Exercise catalog.
//!
//! The library clinicians pick from when building a plan. It lives only for the session and
//! is never written to the store; patients keep their own copies of whatever was assigned.

use crate::cache::Collection;
use crate::records::{Exercise, ExerciseCategory};
use crate::RecordResult;

#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    exercises: Collection<Exercise>,
}

impl Default for ExerciseCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn entry(id: &str, title: &str, description: &str, category: ExerciseCategory, reps: &str) -> Exercise {
    Exercise {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        category,
        reps: reps.into(),
        video_url: None,
    }
}

impl ExerciseCatalog {
    pub fn empty() -> Self {
        Self {
            exercises: Collection::new(),
        }
    }

    /// Catalog seeded with the clinic's four standard exercises.
    pub fn with_defaults() -> Self {
        let exercises = Collection::from_hydrated(vec![
            entry(
                "1",
                "Sentadilla en Pared",
                "Mantén la espalda apoyada y baja lentamente.",
                ExerciseCategory::Strength,
                "3 series de 10 reps",
            ),
            entry(
                "2",
                "Puente de Glúteo",
                "Eleva la cadera manteniendo el core firme.",
                ExerciseCategory::Strength,
                "2 series de 15 reps",
            ),
            entry(
                "3",
                "Estiramiento Isquiotibial",
                "Tumbado boca arriba, eleva la pierna con una cincha.",
                ExerciseCategory::Stretch,
                "3 series de 30s",
            ),
            entry(
                "4",
                "Movilidad de Tobillo",
                "De pie, lleva la rodilla hacia la pared sin levantar el talón.",
                ExerciseCategory::Mobility,
                "2 series de 12 reps",
            ),
        ]);
        Self { exercises }
    }

    pub fn exercises(&self) -> &[Exercise] {
        self.exercises.as_slice()
    }

    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    pub fn by_category(&self, category: ExerciseCategory) -> impl Iterator<Item = &Exercise> {
        self.exercises
            .iter()
            .filter(move |exercise| exercise.category == category)
    }

    pub fn add(&mut self, exercise: Exercise) -> RecordResult<&Exercise> {
        self.exercises.add(exercise)
    }

    /// Replace a catalog entry. Plans that already hold a copy are unaffected.
    pub fn update(&mut self, exercise: Exercise) -> RecordResult<&Exercise> {
        let id = exercise.id.clone();
        self.exercises.update_with(&id, move |current| {
            *current = exercise;
            Ok(())
        })
    }

    /// Copies of the catalog entries named by `ids`, in the given order.
    pub fn select(&self, ids: &[&str]) -> RecordResult<Vec<Exercise>> {
        ids.iter()
            .map(|id| {
                self.exercises
                    .get(id)
                    .cloned()
                    .ok_or_else(|| crate::RecordError::NotFound {
                        collection: "exercises",
                        id: (*id).to_string(),
                    })
            })
            .collect()
    }
}

/// Add `exercise` to `plan`, or remove it if an entry with the same id is already there.
pub fn toggle(plan: &mut Vec<Exercise>, exercise: &Exercise) {
    if let Some(index) = plan.iter().position(|e| e.id == exercise.id) {
        plan.remove(index);
    } else {
        plan.push(exercise.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordError;

    #[test]
    fn test_default_catalog_has_standard_exercises() {
        let catalog = ExerciseCatalog::with_defaults();

        assert_eq!(catalog.exercises().len(), 4);
        assert_eq!(catalog.by_category(ExerciseCategory::Strength).count(), 2);
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let catalog = ExerciseCatalog::with_defaults();
        let bridge = catalog.get("2").unwrap();
        let mut plan = Vec::new();

        toggle(&mut plan, bridge);
        assert_eq!(plan.len(), 1);

        toggle(&mut plan, bridge);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_catalog_edit_does_not_reach_selected_copies() {
        let mut catalog = ExerciseCatalog::with_defaults();
        let plan = catalog.select(&["1", "3"]).unwrap();

        let mut edited = catalog.get("1").unwrap().clone();
        edited.reps = "4 series de 8 reps".into();
        catalog.update(edited).unwrap();

        assert_eq!(plan[0].reps, "3 series de 10 reps");
        assert_eq!(catalog.get("1").unwrap().reps, "4 series de 8 reps");
    }

    #[test]
    fn test_select_unknown_id_is_not_found() {
        let catalog = ExerciseCatalog::with_defaults();
        assert!(matches!(
            catalog.select(&["1", "99"]),
            Err(RecordError::NotFound { .. })
        ));
    }
}
