//! Prompt construction.
//!
//! Prompts are built from a [`PatientSnapshot`], a read-only copy of the fields the
//! assistant may see. Nothing generated here is parsed back into records.

use fisio_core::records::Patient;
use std::fmt::Write;

/// Who the global assistant is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantRole {
    Clinician,
    Patient,
}

/// Kind of request, used to pick the fallback sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    PatientAssistant,
    /// Correction tips for an exercise from measured joint angles.
    PostureFeedback,
    Global(AssistantRole),
}

impl PromptKind {
    /// Text used when the service fails or times out.
    pub fn fallback(self) -> &'static str {
        match self {
            PromptKind::PatientAssistant => {
                "En este momento no puedo responder, pero recuerda seguir las indicaciones de tu fisioterapeuta."
            }
            PromptKind::PostureFeedback => {
                "No he podido analizar tu postura ahora mismo, pero mantén el control del movimiento."
            }
            PromptKind::Global(_) => "Hubo un error al conectar con el servidor de IA.",
        }
    }

    /// Text used when the service answers with nothing.
    pub fn empty_fallback(self) -> &'static str {
        match self {
            PromptKind::PatientAssistant => {
                "Lo siento, no he podido procesar tu consulta. Inténtalo de nuevo o contacta con tu fisioterapeuta."
            }
            PromptKind::PostureFeedback => "Lo estás haciendo bien, sigue así.",
            PromptKind::Global(_) => "No he podido procesar la consulta.",
        }
    }
}

/// Joint angles in degrees captured while the patient performs an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    pub shoulder: f64,
    pub elbow: f64,
    pub hip: f64,
    pub knee: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseSummary {
    pub title: String,
    pub description: String,
    pub reps: String,
}

/// Detached copy of the patient data an assistant prompt may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSnapshot {
    pub name: String,
    pub progress: u8,
    pub condition: String,
    pub diagnosis: String,
    pub exercises: Vec<ExerciseSummary>,
}

impl From<&Patient> for PatientSnapshot {
    fn from(patient: &Patient) -> Self {
        Self {
            name: patient.name.to_string(),
            progress: patient.progress.value(),
            condition: patient.condition.clone(),
            diagnosis: patient.diagnosis.clone(),
            exercises: patient
                .assigned_exercises
                .iter()
                .map(|e| ExerciseSummary {
                    title: e.title.clone(),
                    description: e.description.clone(),
                    reps: e.reps.clone(),
                })
                .collect(),
        }
    }
}

pub const PATIENT_ASSISTANT_SYSTEM: &str = "Eres el Asistente IA de FisioSevilla y hablas con un paciente. \
Responde de forma amable, clara y motivadora. Si pregunta por sus ejercicios, explícaselos con sencillez. \
Si pregunta por su progreso, anímale basándote en su porcentaje. No des diagnósticos médicos nuevos y cíñete \
a su plan de tratamiento actual. Si la duda es muy técnica o indica mucho dolor, recomiéndale hablar \
directamente con su fisioterapeuta.";

pub const CLINICIAN_SYSTEM: &str = "Eres un Asistente Clínico IA experto para fisioterapeutas. \
Ayudas con razonamiento clínico basado en la evidencia, progresión de ejercicios, resúmenes de patologías y \
técnicas de terapia manual, y redacción de notas clínicas. Mantén un tono técnico y preciso. Si te preguntan \
por un paciente concreto, usa los datos proporcionados. No des consejos médicos finales: la decisión es \
siempre del facultativo.";

pub const PATIENT_SYSTEM: &str = "Eres el Asistente de Recuperación de FisioSevilla y hablas con un paciente. \
Resuelves dudas sobre los ejercicios asignados, motivas al paciente y das consejos generales de salud \
relacionados con la fisioterapia. Sé amable y empático y usa un lenguaje sencillo. Si el paciente refiere \
mucho dolor, indícale que pare y avise a su fisioterapeuta de inmediato.";

pub const POSTURE_FEEDBACK_SYSTEM: &str = "Actúa como un fisioterapeuta experto de FisioSevilla. \
Da un feedback breve, motivador y en lenguaje sencillo, sin jerga técnica. Di si la postura es correcta o qué \
debe ajustar (por ejemplo \"baja un poco más la cadera\" o \"mantén la espalda recta\"). Usa un tono cercano \
y profesional.";

pub fn global_system(role: AssistantRole) -> &'static str {
    match role {
        AssistantRole::Clinician => CLINICIAN_SYSTEM,
        AssistantRole::Patient => PATIENT_SYSTEM,
    }
}

/// User prompt for the patient assistant: patient context followed by the question.
pub fn patient_assistant_prompt(question: &str, snapshot: &PatientSnapshot) -> String {
    let mut prompt = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(prompt, "Paciente: {}", snapshot.name);
    let _ = writeln!(
        prompt,
        "- Progreso actual: {}% de la recuperación completado.",
        snapshot.progress
    );
    let _ = writeln!(prompt, "- Condición: {}.", snapshot.condition);
    let _ = writeln!(prompt, "- Diagnóstico: {}.", snapshot.diagnosis);
    let _ = writeln!(prompt, "- Ejercicios asignados:");
    if snapshot.exercises.is_empty() {
        let _ = writeln!(prompt, "  (ninguno)");
    }
    for exercise in &snapshot.exercises {
        let _ = writeln!(
            prompt,
            "  - {}: {} ({})",
            exercise.title, exercise.description, exercise.reps
        );
    }
    let _ = write!(prompt, "\nMensaje del paciente: \"{}\"", question.trim());
    prompt
}

/// User prompt for posture feedback: the exercise and the captured angles.
pub fn posture_prompt(angles: &JointAngles, exercise_name: &str) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "El paciente está realizando el ejercicio: \"{}\".",
        exercise_name.trim()
    );
    let _ = writeln!(prompt, "Los ángulos capturados de sus articulaciones son:");
    for (joint, degrees) in [
        ("Hombro", angles.shoulder),
        ("Codo", angles.elbow),
        ("Cadera", angles.hip),
        ("Rodilla", angles.knee),
    ] {
        let _ = writeln!(prompt, "- {}: {:.0} grados", joint, degrees);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisio_core::records::{Exercise, ExerciseCategory};
    use fisio_core::{NonEmptyText, Progress};

    fn snapshot() -> PatientSnapshot {
        let mut patient = Patient::with_id("p1", NonEmptyText::new("Elena").unwrap());
        patient.progress = Progress::new(30);
        patient.condition = "Hombro doloroso".into();
        patient.assigned_exercises.push(Exercise::new(
            "Movilidad Escapular",
            "Rota los hombros suavemente.",
            ExerciseCategory::Mobility,
            "2 series de 15 reps",
        ));
        PatientSnapshot::from(&patient)
    }

    #[test]
    fn test_patient_prompt_includes_plan_and_question() {
        let prompt = patient_assistant_prompt("  ¿Cuántas veces al día?  ", &snapshot());

        assert!(prompt.contains("Paciente: Elena"));
        assert!(prompt.contains("30%"));
        assert!(prompt.contains("- Movilidad Escapular: Rota los hombros suavemente. (2 series de 15 reps)"));
        assert!(prompt.ends_with("\"¿Cuántas veces al día?\""));
    }

    #[test]
    fn test_empty_plan_is_stated() {
        let mut snapshot = snapshot();
        snapshot.exercises.clear();
        assert!(patient_assistant_prompt("hola", &snapshot).contains("(ninguno)"));
    }

    #[test]
    fn test_global_system_depends_on_role() {
        assert_ne!(
            global_system(AssistantRole::Clinician),
            global_system(AssistantRole::Patient)
        );
    }

    #[test]
    fn test_posture_prompt_lists_every_joint() {
        let angles = JointAngles {
            shoulder: 85.4,
            elbow: 170.0,
            hip: 92.6,
            knee: 88.0,
        };
        let prompt = posture_prompt(&angles, " Sentadilla ");

        assert!(prompt.starts_with("El paciente está realizando el ejercicio: \"Sentadilla\"."));
        assert!(prompt.contains("- Hombro: 85 grados"));
        assert!(prompt.contains("- Codo: 170 grados"));
        assert!(prompt.contains("- Cadera: 93 grados"));
        assert!(prompt.contains("- Rodilla: 88 grados"));
    }

    #[test]
    fn test_empty_and_error_fallbacks_differ_per_kind() {
        for kind in [
            PromptKind::PatientAssistant,
            PromptKind::PostureFeedback,
            PromptKind::Global(AssistantRole::Clinician),
        ] {
            assert_ne!(kind.fallback(), kind.empty_fallback());
        }
    }
}
