use crate::prompt::{
    global_system, patient_assistant_prompt, posture_prompt, AssistantRole, JointAngles,
    PatientSnapshot, PromptKind, PATIENT_ASSISTANT_SYSTEM, POSTURE_FEEDBACK_SYSTEM,
};
use crate::{AdvisoryError, TextGenerator};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Fail-soft front for a [`TextGenerator`].
///
/// Every call returns text. Service errors and timeouts become the fallback sentence for
/// the request kind; an empty completion becomes its empty-answer sentence.
#[derive(Clone)]
pub struct Advisor {
    generator: Arc<dyn TextGenerator>,
}

impl Advisor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Answer a patient's question about their own plan.
    pub fn generate(&self, question: &str, snapshot: &PatientSnapshot) -> String {
        let prompt = patient_assistant_prompt(question, snapshot);
        self.complete(PromptKind::PatientAssistant, PATIENT_ASSISTANT_SYSTEM, &prompt)
    }

    /// Posture tips for `exercise_name` from the captured joint angles.
    pub fn posture_feedback(&self, angles: &JointAngles, exercise_name: &str) -> String {
        let prompt = posture_prompt(angles, exercise_name);
        self.complete(PromptKind::PostureFeedback, POSTURE_FEEDBACK_SYSTEM, &prompt)
    }

    /// Free-form question to the global assistant.
    pub fn ask_global(&self, message: &str, role: AssistantRole) -> String {
        self.complete(PromptKind::Global(role), global_system(role), message)
    }

    /// Run [`Advisor::generate`] on a background thread.
    pub fn spawn(&self, question: String, snapshot: PatientSnapshot) -> PendingAdvice {
        let advisor = self.clone();
        PendingAdvice::run(PromptKind::PatientAssistant, move || {
            advisor.generate(&question, &snapshot)
        })
    }

    /// Run [`Advisor::posture_feedback`] on a background thread.
    pub fn spawn_posture_feedback(&self, angles: JointAngles, exercise_name: String) -> PendingAdvice {
        let advisor = self.clone();
        PendingAdvice::run(PromptKind::PostureFeedback, move || {
            advisor.posture_feedback(&angles, &exercise_name)
        })
    }

    /// Run [`Advisor::ask_global`] on a background thread.
    pub fn spawn_global(&self, message: String, role: AssistantRole) -> PendingAdvice {
        let advisor = self.clone();
        PendingAdvice::run(PromptKind::Global(role), move || {
            advisor.ask_global(&message, role)
        })
    }

    fn complete(&self, kind: PromptKind, system: &str, prompt: &str) -> String {
        let result = self
            .generator
            .generate(system, prompt)
            .and_then(|text| {
                let text = text.trim();
                if text.is_empty() {
                    Err(AdvisoryError::EmptyResponse)
                } else {
                    Ok(text.to_string())
                }
            });

        match result {
            Ok(text) => text,
            Err(AdvisoryError::EmptyResponse) => {
                tracing::warn!(kind = ?kind, "empty completion, using fallback");
                kind.empty_fallback().to_string()
            }
            Err(e) => {
                tracing::warn!(kind = ?kind, "advisory text unavailable, using fallback: {}", e);
                kind.fallback().to_string()
            }
        }
    }
}

/// Advisory text being produced on another thread.
///
/// Dropping it discards the result; the worker finishes on its own.
pub struct PendingAdvice {
    kind: PromptKind,
    rx: Receiver<String>,
}

impl PendingAdvice {
    fn run<F>(kind: PromptKind, work: F) -> Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if tx.send(work()).is_err() {
                tracing::debug!("advisory result discarded: requester went away");
            }
        });
        Self { kind, rx }
    }

    /// The text if it has arrived, without blocking.
    pub fn try_take(&self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(text) => Some(text),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.kind.fallback().to_string()),
        }
    }

    /// Wait up to `timeout`. `None` means still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<String> {
        match self.rx.recv_timeout(timeout) {
            Ok(text) => Some(text),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.kind.fallback().to_string()),
        }
    }

    /// Block until the text is ready.
    pub fn wait(self) -> String {
        self.rx
            .recv()
            .unwrap_or_else(|_| self.kind.fallback().to_string())
    }
}
