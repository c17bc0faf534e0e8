//! Form session events
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    ValueChanged { key: String, revalidated: Vec<String> },
    SubmissionRejected { invalid_fields: usize },
    SubmissionStarted { form: String },
    Submitted { form: String, submission_id: String },
    SubmissionFailed { form: String, message: String },
    Reset,
}

impl FormEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ValueChanged { .. } => "form.value_changed",
            Self::SubmissionRejected { .. } => "form.submission_rejected",
            Self::SubmissionStarted { .. } => "form.submission_started",
            Self::Submitted { .. } => "form.submitted",
            Self::SubmissionFailed { .. } => "form.submission_failed",
            Self::Reset => "form.reset",
        }
    }
}
