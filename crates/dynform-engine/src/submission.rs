//! Submission boundary
//!
//! A valid form is handed to a [`Submitter`] as `(form, text values, files)`.
//! Transport failures come back as [`SubmissionError`] and never clear the
//! entered values.

use crate::schema::FormSchema;
use crate::value::{FieldValue, FileRef, FormValues};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Banner text when the collaborator gives no message
pub const DEFAULT_FAILURE_MESSAGE: &str = "Submission failed. Please try again.";

/// Multipart part name prefix for uploaded files
pub const FILE_PART_PREFIX: &str = "file__";

/// Failure reported by the transport collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("submission rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl SubmissionError {
    /// Form-level banner text
    pub fn banner_message(&self) -> String {
        let message = match self {
            Self::Network(message) => message,
            Self::Rejected { message, .. } => message,
        };
        if message.trim().is_empty() {
            DEFAULT_FAILURE_MESSAGE.to_string()
        } else {
            message.clone()
        }
    }
}

/// Acknowledgement from the collaborator
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission_id: String,
}

/// One multipart body part
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    Text { name: String, value: String },
    File { name: String, file: FileRef },
}

/// What gets sent for a valid form
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmissionPayload {
    /// Form identifier (slug)
    pub form: String,
    pub schema_version: u32,
    pub text_values: BTreeMap<String, serde_json::Value>,
    pub files: BTreeMap<String, Vec<FileRef>>,
}

impl SubmissionPayload {
    /// Split a values snapshot: non-empty file lists go to `files`, booleans
    /// always go to `text_values`, empty strings are dropped. Keys outside
    /// the schema are not sent.
    pub fn build(
        form: impl Into<String>,
        schema_version: u32,
        schema: &FormSchema,
        values: &FormValues,
    ) -> Self {
        let mut text_values = BTreeMap::new();
        let mut files = BTreeMap::new();

        for field in schema.fields() {
            let Some(value) = values.get(&field.key) else {
                continue;
            };
            match value {
                FieldValue::Files(list) if !list.is_empty() => {
                    files.insert(field.key.clone(), list.clone());
                }
                FieldValue::Files(_) => {}
                FieldValue::Text(s) if s.is_empty() => {}
                other => {
                    text_values.insert(field.key.clone(), other.to_json());
                }
            }
        }

        Self {
            form: form.into(),
            schema_version,
            text_values,
            files,
        }
    }

    /// Multipart layout: `form`, `responses` (JSON of text values), then one
    /// `file__<key>` part per file
    pub fn multipart_parts(&self) -> Vec<Part> {
        let mut parts = vec![
            Part::Text {
                name: "form".into(),
                value: self.form.clone(),
            },
            Part::Text {
                name: "responses".into(),
                value: serde_json::to_string(&self.text_values).unwrap_or_else(|_| "{}".into()),
            },
        ];
        for (key, list) in &self.files {
            for file in list {
                parts.push(Part::File {
                    name: format!("{}{}", FILE_PART_PREFIX, key),
                    file: file.clone(),
                });
            }
        }
        parts
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

/// External transport collaborator
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmissionReceipt, SubmissionError>;
}

/// In-memory submitter (for testing and development)
#[derive(Default)]
pub struct InMemorySubmitter {
    received: Mutex<Vec<SubmissionPayload>>,
    fail_with: Mutex<Option<SubmissionError>>,
}

impl InMemorySubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every following submission with `error`
    pub fn fail_with(&self, error: SubmissionError) {
        *self.fail_with.lock() = Some(error);
    }

    pub fn succeed(&self) {
        *self.fail_with.lock() = None;
    }

    pub fn received(&self) -> Vec<SubmissionPayload> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl Submitter for InMemorySubmitter {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmissionReceipt, SubmissionError> {
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }
        let mut received = self.received.lock();
        received.push(payload);
        Ok(SubmissionReceipt {
            submission_id: uuid::Uuid::new_v4().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;
    use crate::value::values_from_json;
    use serde_json::json;

    fn schema() -> FormSchema {
        parse_schema(&json!({
            "fields": [
                {"key": "full_name", "label": "Full Name", "field_type": "text"},
                {"key": "loan_amount", "label": "Loan Amount", "field_type": "number"},
                {"key": "agree_terms", "label": "Agree", "field_type": "checkbox"},
                {"key": "nickname", "label": "Nickname", "field_type": "text"},
                {"key": "id_docs", "label": "ID", "field_type": "file"},
                {"key": "extra_docs", "label": "Extra", "field_type": "file"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_payload_partition() {
        let values = values_from_json(&json!({
            "full_name": "Jane Wanjiru",
            "loan_amount": 150000,
            "agree_terms": false,
            "nickname": "",
            "id_docs": [
                {"name": "front.png", "size": 100, "type": "image/png"},
                {"name": "back.png", "size": 100, "type": "image/png"}
            ],
            "extra_docs": [],
            "not_in_schema": "x"
        }));

        let payload = SubmissionPayload::build("loan-application", 1, &schema(), &values);
        assert_eq!(payload.text_values.get("full_name"), Some(&json!("Jane Wanjiru")));
        assert_eq!(payload.text_values.get("loan_amount"), Some(&json!(150000)));
        assert_eq!(payload.text_values.get("agree_terms"), Some(&json!(false)));
        assert!(!payload.text_values.contains_key("nickname"));
        assert!(!payload.text_values.contains_key("not_in_schema"));
        assert_eq!(payload.files.get("id_docs").map(Vec::len), Some(2));
        assert!(!payload.files.contains_key("extra_docs"));
        assert_eq!(payload.file_count(), 2);
    }

    #[test]
    fn test_multipart_parts() {
        let values = values_from_json(&json!({
            "full_name": "Jane",
            "id_docs": {"name": "id.pdf", "size": 10, "type": "application/pdf"}
        }));
        let parts = SubmissionPayload::build("kyc", 1, &schema(), &values).multipart_parts();

        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[0],
            Part::Text {
                name: "form".into(),
                value: "kyc".into()
            }
        );
        assert_eq!(
            parts[1],
            Part::Text {
                name: "responses".into(),
                value: r#"{"full_name":"Jane"}"#.into()
            }
        );
        assert!(matches!(&parts[2], Part::File { name, .. } if name == "file__id_docs"));
    }

    #[test]
    fn test_banner_message_fallback() {
        assert_eq!(
            SubmissionError::Network(String::new()).banner_message(),
            DEFAULT_FAILURE_MESSAGE
        );
        let rejected = SubmissionError::Rejected {
            status: 400,
            message: "Form is closed".into(),
        };
        assert_eq!(rejected.banner_message(), "Form is closed");
    }

    #[tokio::test]
    async fn test_in_memory_submitter() {
        let submitter = InMemorySubmitter::new();
        let payload = SubmissionPayload::build("kyc", 1, &schema(), &FormValues::new());

        let receipt = submitter.submit(payload.clone()).await.unwrap();
        assert!(!receipt.submission_id.is_empty());
        assert_eq!(submitter.received(), vec![payload.clone()]);

        submitter.fail_with(SubmissionError::Network("connection reset".into()));
        assert!(submitter.submit(payload).await.is_err());
        assert_eq!(submitter.received().len(), 1);
    }
}
