//! Show what a submission would send

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use dynform_engine::{
    EngineConfig, FormDefinition, FormSession, FormValues, InMemorySubmitter, Part, SubmissionPayload,
};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

#[derive(Debug, Tabled)]
pub struct PartRow {
    pub part: String,
    pub kind: String,
    pub content: String,
}

impl From<Part> for PartRow {
    fn from(part: Part) -> Self {
        match part {
            Part::Text { name, value } => Self {
                part: name,
                kind: "text".into(),
                content: value,
            },
            Part::File { name, file } => Self {
                part: name,
                kind: "file".into(),
                content: format!("{} ({}, {} bytes)", file.name, file.mime_type, file.size),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PayloadPreview {
    pub submission_id: String,
    pub payload: SubmissionPayload,
}

/// Run the values through a session and an in-memory submitter
pub async fn preview(form: &FormDefinition, values: FormValues, config: &EngineConfig) -> Result<PayloadPreview> {
    let mut session = FormSession::from_definition(form, config);
    for (key, value) in values {
        session.set_value(&key, Some(value));
    }

    let submitter = InMemorySubmitter::new();
    let receipt = session.submit(&submitter).await?;
    let payload = submitter
        .received()
        .pop()
        .context("submitter recorded no payload")?;
    Ok(PayloadPreview {
        submission_id: receipt.submission_id,
        payload,
    })
}

pub async fn handle(
    schema_path: &Path,
    values_path: &Path,
    config: &EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    let form = super::load_form(schema_path)?;
    let values = super::load_values(values_path)?;
    let preview = preview(&form, values, config).await?;
    format.print(&preview, |p| {
        p.payload.multipart_parts().into_iter().map(PartRow::from).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use dynform_engine::{values_from_json, SubmitError};
    use serde_json::json;

    fn form() -> FormDefinition {
        super::super::load_form(json_file(LOAN_SCHEMA).path()).unwrap()
    }

    #[tokio::test]
    async fn test_preview_valid_form() {
        let values = values_from_json(&json!({
            "full_name": "Jane Wanjiru",
            "loan_amount": 150000,
            "income_proof": {"name": "payslip.pdf", "size": 1024, "type": "application/pdf"},
            "unknown": "dropped"
        }));
        let preview = preview(&form(), values, &EngineConfig::default()).await.unwrap();
        assert!(!preview.submission_id.is_empty());
        assert_eq!(preview.payload.file_count(), 1);
        assert!(!preview.payload.text_values.contains_key("unknown"));

        let rows: Vec<PartRow> = preview
            .payload
            .multipart_parts()
            .into_iter()
            .map(PartRow::from)
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].part, "file__income_proof");
        assert_eq!(rows[2].content, "payslip.pdf (application/pdf, 1024 bytes)");
    }

    #[tokio::test]
    async fn test_preview_invalid_form() {
        let values = values_from_json(&json!({"full_name": "Jane", "loan_amount": 250000}));
        let err = preview(&form(), values, &EngineConfig::default()).await.unwrap_err();
        match err.downcast_ref::<SubmitError>() {
            Some(SubmitError::Invalid(report)) => {
                assert_eq!(
                    report.errors_for("income_proof"),
                    ["Income proof required for loans above KES 100,000"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
