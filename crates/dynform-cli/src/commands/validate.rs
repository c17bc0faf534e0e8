//! Values validation command

use crate::output::OutputFormat;
use anyhow::Result;
use dynform_engine::{EngineConfig, FormSchema, FormValidator, FormValues, SubmitError, ValidationReport};
use std::path::Path;
use tabled::Tabled;

#[derive(Debug, Tabled)]
pub struct ReportRow {
    pub field: String,
    pub status: String,
    pub messages: String,
}

/// One row per schema field, in schema order
pub fn report_rows(schema: &FormSchema, report: &ValidationReport) -> Vec<ReportRow> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let errors = report.errors_for(&field.key);
            ReportRow {
                field: field.key.clone(),
                status: if errors.is_empty() { "ok" } else { "invalid" }.to_string(),
                messages: errors.join("\n"),
            }
        })
        .collect()
}

pub fn run(schema: &FormSchema, values: &FormValues, config: &EngineConfig) -> ValidationReport {
    let report = FormValidator::new(config).validate_form(schema, values);
    tracing::debug!(invalid = report.invalid_count(), "values validated");
    report
}

/// Print the report; an invalid form is an error so the exit code reflects it
pub fn handle(schema_path: &Path, values_path: &Path, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let form = super::load_form(schema_path)?;
    let values = super::load_values(values_path)?;
    let report = run(&form.schema, &values, config);

    format.print(&report, |r| report_rows(&form.schema, r))?;
    if report.is_valid {
        if format == OutputFormat::Table {
            println!("{} all {} fields valid", crate::ok_label(), form.schema.len());
        }
        Ok(())
    } else {
        Err(SubmitError::Invalid(report).into())
    }
}
