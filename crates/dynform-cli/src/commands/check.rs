//! Schema check command

use crate::output::OutputFormat;
use anyhow::Result;
use dynform_engine::{FieldDefinition, FormDefinition};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub slug: String,
    pub schema_version: u32,
    pub fields: Vec<FieldSummary>,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct FieldSummary {
    #[tabled(rename = "#")]
    pub index: usize,
    pub key: String,
    pub label: String,
    #[tabled(rename = "type")]
    pub field_type: String,
    pub required: String,
}

impl FieldSummary {
    fn new(index: usize, field: &FieldDefinition) -> Self {
        let required = match (&field.conditional_required, field.required) {
            (Some(rule), true) => format!("yes (also when {})", rule),
            (Some(rule), false) => format!("when {}", rule),
            (None, true) => "yes".to_string(),
            (None, false) => "no".to_string(),
        };
        Self {
            index,
            key: field.key.clone(),
            label: field.label.clone(),
            field_type: field.field_type.to_string(),
            required,
        }
    }
}

impl From<&FormDefinition> for CheckReport {
    fn from(form: &FormDefinition) -> Self {
        Self {
            name: form.name.clone(),
            slug: form.slug.clone(),
            schema_version: form.schema_version,
            fields: form
                .schema
                .fields()
                .iter()
                .enumerate()
                .map(|(i, f)| FieldSummary::new(i + 1, f))
                .collect(),
        }
    }
}

pub fn handle(path: &Path, format: OutputFormat) -> Result<()> {
    let form = super::load_form(path)?;
    tracing::debug!(slug = %form.slug, fields = form.schema.len(), "schema loaded");
    let report = CheckReport::from(&form);
    format.print(&report, |r| r.fields.clone())?;
    if format == OutputFormat::Table {
        println!("{} {} ({} fields)", crate::ok_label(), report.slug, report.fields.len());
    }
    Ok(())
}
