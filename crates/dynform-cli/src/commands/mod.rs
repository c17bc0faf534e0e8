//! CLI Commands

pub mod check;
pub mod payload;
pub mod replay;
pub mod slug;
pub mod validate;

use anyhow::{Context, Result};
use dynform_engine::{values_from_json, FormDefinition, FormSchema, FormValues};
use serde_json::Value;
use std::fs;
use std::path::Path;

fn read_json(path: &Path) -> Result<(String, Value)> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok((raw, value))
}

/// Load a form from either a bare schema `{fields}` or a definition
/// `{name, schema}`. A bare schema is named after the file stem.
pub fn load_form(path: &Path) -> Result<FormDefinition> {
    let (raw, value) = read_json(path)?;
    let context = || format!("invalid schema in {}", path.display());

    if value.get("schema").is_some() {
        return FormDefinition::from_json_str(&raw).with_context(context);
    }
    let schema = FormSchema::try_from(value).with_context(context)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "form".to_string());
    Ok(FormDefinition::create(name, schema))
}

/// Load a values snapshot `{key: value}`
pub fn load_values(path: &Path) -> Result<FormValues> {
    let (_, value) = read_json(path)?;
    anyhow::ensure!(value.is_object(), "{}: values must be a JSON object", path.display());
    Ok(values_from_json(&value))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub const LOAN_SCHEMA: &str = r#"{
        "fields": [
            {"key": "full_name", "label": "Full Name", "field_type": "text", "required": true},
            {"key": "loan_amount", "label": "Loan Amount", "field_type": "number", "required": true},
            {
                "key": "income_proof",
                "label": "Income Proof",
                "field_type": "file",
                "conditional_required": {
                    "depends_on": "loan_amount",
                    "operator": "gt",
                    "value": 100000,
                    "message": "Income proof required for loans above KES 100,000"
                }
            }
        ]
    }"#;

    pub fn json_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }
}
