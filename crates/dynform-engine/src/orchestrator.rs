//! Form Validation Orchestrator
//!
//! Runs the field validator across a whole schema against one values
//! snapshot. Pure: same `(schema, values)` in, same report out, so the
//! rendering layer can call it on every keystroke.

use crate::config::EngineConfig;
use crate::schema::{FieldDefinition, FormSchema};
use crate::validator::{FieldValidator, Requirement};
use crate::value::FormValues;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field key → ordered messages (empty = valid) plus the overall verdict
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: BTreeMap<String, Vec<String>>,
    pub is_valid: bool,
}

impl ValidationReport {
    pub(crate) fn from_errors(errors: BTreeMap<String, Vec<String>>) -> Self {
        let is_valid = errors.values().all(Vec::is_empty);
        Self { errors, is_valid }
    }

    /// Messages for one field; empty when valid or unknown
    pub fn errors_for(&self, key: &str) -> &[String] {
        self.errors.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn invalid_count(&self) -> usize {
        self.errors.values().filter(|e| !e.is_empty()).count()
    }

    /// Keys of invalid fields in schema (tab) order, for focusing the first one
    pub fn invalid_keys<'a>(&'a self, schema: &'a FormSchema) -> impl Iterator<Item = &'a str> + 'a {
        schema
            .fields()
            .iter()
            .map(|f| f.key.as_str())
            .filter(move |key| !self.errors_for(key).is_empty())
    }
}

/// Whole-form validator
#[derive(Clone, Debug, Default)]
pub struct FormValidator {
    fields: FieldValidator,
}

impl FormValidator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            fields: FieldValidator::new(config.files.clone()),
        }
    }

    /// Requirement of `field` under the current values
    pub fn requirement(&self, field: &FieldDefinition, values: &FormValues) -> Requirement {
        Requirement::resolve(field, values)
    }

    /// Errors for a single field under the current values
    pub fn validate_field(&self, field: &FieldDefinition, values: &FormValues) -> Vec<String> {
        let requirement = self.requirement(field, values);
        self.fields.validate(field, values.get(&field.key), requirement)
    }

    /// Validate every field in schema order. Missing values are absent;
    /// values for keys outside the schema are ignored.
    pub fn validate_form(&self, schema: &FormSchema, values: &FormValues) -> ValidationReport {
        let errors = schema
            .fields()
            .iter()
            .map(|field| (field.key.clone(), self.validate_field(field, values)))
            .collect();
        ValidationReport::from_errors(errors)
    }
}

/// Validate with the default configuration
pub fn validate_form(schema: &FormSchema, values: &FormValues) -> ValidationReport {
    FormValidator::default().validate_form(schema, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;
    use crate::value::{values_from_json, FieldValue, FileRef};
    use serde_json::json;

    fn loan_schema() -> FormSchema {
        parse_schema(&json!({
            "fields": [
                {
                    "key": "income_proof",
                    "label": "Income Proof",
                    "field_type": "file",
                    "required": false,
                    "conditional_required": {
                        "depends_on": "loan_amount",
                        "operator": "gt",
                        "value": 100000,
                        "message": "Income proof required for loans above KES 100,000"
                    }
                },
                {"key": "loan_amount", "label": "Loan Amount", "field_type": "number", "required": true}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_conditional_requirement_fires() {
        let report = validate_form(&loan_schema(), &values_from_json(&json!({"loan_amount": 150000})));
        assert_eq!(
            report.errors_for("income_proof"),
            ["Income proof required for loans above KES 100,000"]
        );
        assert!(report.errors_for("loan_amount").is_empty());
        assert!(!report.is_valid);
    }

    #[test]
    fn test_conditional_requirement_idle() {
        let report = validate_form(&loan_schema(), &values_from_json(&json!({"loan_amount": 50000})));
        assert!(report.errors_for("income_proof").is_empty());
        assert!(report.is_valid);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_missing_values_are_absent() {
        let report = validate_form(&loan_schema(), &FormValues::new());
        assert_eq!(report.errors_for("loan_amount"), ["Loan Amount is required"]);
        assert!(report.errors_for("income_proof").is_empty());
        assert_eq!(report.invalid_count(), 1);
    }

    #[test]
    fn test_unknown_value_keys_ignored() {
        let values = values_from_json(&json!({"loan_amount": 1000, "injected": "x"}));
        let report = validate_form(&loan_schema(), &values);
        assert!(report.is_valid);
        assert!(!report.errors.contains_key("injected"));
    }

    #[test]
    fn test_idempotent() {
        let schema = loan_schema();
        let mut values = values_from_json(&json!({"loan_amount": "abc"}));
        values.insert(
            "income_proof".into(),
            FieldValue::Files(vec![FileRef::new("x.exe", 10, "application/x-msdownload")]),
        );
        let first = validate_form(&schema, &values);
        let second = validate_form(&schema, &values);
        assert_eq!(first, second);
        assert_eq!(first.invalid_count(), 2);
    }

    #[test]
    fn test_wrong_kind_values_are_not_absent() {
        let schema = parse_schema(&json!({
            "fields": [
                {"key": "doc", "label": "Document", "field_type": "file"},
                {"key": "amount", "label": "Amount", "field_type": "number"},
                {"key": "name", "label": "Name", "field_type": "text", "required": true}
            ]
        }))
        .unwrap();
        let values = values_from_json(&json!({
            "doc": {"name": "payload.exe", "size": 1.5e7, "type": "application/x-msdownload"},
            "amount": [1, 2],
            "name": {"first": "Jane"}
        }));
        assert_eq!(values.len(), 3);

        let report = validate_form(&schema, &values);
        assert_eq!(
            report.errors_for("doc"),
            [
                "File \"payload.exe\" exceeds 5MB limit",
                "File \"payload.exe\" has invalid type. Only PDF, JPG, PNG, DOC, DOCX allowed",
            ]
        );
        assert_eq!(report.errors_for("amount"), ["Amount must be a valid number"]);
        assert_eq!(report.errors_for("name"), ["Name must be text"]);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_text_dependency_compares_lexically() {
        let values = values_from_json(&json!({"loan_amount": "many"}));
        let report = validate_form(&loan_schema(), &values);
        // "many" is not numeric, so it is compared with "100000" as text
        assert_eq!(
            report.errors_for("income_proof"),
            ["Income proof required for loans above KES 100,000"]
        );
        assert_eq!(report.errors_for("loan_amount"), ["Loan Amount must be a valid number"]);
        assert_eq!(report.invalid_count(), 2);
    }

    #[test]
    fn test_all_violations_reported() {
        let schema = parse_schema(&json!({
            "fields": [
                {"key": "full_name", "label": "Full Name", "field_type": "text", "required": true},
                {"key": "email", "label": "Email", "field_type": "text", "required": true},
                {"key": "employment_status", "label": "Employment Status", "field_type": "dropdown",
                 "options": ["Employed", "Self-Employed", "Unemployed"], "required": true},
                {"key": "agree_terms", "label": "I agree to the terms", "field_type": "checkbox", "required": true}
            ]
        }))
        .unwrap();
        let report = validate_form(&schema, &values_from_json(&json!({"agree_terms": false})));
        assert_eq!(report.invalid_count(), 4);
        let keys: Vec<_> = report.invalid_keys(&schema).collect();
        assert_eq!(keys, vec!["full_name", "email", "employment_status", "agree_terms"]);
    }
}
