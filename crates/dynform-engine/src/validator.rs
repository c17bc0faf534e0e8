//! Field Validator
//!
//! Produces the ordered error messages for one field. A failed required
//! check is the only message for that field; otherwise type-specific checks
//! accumulate independently (every file of a multi-file value is checked).

use crate::conditional::evaluate;
use crate::config::FileConstraints;
use crate::schema::{FieldDefinition, FieldRules, FieldType};
use crate::value::{format_number, parse_number, FieldValue, FileRef, FormValues};
use chrono::{DateTime, NaiveDate};

/// Why (and whether) a field is required right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Optional,
    /// `required: true` in the schema
    Static,
    /// The field's conditional rule currently fires
    Conditional,
}

impl Requirement {
    /// Resolve against the live values. A firing conditional rule takes
    /// precedence so its custom message is the one shown.
    pub fn resolve(field: &FieldDefinition, values: &FormValues) -> Self {
        let conditional = field
            .conditional_required
            .as_ref()
            .is_some_and(|rule| evaluate(rule, values.get(&rule.depends_on)));

        if conditional {
            Self::Conditional
        } else if field.required {
            Self::Static
        } else {
            Self::Optional
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Optional)
    }
}

/// Stateless per-field checker carrying the file constraints
#[derive(Clone, Debug, Default)]
pub struct FieldValidator {
    files: FileConstraints,
}

impl FieldValidator {
    pub fn new(files: FileConstraints) -> Self {
        Self { files }
    }

    pub fn file_constraints(&self) -> &FileConstraints {
        &self.files
    }

    /// Validate `value` for `field`; empty result means valid
    pub fn validate(
        &self,
        field: &FieldDefinition,
        value: Option<&FieldValue>,
        requirement: Requirement,
    ) -> Vec<String> {
        let value = match value {
            Some(v) if !v.is_absent() => v,
            _ => {
                return if requirement.is_required() {
                    vec![required_message(field, requirement)]
                } else {
                    Vec::new()
                };
            }
        };

        let mut errors = Vec::new();
        match field.field_type {
            FieldType::Text => check_text(field, value, &mut errors),
            FieldType::Number => check_number(field, value, &mut errors),
            FieldType::Date => check_date(field, value, &mut errors),
            FieldType::Dropdown => check_dropdown(field, value, &mut errors),
            FieldType::Checkbox => check_checkbox(field, value, &mut errors),
            FieldType::File => self.check_files(field, value, &mut errors),
        }
        errors
    }

    fn check_files(&self, field: &FieldDefinition, value: &FieldValue, errors: &mut Vec<String>) {
        let Some(files) = value.files() else {
            errors.push(format!("{} must be a file upload", field.label));
            return;
        };
        for file in files {
            self.check_file(file, errors);
        }
    }

    fn check_file(&self, file: &FileRef, errors: &mut Vec<String>) {
        if file.size > self.files.max_size_bytes {
            errors.push(format!(
                "File \"{}\" exceeds {} limit",
                file.name,
                self.files.max_size_label()
            ));
        }
        if !self.files.allows_mime(&file.mime_type) {
            errors.push(format!(
                "File \"{}\" has invalid type. Only PDF, JPG, PNG, DOC, DOCX allowed",
                file.name
            ));
        }
    }
}

/// Validate with the default file constraints
pub fn validate_field(
    field: &FieldDefinition,
    value: Option<&FieldValue>,
    requirement: Requirement,
) -> Vec<String> {
    FieldValidator::default().validate(field, value, requirement)
}

fn required_message(field: &FieldDefinition, requirement: Requirement) -> String {
    let custom = match requirement {
        Requirement::Conditional => field
            .conditional_required
            .as_ref()
            .and_then(|rule| rule.message.clone()),
        _ => None,
    };
    custom.unwrap_or_else(|| format!("{} is required", field.label))
}

fn rules(field: &FieldDefinition) -> Option<&FieldRules> {
    field.validation.as_ref()
}

fn check_text(field: &FieldDefinition, value: &FieldValue, errors: &mut Vec<String>) {
    let Some(text) = value.as_text() else {
        errors.push(format!("{} must be text", field.label));
        return;
    };
    let Some(rules) = rules(field) else {
        return;
    };

    let length = text.chars().count() as f64;
    if let Some(min) = rules.min {
        if length < min {
            errors.push(format!(
                "{} must be at least {} characters",
                field.label,
                format_number(min)
            ));
        }
    }
    if let Some(max) = rules.max {
        if length > max {
            errors.push(format!(
                "{} must be at most {} characters",
                field.label,
                format_number(max)
            ));
        }
    }
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(&text) {
            errors.push(format!("{} has an invalid format", field.label));
        }
    }
}

fn check_number(field: &FieldDefinition, value: &FieldValue, errors: &mut Vec<String>) {
    let number = match value {
        FieldValue::Number(n) if n.is_finite() => *n,
        FieldValue::Text(s) => match parse_number(s) {
            Some(n) => n,
            None => {
                errors.push(format!("{} must be a valid number", field.label));
                return;
            }
        },
        _ => {
            errors.push(format!("{} must be a valid number", field.label));
            return;
        }
    };
    let Some(rules) = rules(field) else {
        return;
    };

    if let Some(min) = rules.min {
        if number < min {
            errors.push(format!("{} must be at least {}", field.label, format_number(min)));
        }
    }
    if let Some(max) = rules.max {
        if number > max {
            errors.push(format!("{} must be at most {}", field.label, format_number(max)));
        }
    }
}

fn check_date(field: &FieldDefinition, value: &FieldValue, errors: &mut Vec<String>) {
    let valid = match value {
        FieldValue::Text(s) => is_calendar_date(s.trim()),
        _ => false,
    };
    if !valid {
        errors.push(format!("{} must be a valid date", field.label));
    }
}

/// `YYYY-MM-DD` (what a date input submits) or a full RFC 3339 timestamp
fn is_calendar_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

fn check_dropdown(field: &FieldDefinition, value: &FieldValue, errors: &mut Vec<String>) {
    let Some(chosen) = value.as_text() else {
        errors.push(format!("{} must be one of the listed options", field.label));
        return;
    };
    if !field.options.iter().any(|o| *o == chosen) {
        errors.push(format!("\"{}\" is an invalid option for {}", chosen, field.label));
    }
}

fn check_checkbox(field: &FieldDefinition, value: &FieldValue, errors: &mut Vec<String>) {
    if !matches!(value, FieldValue::Bool(_)) {
        errors.push(format!("{} must be checked or unchecked", field.label));
    }
}
