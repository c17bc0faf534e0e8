//! Form definition: admin-facing metadata around a schema

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{parse_schema, FormSchema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A published (or draft) form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub schema: FormSchema,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl FormDefinition {
    /// New definition; the slug is derived from `name`
    pub fn create(name: impl Into<String>, schema: FormSchema) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            description: String::new(),
            schema,
            schema_version: default_schema_version(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse the API representation `{name, slug?, description?, schema: {fields}}`.
    /// A missing or empty slug is derived from the name.
    pub fn from_json_str(raw: &str) -> SchemaResult<Self> {
        let raw: Value =
            serde_json::from_str(raw).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        // Parse the schema on its own first so its error keeps the field index
        parse_schema(raw.get("schema").unwrap_or(&Value::Null))?;
        let mut definition: Self =
            serde_json::from_value(raw).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        if definition.slug.is_empty() {
            definition.slug = slugify(&definition.name);
        }
        Ok(definition)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Swap in a new schema and bump the version
    pub fn replace_schema(&mut self, schema: FormSchema) {
        self.schema = schema;
        self.schema_version += 1;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

/// URL slug: lowercase, runs of anything outside `[a-z0-9]` become one `-`,
/// no leading or trailing `-`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaViolation;
    use crate::schema::{FieldDefinition, FieldType};

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Loan Application 2024"), "loan-application-2024");
        assert_eq!(slugify("  KYC -- Onboarding!! "), "kyc-onboarding");
        assert_eq!(slugify("Ünïcode Form"), "n-code-form");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_create_and_version() {
        let schema = FormSchema::new(vec![FieldDefinition::new("a", "A", FieldType::Text)]).unwrap();
        let mut form = FormDefinition::create("Loan Application", schema.clone());
        assert_eq!(form.slug, "loan-application");
        assert_eq!(form.schema_version, 1);
        assert!(form.is_active);

        form.replace_schema(schema);
        assert_eq!(form.schema_version, 2);
        form.deactivate();
        assert!(!form.is_active);
    }

    #[test]
    fn test_from_json() {
        let form = FormDefinition::from_json_str(
            r#"{
                "name": "Client Onboarding",
                "schema": {"fields": [{"key": "full_name", "label": "Full Name", "field_type": "text"}]}
            }"#,
        )
        .unwrap();
        assert_eq!(form.slug, "client-onboarding");
        assert_eq!(form.schema.len(), 1);

        let err = FormDefinition::from_json_str(r#"{"name": "Broken", "schema": {"fields": [{"key": "x"}]}}"#)
            .unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(err.violation(), Some(&SchemaViolation::MissingLabel));

        let err = FormDefinition::from_json_str(r#"{"name": "No schema"}"#).unwrap_err();
        assert_eq!(err, SchemaError::MissingFields);
    }
}
