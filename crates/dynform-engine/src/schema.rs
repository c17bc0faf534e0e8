//! Schema Model
//!
//! Typed form schema as authored by admins. [`parse_schema`] walks the raw
//! JSON itself instead of deriving `Deserialize` so that the first violation
//! can be reported with the 1-based field index and the failed constraint.
//!
//! Checks run in two passes: every field's own structure in display order,
//! then `conditional_required.depends_on` references (a rule may point at a
//! field defined later in the form).

use crate::error::{SchemaError, SchemaResult, SchemaViolation};
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// Core Types
// =============================================================================

/// Closed set of field kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Dropdown,
    Checkbox,
    File,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Date,
        FieldType::Dropdown,
        FieldType::Checkbox,
        FieldType::File,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
            Self::File => "file",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a conditional rule.
///
/// Tokens outside the known set are kept verbatim in `Unknown` so a schema
/// still loads and re-serializes unchanged; such a rule never fires.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Unknown(token) => token,
        }
    }
}

impl From<&str> for Operator {
    fn from(token: &str) -> Self {
        match token {
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Right-hand side of a conditional rule
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Text(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&crate::value::format_number(*n)),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Makes a field required while `depends_on`'s live value satisfies the
/// comparison
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionalRule {
    pub depends_on: String,
    pub operator: Operator,
    pub value: Operand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConditionalRule {
    pub fn new(depends_on: impl Into<String>, operator: Operator, value: Operand) -> Self {
        Self {
            depends_on: depends_on.into(),
            operator,
            value,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for ConditionalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.depends_on, self.operator.as_str(), self.value)
    }
}

/// Anchored regular expression; compares and serializes by its source
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` so that it must match the whole value
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        // Must stand on its own, or a stray `)` could close the anchor group
        Regex::new(&source)?;
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Optional extra constraints: numeric bounds for `number`, length bounds
/// and a pattern for `text`
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FieldRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
}

impl FieldRules {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.pattern.is_none()
    }
}

/// One input unit of a form
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_required: Option<ConditionalRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldRules>,
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
            conditional_required: None,
            help_text: None,
            validation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conditional(mut self, rule: ConditionalRule) -> Self {
        self.conditional_required = Some(rule);
        self
    }

    pub fn with_rules(mut self, rules: FieldRules) -> Self {
        self.validation = Some(rules);
        self
    }

    pub fn with_help_text(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }
}

/// Ordered field list; order is display and tab order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FormSchema {
    fields: Vec<FieldDefinition>,
}

impl FormSchema {
    /// Build from typed definitions, enforcing the same invariants as
    /// [`parse_schema`]
    pub fn new(fields: Vec<FieldDefinition>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();
        for (i, field) in fields.iter().enumerate() {
            check_field(i + 1, field, &mut seen)?;
        }
        check_dependencies(&fields)?;
        Ok(Self { fields })
    }

    /// Parse a JSON document
    pub fn from_json_str(raw: &str) -> SchemaResult<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        parse_schema(&value)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Fields whose conditional requirement reads `key`
    pub fn dependents<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FieldDefinition> + 'a {
        self.fields.iter().filter(move |f| {
            f.conditional_required
                .as_ref()
                .is_some_and(|rule| rule.depends_on == key)
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Value> for FormSchema {
    type Error = SchemaError;

    fn try_from(value: Value) -> SchemaResult<Self> {
        parse_schema(&value)
    }
}

impl<'de> serde::Deserialize<'de> for FormSchema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
        parse_schema(&value).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse and validate a raw schema object `{ "fields": [...] }`
pub fn parse_schema(raw: &Value) -> SchemaResult<FormSchema> {
    let entries = raw
        .get("fields")
        .and_then(Value::as_array)
        .ok_or(SchemaError::MissingFields)?;

    let mut fields = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        let field = parse_field(i + 1, entry)?;
        check_field(i + 1, &field, &mut seen)?;
        fields.push(field);
    }
    check_dependencies(&fields)?;

    tracing::debug!(fields = fields.len(), "schema parsed");
    Ok(FormSchema { fields })
}

/// Look up `name` or its camelCase alias; JSON `null` counts as missing
fn lookup<'a>(obj: &'a Map<String, Value>, name: &str, alias: &str) -> Option<&'a Value> {
    obj.get(name)
        .or_else(|| obj.get(alias))
        .filter(|v| !v.is_null())
}

fn optional_string(
    obj: &Map<String, Value>,
    name: &'static str,
    alias: &str,
) -> Result<Option<String>, SchemaViolation> {
    match lookup(obj, name, alias) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaViolation::NotAString(name)),
    }
}

fn parse_field(index: usize, raw: &Value) -> SchemaResult<FieldDefinition> {
    let obj = raw
        .as_object()
        .ok_or_else(|| SchemaError::field(index, None, SchemaViolation::NotAnObject))?;

    let key = match obj.get("key") {
        Some(Value::String(k)) if !k.is_empty() => k.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            return Err(SchemaError::field(index, None, SchemaViolation::MissingKey))
        }
        Some(_) => return Err(SchemaError::field(index, None, SchemaViolation::NotAString("key"))),
    };
    let fail = |violation| SchemaError::field(index, Some(&key), violation);

    let label = match obj.get("label") {
        Some(Value::String(l)) => l.clone(),
        Some(Value::Null) | None => return Err(fail(SchemaViolation::MissingLabel)),
        Some(_) => return Err(fail(SchemaViolation::NotAString("label"))),
    };

    let field_type = match lookup(obj, "field_type", "fieldType") {
        None => return Err(fail(SchemaViolation::MissingFieldType)),
        Some(Value::String(t)) => FieldType::parse(t)
            .ok_or_else(|| fail(SchemaViolation::UnknownFieldType(t.clone())))?,
        Some(other) => return Err(fail(SchemaViolation::UnknownFieldType(other.to_string()))),
    };

    let required = match obj.get("required") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(fail(SchemaViolation::InvalidRequired)),
    };

    let options = match obj.get("options") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| fail(SchemaViolation::InvalidOptions))?,
        Some(_) => return Err(fail(SchemaViolation::InvalidOptions)),
    };

    let conditional_required = lookup(obj, "conditional_required", "conditionalRequired")
        .map(parse_conditional)
        .transpose()
        .map_err(fail)?;

    let help_text = optional_string(obj, "help_text", "helpText").map_err(fail)?;

    let validation = obj
        .get("validation")
        .filter(|v| !v.is_null())
        .map(parse_rules)
        .transpose()
        .map_err(fail)?;

    Ok(FieldDefinition {
        key,
        label,
        field_type,
        required,
        options,
        conditional_required,
        help_text,
        validation,
    })
}

fn parse_conditional(raw: &Value) -> Result<ConditionalRule, SchemaViolation> {
    let obj = raw
        .as_object()
        .ok_or_else(|| SchemaViolation::InvalidConditional("must be an object".into()))?;

    let depends_on = match lookup(obj, "depends_on", "dependsOn") {
        Some(Value::String(k)) if !k.is_empty() => k.clone(),
        _ => return Err(SchemaViolation::InvalidConditional("missing `depends_on`".into())),
    };

    let operator = match obj.get("operator") {
        Some(Value::String(op)) => Operator::from(op.as_str()),
        _ => return Err(SchemaViolation::InvalidConditional("missing `operator`".into())),
    };

    let value = match obj.get("value") {
        Some(Value::Number(n)) => Operand::Number(n.as_f64().ok_or(SchemaViolation::InvalidOperand)?),
        Some(Value::String(s)) => Operand::Text(s.clone()),
        _ => return Err(SchemaViolation::InvalidOperand),
    };

    let message = optional_string(obj, "message", "message")?;

    Ok(ConditionalRule {
        depends_on,
        operator,
        value,
        message,
    })
}

fn parse_rules(raw: &Value) -> Result<FieldRules, SchemaViolation> {
    let obj = raw
        .as_object()
        .ok_or_else(|| SchemaViolation::InvalidRules("must be an object".into()))?;

    let bound = |name: &str| -> Result<Option<f64>, SchemaViolation> {
        match obj.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| SchemaViolation::InvalidRules(format!("`{}` must be a number", name))),
        }
    };

    let min = bound("min")?;
    let max = bound("max")?;

    let pattern = match obj.get("pattern") {
        None | Some(Value::Null) => None,
        Some(Value::String(src)) => Some(
            Pattern::new(src.as_str()).map_err(|e| SchemaViolation::InvalidPattern(e.to_string()))?,
        ),
        Some(_) => return Err(SchemaViolation::NotAString("pattern")),
    };

    Ok(FieldRules { min, max, pattern })
}

/// Invariants of a single typed field (shared by parsing and [`FormSchema::new`])
fn check_field(index: usize, field: &FieldDefinition, seen: &mut HashSet<String>) -> SchemaResult<()> {
    let fail = |violation| SchemaError::field(index, Some(&field.key), violation);

    if field.key.is_empty() {
        return Err(SchemaError::field(index, None, SchemaViolation::MissingKey));
    }
    if field.field_type == FieldType::Dropdown && field.options.is_empty() {
        return Err(fail(SchemaViolation::MissingOptions));
    }
    if let Some(rules) = &field.validation {
        if let (Some(min), Some(max)) = (rules.min, rules.max) {
            if min > max {
                return Err(fail(SchemaViolation::InvalidRules(format!(
                    "min {} exceeds max {}",
                    min, max
                ))));
            }
        }
    }
    if !seen.insert(field.key.clone()) {
        return Err(fail(SchemaViolation::DuplicateKey(field.key.clone())));
    }
    Ok(())
}

fn check_dependencies(fields: &[FieldDefinition]) -> SchemaResult<()> {
    let keys: HashSet<&str> = fields.iter().map(|f| f.key.as_str()).collect();

    for (i, field) in fields.iter().enumerate() {
        let Some(rule) = &field.conditional_required else {
            continue;
        };
        let fail = |violation| SchemaError::field(i + 1, Some(&field.key), violation);
        if rule.depends_on == field.key {
            return Err(fail(SchemaViolation::SelfDependency));
        }
        if !keys.contains(rule.depends_on.as_str()) {
            return Err(fail(SchemaViolation::UnknownDependency(rule.depends_on.clone())));
        }
    }
    Ok(())
}
