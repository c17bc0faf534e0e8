//! Replay a sequence of value changes through a live session

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use dynform_engine::{EngineConfig, FieldValue, FormDefinition, FormEvent, FormSession};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tabled::Tabled;

/// One value-changed event; `null` clears the field
#[derive(Debug, Deserialize)]
pub struct Change {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct ReplayStep {
    pub step: usize,
    pub key: String,
    pub accepted: bool,
    pub revalidated: Vec<String>,
    /// Live error map after this change
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Tabled)]
pub struct StepRow {
    pub step: usize,
    pub key: String,
    pub revalidated: String,
    pub errors: String,
}

impl From<&ReplayStep> for StepRow {
    fn from(step: &ReplayStep) -> Self {
        let errors = step
            .errors
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(key, messages)| format!("{}: {}", key, messages.join("; ")))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            step: step.step,
            key: step.key.clone(),
            revalidated: if step.accepted {
                step.revalidated.join(", ")
            } else {
                "(unknown field)".to_string()
            },
            errors,
        }
    }
}

pub fn replay(form: &FormDefinition, changes: Vec<Change>, config: &EngineConfig) -> Vec<ReplayStep> {
    let mut session = FormSession::from_definition(form, config);
    changes
        .into_iter()
        .enumerate()
        .map(|(i, change)| {
            let accepted = session.set_value(&change.key, FieldValue::from_json(&change.value));
            let revalidated = session
                .take_events()
                .into_iter()
                .find_map(|event| match event {
                    FormEvent::ValueChanged { revalidated, .. } => Some(revalidated),
                    _ => None,
                })
                .unwrap_or_default();
            ReplayStep {
                step: i + 1,
                key: change.key,
                accepted,
                revalidated,
                errors: session.errors().clone(),
            }
        })
        .collect()
}

pub fn handle(schema_path: &Path, changes_path: &Path, config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let form = super::load_form(schema_path)?;
    let raw = fs::read_to_string(changes_path)
        .with_context(|| format!("reading {}", changes_path.display()))?;
    let changes: Vec<Change> = serde_json::from_str(&raw)
        .with_context(|| format!("{}: expected an array of {{key, value}}", changes_path.display()))?;

    let steps = replay(&form, changes, config);
    format.print(&steps, |s| s.iter().map(StepRow::from).collect())
}
