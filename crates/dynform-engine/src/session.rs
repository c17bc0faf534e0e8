//! Form session: the live validation state of one mounted form
//!
//! Holds values and the error map, applies value-changed events one at a
//! time, and gates submission (one in flight, only when valid). Submission
//! is split into [`FormSession::begin_submission`] and
//! [`FormSession::complete_submission`] so an event loop can keep applying
//! edits while the transport call is pending.

use crate::config::{EngineConfig, Revalidation};
use crate::definition::FormDefinition;
use crate::error::SubmitError;
use crate::events::FormEvent;
use crate::orchestrator::{FormValidator, ValidationReport};
use crate::schema::FormSchema;
use crate::submission::{SubmissionError, SubmissionPayload, SubmissionReceipt, Submitter};
use crate::value::{FieldValue, FormValues};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identifies one started submission; results for any other ticket are ignored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionTicket {
    id: u64,
    generation: u64,
}

/// Validation state of a single form instance
#[derive(Debug)]
pub struct FormSession {
    form: String,
    schema_version: u32,
    schema: Arc<FormSchema>,
    validator: FormValidator,
    revalidation: Revalidation,
    values: FormValues,
    errors: BTreeMap<String, Vec<String>>,
    banner: Option<String>,
    pending: Option<SubmissionTicket>,
    generation: u64,
    next_ticket: u64,
    events: Vec<FormEvent>,
}

impl FormSession {
    /// Mount `schema` under the form identifier `form`
    pub fn new(form: impl Into<String>, schema: Arc<FormSchema>) -> Self {
        Self::with_config(form, schema, &EngineConfig::default())
    }

    pub fn with_config(form: impl Into<String>, schema: Arc<FormSchema>, config: &EngineConfig) -> Self {
        Self {
            form: form.into(),
            schema_version: 1,
            schema,
            validator: FormValidator::new(config),
            revalidation: config.revalidation,
            values: FormValues::new(),
            errors: BTreeMap::new(),
            banner: None,
            pending: None,
            generation: 0,
            next_ticket: 0,
            events: Vec::new(),
        }
    }

    pub fn from_definition(definition: &FormDefinition, config: &EngineConfig) -> Self {
        let mut session =
            Self::with_config(definition.slug.clone(), Arc::new(definition.schema.clone()), config);
        session.schema_version = definition.schema_version;
        session
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Errors computed so far (fields not yet revalidated have no entry)
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn errors_for(&self, key: &str) -> &[String] {
        self.errors.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fresh full validation of the current values
    pub fn report(&self) -> ValidationReport {
        self.validator.validate_form(&self.schema, &self.values)
    }

    pub fn is_valid(&self) -> bool {
        self.report().is_valid
    }

    /// Form-level message from the last failed submission
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply a value-changed event. `None` clears the field. Returns false
    /// (and changes nothing) when `key` is not part of the schema.
    pub fn set_value(&mut self, key: &str, value: Option<FieldValue>) -> bool {
        if !self.schema.contains(key) {
            tracing::warn!(form = %self.form, key, "value for unknown field ignored");
            return false;
        }

        match value {
            Some(v) => {
                self.values.insert(key.to_string(), v);
            }
            None => {
                self.values.remove(key);
            }
        }

        let affected = self.affected_keys(key);
        for field_key in &affected {
            if let Some(field) = self.schema.field(field_key) {
                let errors = self.validator.validate_field(field, &self.values);
                self.errors.insert(field_key.clone(), errors);
            }
        }

        tracing::debug!(form = %self.form, key, revalidated = affected.len(), "value changed");
        self.events.push(FormEvent::ValueChanged {
            key: key.to_string(),
            revalidated: affected,
        });
        true
    }

    /// Keys to revalidate after `key` changed, in schema order
    fn affected_keys(&self, key: &str) -> Vec<String> {
        match self.revalidation {
            Revalidation::All => self.schema.fields().iter().map(|f| f.key.clone()).collect(),
            Revalidation::Dependents => self
                .schema
                .fields()
                .iter()
                .filter(|f| {
                    f.key == key
                        || f.conditional_required
                            .as_ref()
                            .is_some_and(|rule| rule.depends_on == key)
                })
                .map(|f| f.key.clone())
                .collect(),
        }
    }

    /// Validate everything and, if valid, mark a submission in flight.
    ///
    /// On an invalid form the session adopts the full error map so every
    /// violation is shown at once.
    pub fn begin_submission(&mut self) -> Result<(SubmissionTicket, SubmissionPayload), SubmitError> {
        if self.pending.is_some() {
            return Err(SubmitError::InFlight);
        }

        let report = self.report();
        self.errors = report.errors.clone();
        if !report.is_valid {
            tracing::debug!(form = %self.form, invalid = report.invalid_count(), "submission blocked");
            self.events.push(FormEvent::SubmissionRejected {
                invalid_fields: report.invalid_count(),
            });
            return Err(SubmitError::Invalid(report));
        }

        let ticket = SubmissionTicket {
            id: self.next_ticket,
            generation: self.generation,
        };
        self.next_ticket += 1;
        self.pending = Some(ticket);
        self.banner = None;

        let payload = SubmissionPayload::build(&self.form, self.schema_version, &self.schema, &self.values);
        tracing::info!(form = %self.form, files = payload.file_count(), "submission started");
        self.events.push(FormEvent::SubmissionStarted {
            form: self.form.clone(),
        });
        Ok((ticket, payload))
    }

    /// Apply the transport outcome. Success clears the state; failure keeps
    /// the values and sets the banner.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        if self.pending != Some(ticket) {
            tracing::debug!(form = %self.form, "stale submission result ignored");
            return Err(SubmitError::Stale);
        }
        self.pending = None;

        match outcome {
            Ok(receipt) => {
                tracing::info!(form = %self.form, submission = %receipt.submission_id, "submission accepted");
                self.clear();
                self.events.push(FormEvent::Submitted {
                    form: self.form.clone(),
                    submission_id: receipt.submission_id.clone(),
                });
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(form = %self.form, error = %err, "submission failed");
                let message = err.banner_message();
                self.banner = Some(message.clone());
                self.events.push(FormEvent::SubmissionFailed {
                    form: self.form.clone(),
                    message,
                });
                Err(SubmitError::Transport(err))
            }
        }
    }

    /// Validate, hand off and apply the outcome in one call
    pub async fn submit<S>(&mut self, submitter: &S) -> Result<SubmissionReceipt, SubmitError>
    where
        S: Submitter + ?Sized,
    {
        let (ticket, payload) = self.begin_submission()?;
        let outcome = submitter.submit(payload).await;
        self.complete_submission(ticket, outcome)
    }

    /// Drop all values and errors. A pending submission's result will be
    /// ignored when it arrives.
    pub fn reset(&mut self) {
        self.clear();
        self.pending = None;
        self.events.push(FormEvent::Reset);
    }

    fn clear(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.banner = None;
        self.generation += 1;
    }
}
