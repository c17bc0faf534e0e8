//! Dynamic Form Validation Engine
//!
//! Validates user input against form schemas that are data, not code.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         FormDriver                            │
//! │   commands ──► FormSession ──► status (watch)                 │
//! │                    │                                          │
//! │        ┌───────────▼───────────┐        ┌──────────────────┐  │
//! │        │     FormValidator     │        │    Submitter     │  │
//! │        │  (whole-form report)  │        │  (collaborator)  │  │
//! │        └───────────┬───────────┘        └──────────────────┘  │
//! │        ┌───────────▼───────────┐                              │
//! │        │    FieldValidator     │◄── conditional::evaluate     │
//! │        └───────────┬───────────┘                              │
//! │        ┌───────────▼───────────┐                              │
//! │        │      FormSchema       │◄── parse_schema (JSON)       │
//! │        └───────────────────────┘                              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//! - Six field kinds: text, number, date, dropdown, checkbox, file
//! - Conditional requirements driven by another field's value
//! - Upload size and type limits
//! - Single-flight submission with transport failure banners

pub mod conditional;
pub mod config;
pub mod definition;
pub mod driver;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod schema;
pub mod session;
pub mod submission;
pub mod validator;
pub mod value;

pub use conditional::evaluate;
pub use config::{EngineConfig, FileConstraints, Revalidation};
pub use definition::{slugify, FormDefinition};
pub use driver::{FormCommand, FormDriver, FormHandle, FormStatus};
pub use error::{SchemaError, SchemaResult, SchemaViolation, SubmitError};
pub use events::FormEvent;
pub use orchestrator::{validate_form, FormValidator, ValidationReport};
pub use schema::{
    parse_schema, ConditionalRule, FieldDefinition, FieldRules, FieldType, FormSchema, Operand, Operator,
    Pattern,
};
pub use session::{FormSession, SubmissionTicket};
pub use submission::{
    InMemorySubmitter, Part, SubmissionError, SubmissionPayload, SubmissionReceipt, Submitter,
};
pub use validator::{validate_field, FieldValidator, Requirement};
pub use value::{values_from_json, FieldValue, FileRef, FormValues};
