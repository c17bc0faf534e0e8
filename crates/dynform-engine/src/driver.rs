//! Form driver: event loop around a [`FormSession`]
//!
//! Commands are applied strictly one at a time. A submission in flight is
//! polled alongside the command channel, so value changes keep being
//! validated while the transport call is pending. Teardown drops the
//! pending call; its result is never applied.

use crate::error::SubmitError;
use crate::session::{FormSession, SubmissionTicket};
use crate::submission::{SubmissionError, SubmissionReceipt, Submitter};
use crate::value::FieldValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

const COMMAND_BUFFER: usize = 64;

type SubmitReply = oneshot::Sender<Result<SubmissionReceipt, SubmitError>>;
type SubmitFuture = Pin<Box<dyn Future<Output = Result<SubmissionReceipt, SubmissionError>> + Send>>;

/// Input to the driver loop
#[derive(Debug)]
pub enum FormCommand {
    SetValue { key: String, value: Option<FieldValue> },
    Submit { reply: Option<SubmitReply> },
    Reset,
    Teardown,
}

/// Snapshot published after every command
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FormStatus {
    pub errors: BTreeMap<String, Vec<String>>,
    pub submitting: bool,
    pub banner: Option<String>,
    /// Accepted submissions so far
    pub submissions: u64,
    pub last_error: Option<String>,
}

struct InFlight {
    ticket: SubmissionTicket,
    reply: Option<SubmitReply>,
    future: SubmitFuture,
}

/// Owns the session; run it with [`FormDriver::run`]
pub struct FormDriver {
    session: FormSession,
    submitter: Arc<dyn Submitter>,
    commands: mpsc::Receiver<FormCommand>,
    status: watch::Sender<FormStatus>,
    submissions: u64,
    last_error: Option<String>,
}

impl FormDriver {
    pub fn new(session: FormSession, submitter: Arc<dyn Submitter>) -> (Self, FormHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(FormStatus::default());

        let driver = Self {
            session,
            submitter,
            commands: command_rx,
            status: status_tx,
            submissions: 0,
            last_error: None,
        };
        let handle = FormHandle {
            commands: command_tx,
            status: status_rx,
        };
        (driver, handle)
    }

    /// Run until teardown or until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!(form = %self.session.form(), "form driver started");
        let mut in_flight: Option<InFlight> = None;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(FormCommand::Teardown) | None => break,
                    Some(command) => self.apply(command, &mut in_flight),
                },
                outcome = wait_for_outcome(&mut in_flight), if in_flight.is_some() => {
                    if let Some(flight) = in_flight.take() {
                        self.finish(flight, outcome);
                    }
                }
            }
            self.publish();
        }

        if in_flight.is_some() {
            tracing::debug!(form = %self.session.form(), "pending submission dropped");
        }
        tracing::info!(form = %self.session.form(), "form driver stopped");
    }

    fn apply(&mut self, command: FormCommand, in_flight: &mut Option<InFlight>) {
        match command {
            FormCommand::SetValue { key, value } => {
                self.session.set_value(&key, value);
            }
            FormCommand::Submit { reply } => match self.session.begin_submission() {
                Ok((ticket, payload)) => {
                    let submitter = Arc::clone(&self.submitter);
                    *in_flight = Some(InFlight {
                        ticket,
                        reply,
                        future: Box::pin(async move { submitter.submit(payload).await }),
                    });
                }
                Err(err) => {
                    self.last_error = Some(err.to_string());
                    respond(reply, Err(err));
                }
            },
            FormCommand::Reset => {
                self.session.reset();
                if let Some(flight) = in_flight.take() {
                    respond(flight.reply, Err(SubmitError::Stale));
                }
            }
            // handled by the loop
            FormCommand::Teardown => {}
        }
    }

    fn finish(&mut self, flight: InFlight, outcome: Result<SubmissionReceipt, SubmissionError>) {
        let result = self.session.complete_submission(flight.ticket, outcome);
        match &result {
            Ok(_) => {
                self.submissions += 1;
                self.last_error = None;
            }
            Err(err) => self.last_error = Some(err.to_string()),
        }
        respond(flight.reply, result);
    }

    fn publish(&mut self) {
        for event in self.session.take_events() {
            tracing::debug!(form = %self.session.form(), event = event.event_type(), "form event");
        }
        self.status.send_replace(FormStatus {
            errors: self.session.errors().clone(),
            submitting: self.session.is_submitting(),
            banner: self.session.banner().map(str::to_string),
            submissions: self.submissions,
            last_error: self.last_error.clone(),
        });
    }
}

async fn wait_for_outcome(in_flight: &mut Option<InFlight>) -> Result<SubmissionReceipt, SubmissionError> {
    match in_flight {
        Some(flight) => flight.future.as_mut().await,
        None => std::future::pending().await,
    }
}

fn respond(reply: Option<SubmitReply>, result: Result<SubmissionReceipt, SubmitError>) {
    if let Some(reply) = reply {
        // Caller may have stopped waiting
        let _ = reply.send(result);
    }
}

/// Cloneable handle used by the rendering layer
#[derive(Clone)]
pub struct FormHandle {
    commands: mpsc::Sender<FormCommand>,
    status: watch::Receiver<FormStatus>,
}

impl FormHandle {
    async fn send(&self, command: FormCommand) -> Result<(), SubmitError> {
        self.commands.send(command).await.map_err(|_| SubmitError::Closed)
    }

    pub async fn set_value(&self, key: impl Into<String>, value: Option<FieldValue>) -> Result<(), SubmitError> {
        self.send(FormCommand::SetValue {
            key: key.into(),
            value,
        })
        .await
    }

    /// Request a submission and wait for its outcome
    pub async fn submit(&self) -> Result<SubmissionReceipt, SubmitError> {
        let (tx, rx) = oneshot::channel();
        self.send(FormCommand::Submit { reply: Some(tx) }).await?;
        rx.await.map_err(|_| SubmitError::Closed)?
    }

    pub async fn reset(&self) -> Result<(), SubmitError> {
        self.send(FormCommand::Reset).await
    }

    pub async fn teardown(&self) -> Result<(), SubmitError> {
        self.send(FormCommand::Teardown).await
    }

    /// Latest published status
    pub fn status(&self) -> FormStatus {
        self.status.borrow().clone()
    }

    /// Wait until the published status satisfies `predicate`
    pub async fn wait_for(&self, predicate: impl FnMut(&FormStatus) -> bool) -> Result<FormStatus, SubmitError> {
        let mut status = self.status.clone();
        let current = status.wait_for(predicate).await.map_err(|_| SubmitError::Closed)?;
        Ok((*current).clone())
    }
}
