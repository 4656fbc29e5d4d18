//! Lifecycle of one invocation
//!
//! `Start -> Transitioning -> {Success, Error}`. The Transitioning record is
//! written before the handler runs and exactly one terminal record follows it.
//! Nothing in here terminates the process: the outcome is returned and the
//! binary turns it into an exit code.

use std::process::ExitCode;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::cli::commands::CommandHandler;
use crate::cli::Verb;
use crate::environment::InvocationContext;
use crate::status::{report, StatusCode, StatusRecord, StatusReporter};
use crate::telemetry::LogContext;

/// Lifecycle states of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Command and context are being resolved; nothing reported yet
    Start,
    /// Handler is running
    Transitioning,
    Success,
    Error,
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid lifecycle transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Success | LifecycleState::Error)
    }

    pub fn transition(self, to: LifecycleState) -> Result<LifecycleState, TransitionError> {
        match (self, to) {
            (LifecycleState::Start, LifecycleState::Transitioning)
            | (LifecycleState::Transitioning, LifecycleState::Success)
            | (LifecycleState::Transitioning, LifecycleState::Error) => Ok(to),
            (from, to) => Err(TransitionError { from, to }),
        }
    }

    /// Status code reported on entering this state
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            LifecycleState::Start => None,
            LifecycleState::Transitioning => Some(StatusCode::Transitioning),
            LifecycleState::Success => Some(StatusCode::Success),
            LifecycleState::Error => Some(StatusCode::Error),
        }
    }
}

/// Result of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Succeeded,
    Failed { message: String },
}

impl RunOutcome {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunOutcome::Succeeded => ExitCode::SUCCESS,
            RunOutcome::Failed { .. } => ExitCode::FAILURE,
        }
    }
}

/// Drives a handler through the lifecycle and reports every state change
pub struct LifecycleRunner<'a> {
    reporter: &'a dyn StatusReporter,
}

impl<'a> LifecycleRunner<'a> {
    pub fn new(reporter: &'a dyn StatusReporter) -> Self {
        Self { reporter }
    }

    pub fn run(
        &self,
        verb: Verb,
        handler: &dyn CommandHandler,
        ctx: &InvocationContext,
        log: &LogContext,
    ) -> RunOutcome {
        let mut state = LifecycleState::Start;

        info!(parent: &log.span(), event = "start", "Handling command");
        self.enter(&mut state, LifecycleState::Transitioning, verb, "", ctx, log);

        match handler.execute(ctx, log) {
            Ok(()) => {
                self.enter(&mut state, LifecycleState::Success, verb, "", ctx, log);
                info!(parent: &log.span(), event = "end", "Command completed");
                RunOutcome::Succeeded
            }
            Err(e) => {
                let message = e.to_string();
                error!(parent: &log.span(), event = "failed to handle", error = %message, "Command failed");
                self.enter(&mut state, LifecycleState::Error, verb, &message, ctx, log);
                RunOutcome::Failed { message }
            }
        }
    }

    fn enter(
        &self,
        state: &mut LifecycleState,
        next: LifecycleState,
        verb: Verb,
        message: &str,
        ctx: &InvocationContext,
        log: &LogContext,
    ) {
        match state.transition(next) {
            Ok(new_state) => {
                *state = new_state;
                if let Some(code) = new_state.status_code() {
                    let record = StatusRecord::new(code, verb.label(), message);
                    report(self.reporter, ctx.seq, &record, log);
                }
                if new_state.is_terminal() {
                    debug!(parent: &log.span(), state = ?new_state, "Reached terminal state");
                }
            }
            // Never report a state the orchestrator could read as going backwards.
            Err(e) => error!(parent: &log.span(), error = %e, "Dropped status report"),
        }
    }
}
