mod handlers;

pub use handlers::{detect_providers, ActionHandler, HandlerTable};

use crate::collaborators::{CollaboratorError, Collaborators};
use crate::config::ExecutorConfig;
use crate::events::{EngineEvent, EngineEventRecord, EngineEventStream, EngineEventType};
use crate::state::{synthesize_reply, RunInputs, RunState};
use archplan_plan::{ActionKind, Step};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const LOCAL_RUN_ID: &str = "run-local";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Lets a caller abandon a run. Checked between steps only; a dispatched step always runs
/// to completion or to its own timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a handler finished. Failures a handler anticipates (a tool erroring out, a
/// generator giving up) are reported here rather than as [`StepError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped { reason: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("step {step_id} reached the {handler} handler with {actual} arguments")]
    ArgsMismatch {
        step_id: i64,
        handler: ActionKind,
        actual: ActionKind,
    },
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Everything a handler may touch while running one step.
pub struct StepContext<'a> {
    pub config: &'a ExecutorConfig,
    pub collaborators: &'a Collaborators,
    pub inputs: &'a RunInputs,
    pub state: &'a mut RunState,
    pub(crate) emitted: Vec<EngineEvent>,
}

impl StepContext<'_> {
    pub fn log(&mut self, line: impl Into<String>) {
        self.state.log.push(line.into());
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.emitted.push(event);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub status: RunStatus,
    pub state: RunState,
    pub events: Vec<EngineEventRecord>,
}

/// Runs ordered steps one after another against a fresh [`RunState`].
pub struct PlanExecutor {
    config: ExecutorConfig,
    collaborators: Collaborators,
    handlers: HandlerTable,
}

impl PlanExecutor {
    pub fn new(config: ExecutorConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            handlers: HandlerTable::builtin(),
        }
    }

    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn execute(&self, steps: &[Step], inputs: &RunInputs) -> ExecutionReport {
        self.execute_with(
            steps,
            inputs,
            &CancelFlag::new(),
            &mut EngineEventStream::new(LOCAL_RUN_ID),
        )
    }

    pub fn execute_with_cancel(
        &self,
        steps: &[Step],
        inputs: &RunInputs,
        cancel: &CancelFlag,
    ) -> ExecutionReport {
        self.execute_with(
            steps,
            inputs,
            cancel,
            &mut EngineEventStream::new(LOCAL_RUN_ID),
        )
    }

    /// Executes `steps` strictly in the given order. A failing or panicking step is
    /// recorded and the run moves on; the returned state always carries a reply.
    pub fn execute_with(
        &self,
        steps: &[Step],
        inputs: &RunInputs,
        cancel: &CancelFlag,
        stream: &mut EngineEventStream,
    ) -> ExecutionReport {
        let mut state = RunState::default();
        let mut events = Vec::<EngineEventRecord>::new();
        let mut status = RunStatus::Completed;

        for step in steps {
            if cancel.is_cancelled() {
                state
                    .log
                    .push(format!("run cancelled before step {}", step.id));
                events.push(stream.record(EngineEvent::for_step(
                    EngineEventType::RunCancelled,
                    step.id,
                )));
                status = RunStatus::Cancelled;
                break;
            }

            let action = step.action();
            state.log.push(format!("step {}:{action}", step.id));
            events.push(stream.record(
                EngineEvent::for_step(EngineEventType::StepStarted, step.id)
                    .with("action", action.as_str()),
            ));

            let (result, emitted) = self.dispatch(step, inputs, &mut state);
            events.extend(emitted.into_iter().map(|event| stream.record(event)));

            let finished = match result {
                Ok(StepOutcome::Completed) => {
                    EngineEvent::for_step(EngineEventType::StepCompleted, step.id)
                }
                Ok(StepOutcome::Skipped { reason }) => {
                    EngineEvent::for_step(EngineEventType::Skipped, step.id).with("reason", reason)
                }
                Ok(StepOutcome::Failed { message }) => {
                    EngineEvent::for_step(EngineEventType::StepFailed, step.id)
                        .with("error", message)
                }
                Err(error) => {
                    state.log.push(format!("step {} error: {error}", step.id));
                    EngineEvent::for_step(EngineEventType::StepFailed, step.id)
                        .with("error", error.to_string())
                }
            };
            events.push(stream.record(finished.with("action", action.as_str())));
        }

        if !state.has_reply() {
            state.reply = Some(synthesize_reply(&state.images, &state.texts));
            events.push(stream.record(
                EngineEvent::new(EngineEventType::ReplySet).with("synthesized", true),
            ));
        }
        if status == RunStatus::Completed {
            events.push(stream.record(
                EngineEvent::new(EngineEventType::RunCompleted)
                    .with("images", state.images.len())
                    .with("texts", state.texts.len()),
            ));
        }

        ExecutionReport {
            status,
            state,
            events,
        }
    }

    fn dispatch(
        &self,
        step: &Step,
        inputs: &RunInputs,
        state: &mut RunState,
    ) -> (Result<StepOutcome, StepError>, Vec<EngineEvent>) {
        let handler = self.handlers.handler_for(step.action());
        let mut context = StepContext {
            config: &self.config,
            collaborators: &self.collaborators,
            inputs,
            state,
            emitted: Vec::new(),
        };
        let result = catch_unwind(AssertUnwindSafe(|| handler.handle(step, &mut context)))
            .unwrap_or_else(|payload| Err(StepError::Panicked(panic_message(payload.as_ref()))));
        (result, context.emitted)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
