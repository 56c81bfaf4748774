use crate::events::{EngineEvent, EngineEventStream, EngineEventType};
use crate::executor::{CancelFlag, ExecutionReport, PlanExecutor};
use crate::scheduler::{order_steps, ScheduleOutcome};
use crate::state::RunInputs;
use archplan_core::run_id_for;
use archplan_plan::{validate, RawPlan, ValidationOutcome};
use serde_json::json;

/// The three stages of one chat turn, kept side by side for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub validation: ValidationOutcome,
    pub schedule: ScheduleOutcome,
    pub report: ExecutionReport,
}

impl PipelineRun {
    pub fn run_id(&self) -> Option<&str> {
        self.report
            .events
            .first()
            .map(|record| record.run_id.as_str())
    }
}

/// Validates, orders and executes one candidate plan. Every event of the run, including
/// the planning ones, shares a run id derived from the validated plan.
pub fn run_plan(
    raw: &RawPlan,
    inputs: &RunInputs,
    executor: &PlanExecutor,
    cancel: &CancelFlag,
) -> PipelineRun {
    let validation = validate(raw);
    let plan = validation.plan();
    let run_id = run_id_for(&plan.to_value()).unwrap_or_else(|_| "run-local".to_string());
    let mut stream = EngineEventStream::new(run_id);

    let mut planning = Vec::new();
    let validated = match validation.fallback_reason() {
        Some(reason) => EngineEvent::new(EngineEventType::PlanReplaced)
            .with("reason", serde_json::to_value(reason).unwrap_or_default()),
        None => EngineEvent::new(EngineEventType::PlanValidated),
    };
    planning.push(stream.record(validated.with("notes", validation.notes().len())));

    let schedule = order_steps(plan);
    planning.push(stream.record(
        EngineEvent::new(EngineEventType::PlanOrdered)
            .with("order", json!(schedule.ids()))
            .with("fell_back", schedule.fell_back),
    ));

    let mut report = executor.execute_with(&schedule.steps, inputs, cancel, &mut stream);
    planning.append(&mut report.events);
    report.events = planning;

    PipelineRun {
        validation,
        schedule,
        report,
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
