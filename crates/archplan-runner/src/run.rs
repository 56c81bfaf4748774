use crate::cli::{OutputFormat, PlanFileArgs, RunArgs};
use crate::config::load_runner_config_or_default;
use archplan_core::StructuredIssue;
use archplan_engine::{
    encode_event_jsonl_line, order_steps, request_plan, run_plan, CancelFlag, EngineEventRecord,
    PipelineRun, PlanExecutor, PlanRequest, RetryingPlanSource, RunInputs, RunStatus,
    ScheduleOutcome,
};
use archplan_plan::{parse_raw_plan, validate, FallbackReason, Plan, ValidationOutcome};
use archplan_tools::{builtin_collaborators, FilePlanSource};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("read file failed `{path}`: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("runner config load failed: {0}")]
    ConfigLoad(String),
    #[error("tool setup failed: {0}")]
    ToolSetup(String),
    #[error("write events JSONL failed: {0}")]
    EventsIo(String),
    #[error("json encode failed: {0}")]
    JsonEncode(#[from] serde_json::Error),
}

pub fn execute_plan_validate(args: &PlanFileArgs) -> Result<String, RunnerError> {
    let validation = read_and_validate(args)?;
    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "schema": "archplan-runner-plan-validate/0.0.1",
            "outcome": outcome_label(&validation),
            "reason": validation.fallback_reason(),
            "notes": validation.notes(),
            "plan": validation.plan(),
        }))?,
        OutputFormat::Text => {
            let mut lines = vec![
                "archplan plan validate".to_string(),
                format!("outcome: {}", outcome_label(&validation)),
                format!("reason: {}", reason_text(validation.fallback_reason())),
                format!("notes: {}", validation.notes().len()),
            ];
            lines.extend(validation.notes().iter().map(note_line));
            lines.push("steps:".to_string());
            lines.extend(plan_lines(validation.plan()));
            lines.join("\n")
        }
    };
    Ok(output)
}

pub fn execute_plan_order(args: &PlanFileArgs) -> Result<String, RunnerError> {
    let validation = read_and_validate(args)?;
    let schedule = order_steps(validation.plan());
    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "schema": "archplan-runner-plan-order/0.0.1",
            "outcome": outcome_label(&validation),
            "order": schedule.ids(),
            "fell_back": schedule.fell_back,
            "steps": schedule.steps,
        }))?,
        OutputFormat::Text => format!(
            "archplan plan order\noutcome: {}\norder: {}",
            outcome_label(&validation),
            join_ids(&schedule)
        ),
    };
    Ok(output)
}

/// Requests a plan from the plan file, then validates, orders and executes it with the
/// built-in collaborators.
pub fn execute_run(args: &RunArgs) -> Result<String, RunnerError> {
    let config = load_runner_config_or_default(args.config.as_deref())
        .map_err(|error| RunnerError::ConfigLoad(error.to_string()))?;
    let source = RetryingPlanSource::new(
        FilePlanSource::new(&args.plan),
        config.executor.plan_retry_count,
    );
    let request = PlanRequest {
        prompt: args.prompt.clone(),
        documents: args.docs.clone(),
        ..PlanRequest::default()
    };
    let raw = request_plan(&source, &request);

    let collaborators =
        builtin_collaborators().map_err(|error| RunnerError::ToolSetup(error.to_string()))?;
    let executor = PlanExecutor::new(config.executor, collaborators);
    let inputs = RunInputs::new(args.docs.clone(), args.prompt.clone());
    let run = run_plan(&raw, &inputs, &executor, &CancelFlag::new());

    write_event_sinks(args, &run.report.events)?;
    render_run_output(args, run)
}

fn read_and_validate(args: &PlanFileArgs) -> Result<ValidationOutcome, RunnerError> {
    let text = fs::read_to_string(&args.plan).map_err(|source| RunnerError::ReadFile {
        path: args.plan.display().to_string(),
        source,
    })?;
    Ok(validate(&parse_raw_plan(text.as_str())))
}

fn render_run_output(args: &RunArgs, run: PipelineRun) -> Result<String, RunnerError> {
    if args.events_jsonl.as_deref() == Some("-") {
        let mut out = String::new();
        for event in &run.report.events {
            out.push_str(
                encode_event_jsonl_line(event)
                    .map_err(|error| RunnerError::EventsIo(error.to_string()))?
                    .as_str(),
            );
        }
        return Ok(out);
    }

    let run_id = run.run_id().unwrap_or("-").to_string();
    let outcome = outcome_label(&run.validation);
    let status = status_label(run.report.status);
    let order = join_ids(&run.schedule);
    let output = run.report.state.into_output();
    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "schema": "archplan-runner-run/0.0.1",
            "run_id": run_id,
            "status": status,
            "outcome": outcome,
            "order": run.schedule.ids(),
            "output": output,
        }))?,
        OutputFormat::Text => {
            let mut lines = vec![
                "archplan run".to_string(),
                format!("run_id: {run_id}"),
                format!("status: {status}"),
                format!("outcome: {outcome}"),
                format!("order: {order}"),
                format!("images: {}", output.images.len()),
                format!("texts: {}", output.texts.len()),
                "log:".to_string(),
            ];
            lines.extend(output.log.iter().map(|line| format!("  {line}")));
            lines.push("reply:".to_string());
            lines.push(output.reply);
            lines.join("\n")
        }
    };
    Ok(rendered)
}

fn write_event_sinks(args: &RunArgs, events: &[EngineEventRecord]) -> Result<(), RunnerError> {
    if args.verbose {
        write_verbose_events(events);
    }

    let Some(target) = &args.events_jsonl else {
        return Ok(());
    };
    if target == "-" {
        return Ok(());
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(target)
        .map_err(|error| RunnerError::EventsIo(error.to_string()))?;
    for event in events {
        let line = encode_event_jsonl_line(event)
            .map_err(|error| RunnerError::EventsIo(error.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|error| RunnerError::EventsIo(error.to_string()))?;
    }
    Ok(())
}

fn write_verbose_events(events: &[EngineEventRecord]) {
    for record in events {
        let step = record
            .event
            .step_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let detail = record
            .event
            .data
            .get("error")
            .or_else(|| record.event.data.get("reason"))
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "-".to_string());
        eprintln!(
            "[event seq={} type={} step={} detail={}]",
            record.seq,
            record.event.event_type.as_str(),
            step,
            detail
        );
    }
}

fn outcome_label(validation: &ValidationOutcome) -> &'static str {
    if validation.is_replaced() {
        "replaced"
    } else {
        "repaired"
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Completed => "completed",
        RunStatus::Cancelled => "cancelled",
    }
}

fn reason_text(reason: Option<&FallbackReason>) -> String {
    match reason {
        None => "none".to_string(),
        Some(FallbackReason::EmptyPlan) => "empty_plan".to_string(),
        Some(FallbackReason::Cycle { step_ids }) => format!(
            "cycle({})",
            step_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        ),
    }
}

fn note_line(note: &StructuredIssue) -> String {
    let severity = serde_json::to_value(note.severity)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", note.severity).to_lowercase());
    let step = note
        .step_id
        .map(|id| format!(" step={id}"))
        .unwrap_or_default();
    format!(
        "  [{severity}] {}{step}: {}",
        note.reference.as_deref().unwrap_or(note.kind.as_str()),
        note.message
    )
}

fn plan_lines(plan: &Plan) -> Vec<String> {
    plan.steps
        .iter()
        .map(|step| {
            let deps = step
                .depends_on
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("  {} {} depends_on=[{deps}]", step.id, step.action())
        })
        .collect()
}

fn join_ids(schedule: &ScheduleOutcome) -> String {
    schedule
        .ids()
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
