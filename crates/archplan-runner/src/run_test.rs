use super::{execute_plan_order, execute_plan_validate, execute_run, RunnerError};
use crate::cli::{OutputFormat, PlanFileArgs, RunArgs};
use archplan_engine::{ensure_monotonic_sequence, parse_event_jsonl_line, EngineEventType};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn run_args(plan: PathBuf) -> RunArgs {
    RunArgs {
        plan,
        docs: Vec::new(),
        prompt: String::new(),
        config: None,
        events_jsonl: None,
        verbose: false,
        format: OutputFormat::Text,
    }
}

#[test]
fn plan_validate_text_lists_repairs_and_steps() {
    let plan = write_temp_file(
        "validate-text",
        "json",
        r#"{"steps":[
  {"id": 3, "action": "gen_all"},
  {"id": 2, "action": "build_specs"},
  {"id": 1, "action": "ingest_docs"},
  {"id": 4, "action": "teleport"}
]}"#,
    );

    let output = execute_plan_validate(&PlanFileArgs {
        plan,
        format: OutputFormat::Text,
    })
    .expect("validate must succeed");

    assert!(output.starts_with("archplan plan validate\noutcome: repaired\nreason: none"));
    assert!(output.contains("plan.step.unknown_action"));
    assert!(output.contains("plan.edge.injected step=3"));
    assert!(output.contains("  3 gen_all depends_on=[2]"));
    assert!(output.contains("  2 build_specs depends_on=[1]"));
}

#[test]
fn plan_validate_json_reports_cycle_fallback() {
    let plan = write_temp_file(
        "validate-cycle",
        "yaml",
        "steps:\n  - {id: 1, action: reply, depends_on: [2]}\n  - {id: 2, action: reply, depends_on: [1]}\n",
    );

    let output = execute_plan_validate(&PlanFileArgs {
        plan,
        format: OutputFormat::Json,
    })
    .expect("validate must succeed");
    let parsed: Value = serde_json::from_str(output.as_str()).expect("must be valid json");

    assert_eq!(parsed["outcome"], "replaced");
    assert_eq!(parsed["reason"]["kind"], "cycle");
    assert_eq!(parsed["plan"]["steps"].as_array().map(Vec::len), Some(4));
    assert_eq!(parsed["plan"]["steps"][3]["args"]["text"], "Generated outputs.");
}

#[test]
fn plan_order_text_linearizes_out_of_order_steps() {
    let plan = write_temp_file(
        "order-text",
        "json",
        r#"[{"id": 2, "action": "reply", "depends_on": [1]}, {"id": 1, "action": "ingest_docs"}]"#,
    );

    let output = execute_plan_order(&PlanFileArgs {
        plan,
        format: OutputFormat::Text,
    })
    .expect("order must succeed");

    assert_eq!(output, "archplan plan order\noutcome: repaired\norder: 1,2");
}

#[test]
fn plan_commands_fail_on_missing_file() {
    let error = execute_plan_validate(&PlanFileArgs {
        plan: PathBuf::from("/nonexistent/archplan/plan.json"),
        format: OutputFormat::Text,
    })
    .expect_err("must fail");
    assert!(matches!(error, RunnerError::ReadFile { .. }));
}

#[test]
fn run_executes_fallback_plan_when_plan_file_is_missing() {
    let doc = write_temp_file("run-doc", "md", "Orders API on lambda with dynamodb");
    let mut args = run_args(PathBuf::from("/nonexistent/archplan/plan.json"));
    args.docs = vec![doc];
    args.prompt = "serverless on aws".to_string();
    args.format = OutputFormat::Json;

    let output = execute_run(&args).expect("run must succeed");
    let parsed: Value = serde_json::from_str(output.as_str()).expect("must be valid json");

    assert_eq!(parsed["status"], "completed");
    assert_eq!(parsed["outcome"], "replaced");
    assert_eq!(parsed["order"], serde_json::json!([1, 2, 3, 4]));
    assert_eq!(parsed["output"]["reply"], "Generated outputs.");
    let texts = parsed["output"]["texts"].as_array().expect("texts");
    assert_eq!(texts.len(), 4);
    assert_eq!(
        texts[3],
        "%% topology\nflowchart LR\nLAMBDA --> DYNAMODB"
    );
}

#[test]
fn run_prints_events_as_jsonl_on_dash() {
    let plan = write_temp_file(
        "run-events",
        "json",
        r#"{"steps":[{"id": 1, "action": "reply", "args": {"text": "hello"}}]}"#,
    );
    let mut args = run_args(plan);
    args.events_jsonl = Some("-".to_string());

    let output = execute_run(&args).expect("run must succeed");
    let records = output
        .lines()
        .map(|line| parse_event_jsonl_line(line).expect("event line"))
        .collect::<Vec<_>>();

    assert!(ensure_monotonic_sequence(&records).is_ok());
    let types = records
        .iter()
        .map(|record| record.event.event_type)
        .collect::<Vec<_>>();
    assert_eq!(
        types,
        vec![
            EngineEventType::PlanValidated,
            EngineEventType::PlanOrdered,
            EngineEventType::StepStarted,
            EngineEventType::ReplySet,
            EngineEventType::StepCompleted,
            EngineEventType::RunCompleted,
        ]
    );
}

#[test]
fn run_appends_events_to_jsonl_file_and_renders_text() {
    let plan = write_temp_file(
        "run-sink",
        "yaml",
        "- id: 1\n  action: mcp_tool\n  args: {tool: draw}\n- id: 2\n  action: reply\n  depends_on: [1]\n",
    );
    let sink = std::env::temp_dir().join(format!(
        "archplan-runner-sink-{}-{}.jsonl",
        std::process::id(),
        nanos()
    ));
    let mut args = run_args(plan);
    args.events_jsonl = Some(sink.display().to_string());

    let output = execute_run(&args).expect("run must succeed");

    assert!(output.contains("status: completed"));
    assert!(output.contains("  step 1:mcp_tool\n  mcp_tool skipped: server_command or tool missing"));
    assert!(output.ends_with("reply:\nGenerated files:\n"));
    let written = fs::read_to_string(&sink).expect("sink written");
    assert!(written
        .lines()
        .any(|line| line.contains("\"type\":\"skipped\"")));
}

#[test]
fn run_reports_invalid_config() {
    let plan = write_temp_file("run-config-plan", "json", "[]");
    let config = write_temp_file(
        "run-config",
        "yaml",
        "schema: archplan-runner/0.0.1\nexecutor:\n  tool_timeout_ms: 0\n",
    );
    let mut args = run_args(plan);
    args.config = Some(config);

    let error = execute_run(&args).expect_err("must fail");
    assert!(matches!(error, RunnerError::ConfigLoad(_)));
}

fn nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time must be monotonic")
        .as_nanos()
}

fn write_temp_file(prefix: &str, extension: &str, content: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "archplan-runner-{prefix}-{}-{}.{extension}",
        std::process::id(),
        nanos()
    ));
    fs::write(&path, content).expect("must write temp file");
    path
}
