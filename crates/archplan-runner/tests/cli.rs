use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_plan(prefix: &str, content: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time must be monotonic")
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "archplan-cli-{prefix}-{}-{nanos}.json",
        std::process::id()
    ));
    std::fs::write(&path, content).expect("must write plan");
    path
}

#[test]
fn plan_order_prints_linear_order() {
    let plan = write_plan(
        "order",
        r#"[{"id": 2, "action": "gen_all"}, {"id": 1, "action": "build_specs"}]"#,
    );

    Command::cargo_bin("archplan")
        .expect("binary")
        .args(["plan", "order", "--plan"])
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("order: 1,2"));
}

#[test]
fn run_prints_reply_from_plan() {
    let plan = write_plan(
        "reply",
        r#"{"steps": [{"id": 1, "action": "reply", "args": {"text": "all done"}}]}"#,
    );

    Command::cargo_bin("archplan")
        .expect("binary")
        .args(["run", "--plan"])
        .arg(&plan)
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("reply:\nall done"))
        .stderr(predicate::str::contains("type=run_completed"));
}

#[test]
fn missing_plan_file_exits_with_error() {
    Command::cargo_bin("archplan")
        .expect("binary")
        .args(["plan", "validate", "--plan", "/nonexistent/archplan/plan.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("read file failed"));
}
