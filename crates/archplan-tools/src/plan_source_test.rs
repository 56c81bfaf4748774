use super::FilePlanSource;
use archplan_engine::{request_plan, CollaboratorError, PlanRequest, PlanSource};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_plan_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "archplan-plan-{}-{nanos}.json",
        std::process::id()
    ))
}

#[test]
fn proposal_is_the_file_content() {
    let path = temp_plan_path();
    std::fs::write(&path, r#"[{"id": 1, "action": "ingest_docs"}]"#).expect("write plan");

    let raw = request_plan(&FilePlanSource::new(&path), &PlanRequest::default());
    assert_eq!(raw.steps.len(), 1);
    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_file_is_unavailable() {
    let source = FilePlanSource::new("/nonexistent/archplan/plan.json");
    assert!(matches!(
        source.propose(&PlanRequest::default()),
        Err(CollaboratorError::Unavailable(_))
    ));
}
