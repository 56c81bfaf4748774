use super::{
    ensure_monotonic_sequence, EngineEvent, EngineEventSequenceError, EngineEventStream,
    EngineEventType, ENGINE_EVENT_SCHEMA_0_0_1, EVENT_TS,
};
use crate::events::{encode_event_jsonl_line, parse_event_jsonl_line};
use serde_json::json;

#[test]
fn jsonl_line_carries_envelope_and_snake_case_type() {
    let mut stream = EngineEventStream::new("run-1");
    let record = stream.record(
        EngineEvent::for_step(EngineEventType::StepStarted, 3).with("action", "gen_all"),
    );
    let line = encode_event_jsonl_line(&record).expect("must encode");
    assert!(line.ends_with('\n'));
    assert!(line.contains(r#""type":"step_started""#));

    let decoded = parse_event_jsonl_line(&line).expect("must decode");
    assert_eq!(decoded.schema, ENGINE_EVENT_SCHEMA_0_0_1);
    assert_eq!(decoded.run_id, "run-1");
    assert_eq!(decoded.ts, EVENT_TS);
    assert_eq!(decoded.event.step_id, Some(3));
    assert_eq!(decoded.event.data.get("action"), Some(&json!("gen_all")));
}

#[test]
fn event_type_labels_match_serialized_form() {
    let value = serde_json::to_value(EngineEventType::RunCancelled).expect("encode");
    assert_eq!(value, json!(EngineEventType::RunCancelled.as_str()));
}

#[test]
fn stream_numbers_records_consecutively() {
    let mut stream = EngineEventStream::new("run-2");
    let records = vec![
        stream.record(EngineEvent::new(EngineEventType::PlanValidated)),
        stream.record(EngineEvent::new(EngineEventType::PlanOrdered)),
        stream.record(EngineEvent::new(EngineEventType::RunCompleted)),
    ];
    assert_eq!(
        records.iter().map(|record| record.seq).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(stream.next_seq(), 3);
    ensure_monotonic_sequence(&records).expect("must be monotonic");
}

#[test]
fn sequence_check_rejects_gaps_and_foreign_records() {
    let mut stream = EngineEventStream::new("run-3");
    let first = stream.record(EngineEvent::new(EngineEventType::PlanValidated));
    let _dropped = stream.record(EngineEvent::new(EngineEventType::PlanOrdered));
    let third = stream.record(EngineEvent::new(EngineEventType::RunCompleted));
    assert_eq!(
        ensure_monotonic_sequence(&[first.clone(), third]).expect_err("gap"),
        EngineEventSequenceError::NonMonotonic {
            index: 1,
            expected: 1,
            actual: 2,
        }
    );

    let mut other = EngineEventStream::new("run-4");
    let _ = other.record(EngineEvent::new(EngineEventType::PlanValidated));
    let foreign = other.record(EngineEvent::new(EngineEventType::PlanOrdered));
    assert!(matches!(
        ensure_monotonic_sequence(&[first, foreign]).expect_err("mixed"),
        EngineEventSequenceError::MixedRuns { index: 1, .. }
    ));
    assert_eq!(
        ensure_monotonic_sequence(&[]).expect_err("empty"),
        EngineEventSequenceError::Empty
    );
}
