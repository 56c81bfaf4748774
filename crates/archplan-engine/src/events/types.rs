use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ENGINE_EVENT_SCHEMA_0_0_1: &str = "archplan-engine-event/0.0.1";

/// Runs are replayable, so records carry a fixed timestamp; ordering lives in `seq`.
pub const EVENT_TS: &str = "1970-01-01T00:00:00Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineEventType {
    PlanValidated,
    PlanReplaced,
    PlanOrdered,
    StepStarted,
    StepCompleted,
    StepFailed,
    Skipped,
    ToolCalled,
    ReplySet,
    RunCancelled,
    RunCompleted,
}

impl EngineEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineEventType::PlanValidated => "plan_validated",
            EngineEventType::PlanReplaced => "plan_replaced",
            EngineEventType::PlanOrdered => "plan_ordered",
            EngineEventType::StepStarted => "step_started",
            EngineEventType::StepCompleted => "step_completed",
            EngineEventType::StepFailed => "step_failed",
            EngineEventType::Skipped => "skipped",
            EngineEventType::ToolCalled => "tool_called",
            EngineEventType::ReplySet => "reply_set",
            EngineEventType::RunCancelled => "run_cancelled",
            EngineEventType::RunCompleted => "run_completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineEvent {
    #[serde(rename = "type")]
    pub event_type: EngineEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<i64>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl EngineEvent {
    pub fn new(event_type: EngineEventType) -> Self {
        Self {
            event_type,
            step_id: None,
            data: Map::new(),
        }
    }

    pub fn for_step(event_type: EngineEventType, step_id: i64) -> Self {
        Self {
            step_id: Some(step_id),
            ..Self::new(event_type)
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineEventRecord {
    pub schema: String,
    pub run_id: String,
    pub seq: u64,
    pub ts: String,
    pub event: EngineEvent,
}

/// Stamps events of one run with consecutive sequence numbers.
#[derive(Debug, Clone)]
pub struct EngineEventStream {
    run_id: String,
    next_seq: u64,
}

impl EngineEventStream {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            next_seq: 0,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn record(&mut self, event: EngineEvent) -> EngineEventRecord {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        EngineEventRecord {
            schema: ENGINE_EVENT_SCHEMA_0_0_1.to_string(),
            run_id: self.run_id.clone(),
            seq,
            ts: EVENT_TS.to_string(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineEventSequenceError {
    #[error("sequence is empty")]
    Empty,
    #[error("sequence must start at 0, got {actual}")]
    InvalidStart { actual: u64 },
    #[error("sequence breaks at index {index}: expected seq {expected}, got {actual}")]
    NonMonotonic {
        index: usize,
        expected: u64,
        actual: u64,
    },
    #[error("record {index} belongs to run `{actual}`, expected `{expected}`")]
    MixedRuns {
        index: usize,
        expected: String,
        actual: String,
    },
}

pub fn ensure_monotonic_sequence(
    records: &[EngineEventRecord],
) -> Result<(), EngineEventSequenceError> {
    let Some(first) = records.first() else {
        return Err(EngineEventSequenceError::Empty);
    };
    if first.seq != 0 {
        return Err(EngineEventSequenceError::InvalidStart { actual: first.seq });
    }
    for (index, pair) in records.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.run_id != first.run_id {
            return Err(EngineEventSequenceError::MixedRuns {
                index: index + 1,
                expected: first.run_id.clone(),
                actual: current.run_id.clone(),
            });
        }
        if current.seq != previous.seq + 1 {
            return Err(EngineEventSequenceError::NonMonotonic {
                index: index + 1,
                expected: previous.seq + 1,
                actual: current.seq,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
