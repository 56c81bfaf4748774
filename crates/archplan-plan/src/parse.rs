use crate::model::Plan;
use archplan_core::{IssueSeverity, StructuredIssue};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// An untrusted candidate plan: whatever step entries could be pulled out of the source,
/// plus the issues met while pulling them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPlan {
    pub steps: Vec<Value>,
    pub issues: Vec<StructuredIssue>,
}

impl RawPlan {
    pub fn from_steps(steps: Vec<Value>) -> Self {
        Self {
            steps,
            issues: Vec::new(),
        }
    }

    /// Accepts `{"steps": [...]}` or a bare array of steps.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::from_steps(items.clone()),
            Value::Object(object) => match object.get("steps") {
                Some(Value::Array(items)) => Self::from_steps(items.clone()),
                Some(Value::Null) | None => Self::with_issue(source_issue(
                    "$.steps",
                    "plan document has no `steps` list",
                    "plan.source.steps_missing",
                )),
                Some(_) => Self::with_issue(source_issue(
                    "$.steps",
                    "`steps` must be a list",
                    "plan.source.steps_not_list",
                )),
            },
            _ => Self::with_issue(source_issue(
                "$",
                "plan document must be an object or a list",
                "plan.source.not_document",
            )),
        }
    }

    pub fn from_plan(plan: &Plan) -> Self {
        Self::from_steps(plan.steps.iter().map(|step| step.to_value()).collect())
    }

    fn with_issue(issue: StructuredIssue) -> Self {
        Self {
            steps: Vec::new(),
            issues: vec![issue],
        }
    }
}

/// Pulls a candidate plan out of planner output. Never fails: text that cannot be read as
/// a plan yields an empty candidate carrying the reason.
pub fn parse_raw_plan(input: &str) -> RawPlan {
    let body = fenced_block(input).unwrap_or(input).trim();
    if body.is_empty() {
        return RawPlan::with_issue(source_issue(
            "$",
            "planner returned no content",
            "plan.source.empty",
        ));
    }

    let parsed = if looks_like_json(body) {
        serde_json::from_str::<Value>(body).map_err(|error| format!("json parse failed: {error}"))
    } else {
        serde_yaml::from_str::<serde_yaml::Value>(body)
            .map_err(|error| format!("yaml parse failed: {error}"))
            .and_then(|value| {
                serde_json::to_value(value)
                    .map_err(|error| format!("yaml-to-json conversion failed: {error}"))
            })
    };

    match parsed {
        Ok(value) => RawPlan::from_value(&value),
        Err(message) => RawPlan::with_issue(source_issue("$", message, "plan.source.parse_error")),
    }
}

fn fenced_block(input: &str) -> Option<&str> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)```").expect("valid regex"))
        .captures(input)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str())
}

fn looks_like_json(input: &str) -> bool {
    input.starts_with('{') || input.starts_with('[')
}

fn source_issue(field: &str, message: impl Into<String>, reference: &str) -> StructuredIssue {
    StructuredIssue::new("plan_source", IssueSeverity::Warning, field, message)
        .with_reference(reference)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
