use crate::collaborators::{CollaboratorError, PlanRequest, PlanSource};
use archplan_core::{IssueSeverity, StructuredIssue};
use archplan_plan::{parse_raw_plan, RawPlan};

/// Grants a planner a bounded number of extra attempts. Only the planner call is retried;
/// steps are never re-run.
pub struct RetryingPlanSource<S> {
    inner: S,
    retries: u32,
}

impl<S: PlanSource> RetryingPlanSource<S> {
    pub fn new(inner: S, retries: u32) -> Self {
        Self { inner, retries }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: PlanSource> PlanSource for RetryingPlanSource<S> {
    fn propose(&self, request: &PlanRequest) -> Result<String, CollaboratorError> {
        let mut attempt = 0;
        loop {
            match self.inner.propose(request) {
                Ok(text) => return Ok(text),
                Err(error) if attempt >= self.retries => return Err(error),
                Err(_) => attempt += 1,
            }
        }
    }
}

/// Asks `source` for a candidate plan. A planner that keeps failing yields an empty
/// candidate, which validation turns into the canonical fallback.
pub fn request_plan(source: &dyn PlanSource, request: &PlanRequest) -> RawPlan {
    match source.propose(request) {
        Ok(text) => parse_raw_plan(&text),
        Err(error) => RawPlan {
            steps: Vec::new(),
            issues: vec![StructuredIssue::new(
                "plan_source",
                IssueSeverity::Warning,
                "$",
                format!("planner failed: {error}"),
            )
            .with_reference("plan.source.unavailable")],
        },
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
