use super::{request_plan, RetryingPlanSource};
use crate::collaborators::{CollaboratorError, PlanRequest, PlanSource};
use archplan_plan::{validate, FallbackReason};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

struct ScriptedPlanner {
    replies: RefCell<VecDeque<Result<String, CollaboratorError>>>,
    attempts: Rc<RefCell<u32>>,
}

impl ScriptedPlanner {
    fn new(
        replies: Vec<Result<String, CollaboratorError>>,
        attempts: Rc<RefCell<u32>>,
    ) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            attempts,
        }
    }
}

impl PlanSource for ScriptedPlanner {
    fn propose(&self, _request: &PlanRequest) -> Result<String, CollaboratorError> {
        *self.attempts.borrow_mut() += 1;
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(CollaboratorError::Failed("script exhausted".to_string())))
    }
}

fn request() -> PlanRequest {
    PlanRequest {
        prompt: "draw my AWS stack".to_string(),
        ..PlanRequest::default()
    }
}

#[test]
fn transient_failure_is_retried_once() {
    let attempts = Rc::new(RefCell::new(0));
    let planner = ScriptedPlanner::new(
        vec![
            Err(CollaboratorError::Timeout { after_ms: 500 }),
            Ok(r#"[{"id": 1, "action": "reply"}]"#.to_string()),
        ],
        attempts.clone(),
    );
    let raw = request_plan(&RetryingPlanSource::new(planner, 1), &request());

    assert_eq!(*attempts.borrow(), 2);
    assert_eq!(raw.steps.len(), 1);
    assert!(raw.issues.is_empty());
}

#[test]
fn retries_are_bounded_and_exhaustion_falls_back() {
    let attempts = Rc::new(RefCell::new(0));
    let planner = ScriptedPlanner::new(Vec::new(), attempts.clone());
    let raw = request_plan(&RetryingPlanSource::new(planner, 2), &request());

    assert_eq!(*attempts.borrow(), 3);
    assert!(raw.steps.is_empty());
    assert!(raw.issues[0].has_reference("plan.source.unavailable"));
    assert_eq!(
        validate(&raw).fallback_reason(),
        Some(&FallbackReason::EmptyPlan)
    );
}

#[test]
fn zero_retries_means_a_single_attempt() {
    let attempts = Rc::new(RefCell::new(0));
    let planner = ScriptedPlanner::new(
        vec![Err(CollaboratorError::Unavailable("down".to_string()))],
        attempts.clone(),
    );
    let source = RetryingPlanSource::new(planner, 0);

    assert_eq!(
        source.propose(&request()),
        Err(CollaboratorError::Unavailable("down".to_string()))
    );
    assert_eq!(*attempts.borrow(), 1);
}
