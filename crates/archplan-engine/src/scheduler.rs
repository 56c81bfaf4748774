use archplan_plan::{topological_order, Plan, Step};
use serde::{Deserialize, Serialize};

/// A linear execution order for one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub steps: Vec<Step>,
    /// Set when no consistent order existed and `steps` is the input order.
    pub fell_back: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<i64>,
}

impl ScheduleOutcome {
    pub fn ids(&self) -> Vec<i64> {
        self.steps.iter().map(|step| step.id).collect()
    }
}

/// Orders steps so every dependency runs before its dependents, lowest id first among
/// steps that are ready together. Validated plans are acyclic; anything else is returned
/// in its declared order rather than rejected.
pub fn order_steps(plan: &Plan) -> ScheduleOutcome {
    match topological_order(&plan.steps) {
        Ok(indexes) => ScheduleOutcome {
            steps: indexes
                .into_iter()
                .map(|index| plan.steps[index].clone())
                .collect(),
            fell_back: false,
            unresolved: Vec::new(),
        },
        Err(unresolved) => ScheduleOutcome {
            steps: plan.steps.clone(),
            fell_back: true,
            unresolved,
        },
    }
}

pub fn order(plan: &Plan) -> Vec<Step> {
    order_steps(plan).steps
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
