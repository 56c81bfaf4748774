mod coerce;

use crate::graph::topological_order;
use crate::model::{ActionKind, Plan, Step, StepArgs};
use crate::parse::RawPlan;
use archplan_core::{IssueSeverity, StructuredIssue};
use coerce::{coerce_dependencies, coerce_int, DependencyList};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyPlan,
    Cycle { step_ids: Vec<i64> },
}

/// What the validator did with a candidate. Both variants carry an executable plan.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The candidate survived, possibly after repairs listed in `notes`.
    Repaired {
        plan: Plan,
        notes: Vec<StructuredIssue>,
    },
    /// The candidate was discarded in favour of [`Plan::canonical_fallback`].
    Replaced {
        plan: Plan,
        reason: FallbackReason,
        notes: Vec<StructuredIssue>,
    },
}

impl ValidationOutcome {
    pub fn plan(&self) -> &Plan {
        match self {
            ValidationOutcome::Repaired { plan, .. } | ValidationOutcome::Replaced { plan, .. } => {
                plan
            }
        }
    }

    pub fn into_plan(self) -> Plan {
        match self {
            ValidationOutcome::Repaired { plan, .. } | ValidationOutcome::Replaced { plan, .. } => {
                plan
            }
        }
    }

    pub fn notes(&self) -> &[StructuredIssue] {
        match self {
            ValidationOutcome::Repaired { notes, .. }
            | ValidationOutcome::Replaced { notes, .. } => notes,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, ValidationOutcome::Replaced { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            ValidationOutcome::Repaired { .. } => None,
            ValidationOutcome::Replaced { reason, .. } => Some(reason),
        }
    }
}

/// Normalizes an untrusted candidate into a plan whose ids are unique, whose actions are
/// all known, whose edges point at other existing steps, which is acyclic, and in which
/// every step with a required predecessor action depends on the highest-id step of that
/// action. Never fails; unrepairable input is replaced by the canonical fallback.
pub fn validate(raw: &RawPlan) -> ValidationOutcome {
    let mut notes = raw.issues.clone();
    let mut steps = normalize_steps(&raw.steps, &mut notes);

    if steps.is_empty() {
        notes.push(
            repair_note(
                IssueSeverity::Warning,
                "$.steps",
                "no usable steps; using the canonical fallback plan",
                "plan.empty",
            ),
        );
        return ValidationOutcome::Replaced {
            plan: Plan::canonical_fallback(),
            reason: FallbackReason::EmptyPlan,
            notes,
        };
    }

    inject_ordering_edges(&mut steps, &mut notes);
    prune_edges(&mut steps, &mut notes);

    if let Err(step_ids) = topological_order(&steps) {
        notes.push(
            repair_note(
                IssueSeverity::Warning,
                "$.steps",
                format!("dependency cycle through steps {step_ids:?}; using the canonical fallback plan"),
                "plan.graph.cycle",
            )
            .with_related(json!({ "step_ids": step_ids })),
        );
        return ValidationOutcome::Replaced {
            plan: Plan::canonical_fallback(),
            reason: FallbackReason::Cycle { step_ids },
            notes,
        };
    }

    ValidationOutcome::Repaired {
        plan: Plan::new(steps),
        notes,
    }
}

/// Re-validates an already typed plan through its wire form.
pub fn validate_plan(plan: &Plan) -> ValidationOutcome {
    validate(&RawPlan::from_plan(plan))
}

fn normalize_steps(raw_steps: &[Value], notes: &mut Vec<StructuredIssue>) -> Vec<Step> {
    let mut seen_ids = HashSet::<i64>::new();
    let mut steps = Vec::<Step>::new();

    for (index, raw) in raw_steps.iter().enumerate() {
        let field = format!("$.steps[{index}]");
        let position = index as i64 + 1;

        let Some(object) = raw.as_object() else {
            notes.push(repair_note(
                IssueSeverity::Warning,
                field,
                "step entry is not an object; dropped",
                "plan.step.not_object",
            ));
            continue;
        };

        let raw_action = object.get("action");
        let Some(kind) = raw_action.and_then(Value::as_str).and_then(ActionKind::parse) else {
            notes.push(
                repair_note(
                    IssueSeverity::Warning,
                    format!("{field}.action"),
                    "step action is not recognized; dropped",
                    "plan.step.unknown_action",
                )
                .with_related(json!({ "action": raw_action.cloned().unwrap_or(Value::Null) })),
            );
            continue;
        };

        let id = match object.get("id").map(|value| (value, coerce_int(value))) {
            Some((_, Some(id))) => id,
            Some((value, None)) => {
                notes.push(
                    repair_note(
                        IssueSeverity::Info,
                        format!("{field}.id"),
                        format!("step id is not an integer; using position {position}"),
                        "plan.step.id_defaulted",
                    )
                    .with_related(json!({ "id": value })),
                );
                position
            }
            None => position,
        };

        if !seen_ids.insert(id) {
            notes.push(
                repair_note(
                    IssueSeverity::Warning,
                    field,
                    format!("duplicate step id {id}; later occurrence dropped"),
                    "plan.step.duplicate_id",
                )
                .with_step(id),
            );
            continue;
        }

        let empty = Map::new();
        let args = match object.get("args") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(args)) => args,
            Some(_) => {
                notes.push(
                    repair_note(
                        IssueSeverity::Info,
                        format!("{field}.args"),
                        "step args are not a mapping; treated as empty",
                        "plan.step.args_coerced",
                    )
                    .with_step(id),
                );
                &empty
            }
        };

        let depends_on = match coerce_dependencies(object.get("depends_on")) {
            DependencyList::Parsed { deps, rejected } => {
                if !rejected.is_empty() {
                    notes.push(
                        repair_note(
                            IssueSeverity::Info,
                            format!("{field}.depends_on"),
                            "non-integer dependencies dropped",
                            "plan.step.depends_on_coerced",
                        )
                        .with_step(id)
                        .with_related(Value::Array(rejected)),
                    );
                }
                deps
            }
            DependencyList::Invalid => {
                notes.push(
                    repair_note(
                        IssueSeverity::Info,
                        format!("{field}.depends_on"),
                        "depends_on is not a list; treated as empty",
                        "plan.step.depends_on_coerced",
                    )
                    .with_step(id),
                );
                Vec::new()
            }
        };

        steps.push(Step::new(id, StepArgs::from_raw(kind, args)).with_deps(depends_on));
    }

    steps
}

fn inject_ordering_edges(steps: &mut [Step], notes: &mut Vec<StructuredIssue>) {
    let latest = |kind: ActionKind, steps: &[Step]| {
        steps
            .iter()
            .filter(|step| step.action() == kind)
            .map(|step| step.id)
            .max()
    };

    for index in 0..steps.len() {
        let Some(required) = steps[index].action().required_predecessor() else {
            continue;
        };
        let Some(predecessor) = latest(required, steps) else {
            continue;
        };
        let step = &mut steps[index];
        if step.add_dependency(predecessor) {
            notes.push(
                repair_note(
                    IssueSeverity::Info,
                    "$.steps",
                    format!(
                        "{} step {} now depends on {} step {predecessor}",
                        step.action(),
                        step.id,
                        required
                    ),
                    "plan.edge.injected",
                )
                .with_step(step.id)
                .with_related(json!({ "dependency": predecessor })),
            );
        }
    }
}

fn prune_edges(steps: &mut [Step], notes: &mut Vec<StructuredIssue>) {
    let known = steps.iter().map(|step| step.id).collect::<BTreeSet<_>>();
    for step in steps.iter_mut() {
        let own_id = step.id;
        let mut kept = Vec::<i64>::with_capacity(step.depends_on.len());
        for dep in step.depends_on.drain(..) {
            if dep == own_id {
                notes.push(
                    repair_note(
                        IssueSeverity::Info,
                        "$.steps",
                        format!("step {own_id} depended on itself; edge removed"),
                        "plan.edge.self_loop",
                    )
                    .with_step(own_id),
                );
            } else if !known.contains(&dep) {
                notes.push(
                    repair_note(
                        IssueSeverity::Info,
                        "$.steps",
                        format!("step {own_id} depended on unknown step {dep}; edge removed"),
                        "plan.edge.dangling",
                    )
                    .with_step(own_id)
                    .with_related(json!({ "dependency": dep })),
                );
            } else {
                kept.push(dep);
            }
        }
        step.depends_on = kept;
    }
}

fn repair_note(
    severity: IssueSeverity,
    field: impl Into<String>,
    message: impl Into<String>,
    reference: &str,
) -> StructuredIssue {
    StructuredIssue::new("plan_repair", severity, field, message).with_reference(reference)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
