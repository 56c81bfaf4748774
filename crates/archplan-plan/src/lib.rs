pub mod graph;
pub mod model;
pub mod parse;
pub mod validate;

pub use graph::topological_order;
pub use model::{ActionKind, Plan, Step, StepArgs, UnknownActionError, FALLBACK_REPLY_TEXT};
pub use parse::{parse_raw_plan, RawPlan};
pub use validate::{validate, validate_plan, FallbackReason, ValidationOutcome};
