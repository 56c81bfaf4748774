pub mod collaborators;
pub mod config;
pub mod events;
pub mod executor;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod state;

pub use collaborators::{
    CollaboratorError, Collaborators, DocumentParser, DocumentRecord, GenerationContext,
    GenerationOutput, GenerationPipeline, ParsedDocuments, PlanRequest, PlanSource,
    SpecSynthesizer, ToolCall, ToolInvoker, ToolResponse,
};
pub use config::ExecutorConfig;
pub use events::{
    encode_event_jsonl_line, ensure_monotonic_sequence, parse_event_jsonl_line, EngineEvent,
    EngineEventRecord, EngineEventSequenceError, EngineEventStream, EngineEventType,
    ENGINE_EVENT_SCHEMA_0_0_1, EVENT_TS,
};
pub use executor::{
    detect_providers, ActionHandler, CancelFlag, ExecutionReport, HandlerTable, PlanExecutor,
    RunStatus, StepContext, StepError, StepOutcome,
};
pub use pipeline::{run_plan, PipelineRun};
pub use scheduler::{order, order_steps, ScheduleOutcome};
pub use source::{request_plan, RetryingPlanSource};
pub use state::{synthesize_reply, RunInputs, RunOutput, RunState};
