use super::{StepContext, StepError, StepOutcome};
use crate::collaborators::{GenerationContext, ToolCall};
use crate::events::{EngineEvent, EngineEventType};
use crate::state::synthesize_reply;
use archplan_plan::{ActionKind, Step, StepArgs};

pub trait ActionHandler {
    fn handle(&self, step: &Step, context: &mut StepContext<'_>)
        -> Result<StepOutcome, StepError>;
}

/// One handler per [`ActionKind`]. Lookup is an exhaustive match, so a new kind cannot
/// be added without a handler.
pub struct HandlerTable {
    ingest_docs: Box<dyn ActionHandler>,
    build_specs: Box<dyn ActionHandler>,
    gen_all: Box<dyn ActionHandler>,
    mcp_tool: Box<dyn ActionHandler>,
    reply: Box<dyn ActionHandler>,
}

impl HandlerTable {
    pub fn builtin() -> Self {
        Self {
            ingest_docs: Box::new(IngestDocsHandler),
            build_specs: Box::new(BuildSpecsHandler),
            gen_all: Box::new(GenAllHandler),
            mcp_tool: Box::new(McpToolHandler),
            reply: Box::new(ReplyHandler),
        }
    }

    pub fn with_handler(mut self, kind: ActionKind, handler: Box<dyn ActionHandler>) -> Self {
        match kind {
            ActionKind::IngestDocs => self.ingest_docs = handler,
            ActionKind::BuildSpecs => self.build_specs = handler,
            ActionKind::GenAll => self.gen_all = handler,
            ActionKind::McpTool => self.mcp_tool = handler,
            ActionKind::Reply => self.reply = handler,
        }
        self
    }

    pub fn handler_for(&self, kind: ActionKind) -> &dyn ActionHandler {
        match kind {
            ActionKind::IngestDocs => self.ingest_docs.as_ref(),
            ActionKind::BuildSpecs => self.build_specs.as_ref(),
            ActionKind::GenAll => self.gen_all.as_ref(),
            ActionKind::McpTool => self.mcp_tool.as_ref(),
            ActionKind::Reply => self.reply.as_ref(),
        }
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn mismatch(step: &Step, handler: ActionKind) -> StepError {
    StepError::ArgsMismatch {
        step_id: step.id,
        handler,
        actual: step.action(),
    }
}

struct IngestDocsHandler;

impl ActionHandler for IngestDocsHandler {
    fn handle(
        &self,
        step: &Step,
        context: &mut StepContext<'_>,
    ) -> Result<StepOutcome, StepError> {
        let StepArgs::IngestDocs { force } = &step.args else {
            return Err(mismatch(step, ActionKind::IngestDocs));
        };
        if context.state.docs.is_some() && !force {
            return Ok(StepOutcome::Skipped {
                reason: "documents already parsed".to_string(),
            });
        }
        let docs = context
            .collaborators
            .documents
            .parse(&context.inputs.documents);
        context.state.docs = Some(docs);
        Ok(StepOutcome::Completed)
    }
}

struct BuildSpecsHandler;

impl ActionHandler for BuildSpecsHandler {
    fn handle(
        &self,
        step: &Step,
        context: &mut StepContext<'_>,
    ) -> Result<StepOutcome, StepError> {
        if !matches!(step.args, StepArgs::BuildSpecs) {
            return Err(mismatch(step, ActionKind::BuildSpecs));
        }
        let specs = build_specs(context);
        context.state.specs = Some(specs);
        Ok(StepOutcome::Completed)
    }
}

/// Synthesizes specs from the parsed documents, parsing first when nothing was ingested.
fn build_specs(context: &mut StepContext<'_>) -> String {
    if context.state.docs.is_none() {
        let docs = context
            .collaborators
            .documents
            .parse(&context.inputs.documents);
        context.state.docs = Some(docs);
    }
    let docs = context.state.docs.as_ref().cloned().unwrap_or_default();
    context
        .collaborators
        .specs
        .synthesize(&docs, &context.inputs.prompt)
}

struct GenAllHandler;

impl ActionHandler for GenAllHandler {
    fn handle(
        &self,
        step: &Step,
        context: &mut StepContext<'_>,
    ) -> Result<StepOutcome, StepError> {
        if !matches!(step.args, StepArgs::GenAll) {
            return Err(mismatch(step, ActionKind::GenAll));
        }
        let spec_text = match context.state.specs.clone() {
            Some(specs) => specs,
            None => {
                let specs = build_specs(context);
                context.state.specs = Some(specs.clone());
                specs
            }
        };
        let request = GenerationContext {
            spec_text,
            prompt: context.inputs.prompt.clone(),
            providers: detect_providers(
                &context.inputs.prompt,
                &context.config.default_providers,
            ),
            diagram_kinds: context.config.diagram_kinds.clone(),
            output_dir: context.config.output_dir.clone(),
        };
        match context.collaborators.generator.generate(&request) {
            Ok(output) => {
                context.state.images = output.images;
                context.state.texts = output.texts;
                Ok(StepOutcome::Completed)
            }
            Err(error) => {
                context.log(format!("gen_all error: {error}"));
                Ok(StepOutcome::Failed {
                    message: error.to_string(),
                })
            }
        }
    }
}

struct McpToolHandler;

impl ActionHandler for McpToolHandler {
    fn handle(
        &self,
        step: &Step,
        context: &mut StepContext<'_>,
    ) -> Result<StepOutcome, StepError> {
        let StepArgs::McpTool {
            server_command,
            tool,
            params,
        } = &step.args
        else {
            return Err(mismatch(step, ActionKind::McpTool));
        };
        let server_command = server_command
            .clone()
            .or_else(|| context.config.default_tool_command.clone())
            .filter(|command| !command.trim().is_empty());
        let (Some(server_command), Some(tool)) = (server_command, tool.clone()) else {
            context.log("mcp_tool skipped: server_command or tool missing");
            return Ok(StepOutcome::Skipped {
                reason: "server_command or tool missing".to_string(),
            });
        };

        let call = ToolCall {
            server_command,
            tool: tool.clone(),
            params: params.clone(),
            timeout: context.config.tool_timeout(),
        };
        match context.collaborators.tools.call_tool(&call) {
            Ok(response) => {
                let has_image = response.image_path.is_some();
                let has_text = response.text.is_some();
                if let Some(image) = response.image_path {
                    context.state.images.push(image);
                }
                if let Some(text) = response.text {
                    context.state.texts.push(text);
                }
                context.log(format!("mcp_tool {tool} OK"));
                context.emit(
                    EngineEvent::for_step(EngineEventType::ToolCalled, step.id)
                        .with("tool", tool)
                        .with("image", has_image)
                        .with("text", has_text),
                );
                Ok(StepOutcome::Completed)
            }
            Err(error) => {
                context.log(format!("mcp_tool error: {error}"));
                Ok(StepOutcome::Failed {
                    message: error.to_string(),
                })
            }
        }
    }
}

struct ReplyHandler;

impl ActionHandler for ReplyHandler {
    fn handle(
        &self,
        step: &Step,
        context: &mut StepContext<'_>,
    ) -> Result<StepOutcome, StepError> {
        let StepArgs::Reply { text } = &step.args else {
            return Err(mismatch(step, ActionKind::Reply));
        };
        let synthesized = text.is_none();
        let reply = text
            .clone()
            .unwrap_or_else(|| synthesize_reply(&context.state.images, &context.state.texts));
        context.state.reply = Some(reply);
        context.emit(
            EngineEvent::for_step(EngineEventType::ReplySet, step.id)
                .with("synthesized", synthesized),
        );
        Ok(StepOutcome::Completed)
    }
}

const PROVIDER_KEYWORDS: [(&str, &[&str]); 4] = [
    ("aws", &["aws", "amazon"]),
    ("azure", &["azure"]),
    ("gcp", &["gcp", "google"]),
    ("onprem", &["onprem", "on-prem", "on premise"]),
];

/// Providers named in the prompt, in a fixed order. Falls back to `defaults` when the
/// prompt names none.
pub fn detect_providers(prompt: &str, defaults: &[String]) -> Vec<String> {
    let lowered = prompt.to_lowercase();
    let found = PROVIDER_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(provider, _)| provider.to_string())
        .collect::<Vec<_>>();
    if found.is_empty() {
        defaults.to_vec()
    } else {
        found
    }
}
