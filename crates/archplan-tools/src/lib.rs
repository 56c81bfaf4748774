pub mod diagrams;
pub mod documents;
pub mod plan_source;
pub mod specs;
pub mod tool_invoker;

pub use diagrams::{mermaid_for, topology_flowchart, TextDiagramPipeline};
pub use documents::FileDocumentParser;
pub use plan_source::FilePlanSource;
pub use specs::MarkdownSpecSynthesizer;
pub use tool_invoker::{ProcessToolInvoker, ToolInvokerError};

use archplan_engine::Collaborators;

/// The local collaborator set used by the CLI.
pub fn builtin_collaborators() -> Result<Collaborators, ToolInvokerError> {
    Ok(Collaborators {
        documents: Box::new(FileDocumentParser::new()),
        specs: Box::new(MarkdownSpecSynthesizer::new()),
        generator: Box::new(TextDiagramPipeline::new()),
        tools: Box::new(ProcessToolInvoker::new()?),
    })
}
