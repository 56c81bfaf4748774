//! Boundary contracts for everything the engine calls out to. Implementations live
//! outside the engine; tests substitute recorders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Failed(String),
}

/// One parsed input document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl DocumentRecord {
    pub fn with_content(file: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

pub type ParsedDocuments = BTreeMap<String, DocumentRecord>;

pub trait DocumentParser {
    /// Must not fail: unreadable files come back with empty content.
    fn parse(&self, documents: &[PathBuf]) -> ParsedDocuments;
}

pub trait SpecSynthesizer {
    fn synthesize(&self, documents: &ParsedDocuments, prompt: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationContext {
    pub spec_text: String,
    pub prompt: String,
    pub providers: Vec<String>,
    pub diagram_kinds: Vec<String>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationOutput {
    #[serde(default)]
    pub images: Vec<PathBuf>,
    #[serde(default)]
    pub texts: Vec<String>,
}

pub trait GenerationPipeline {
    fn generate(&self, context: &GenerationContext) -> Result<GenerationOutput, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub server_command: String,
    pub tool: String,
    pub params: BTreeMap<String, Value>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            image_path: None,
            text: Some(text.into()),
        }
    }

    pub fn image(path: impl AsRef<Path>) -> Self {
        Self {
            image_path: Some(path.as_ref().to_path_buf()),
            text: None,
        }
    }
}

/// Calls a tool on an external tool server. Implementations enforce `call.timeout`.
pub trait ToolInvoker {
    fn call_tool(&self, call: &ToolCall) -> Result<ToolResponse, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub prompt: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub documents: Vec<PathBuf>,
    #[serde(default)]
    pub images: Vec<PathBuf>,
    #[serde(default)]
    pub history: Vec<String>,
}

/// The planner oracle. Its output is untrusted text.
pub trait PlanSource {
    fn propose(&self, request: &PlanRequest) -> Result<String, CollaboratorError>;
}

pub struct Collaborators {
    pub documents: Box<dyn DocumentParser>,
    pub specs: Box<dyn SpecSynthesizer>,
    pub generator: Box<dyn GenerationPipeline>,
    pub tools: Box<dyn ToolInvoker>,
}
