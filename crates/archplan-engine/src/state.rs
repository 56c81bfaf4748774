use crate::collaborators::ParsedDocuments;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What one run was asked to work on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunInputs {
    #[serde(default)]
    pub documents: Vec<PathBuf>,
    #[serde(default)]
    pub prompt: String,
}

impl RunInputs {
    pub fn new(documents: Vec<PathBuf>, prompt: impl Into<String>) -> Self {
        Self {
            documents,
            prompt: prompt.into(),
        }
    }
}

/// Accumulator owned by exactly one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    pub docs: Option<ParsedDocuments>,
    pub specs: Option<String>,
    pub images: Vec<PathBuf>,
    pub texts: Vec<String>,
    pub reply: Option<String>,
    pub log: Vec<String>,
}

impl RunState {
    pub fn has_reply(&self) -> bool {
        self.reply.as_deref().is_some_and(|reply| !reply.is_empty())
    }

    pub fn into_output(self) -> RunOutput {
        let reply = match self.reply {
            Some(reply) if !reply.is_empty() => reply,
            _ => synthesize_reply(&self.images, &self.texts),
        };
        RunOutput {
            images: self.images,
            texts: self.texts,
            reply,
            log: self.log,
        }
    }
}

/// The record handed back to the chat-facing caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub images: Vec<PathBuf>,
    pub texts: Vec<String>,
    pub reply: String,
    pub log: Vec<String>,
}

/// Default reply: the generated file list, then every text blob.
pub fn synthesize_reply(images: &[PathBuf], texts: &[String]) -> String {
    let files = images
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    let mut reply = format!("Generated files:\n{files}");
    if !texts.is_empty() {
        reply.push_str("\n\n");
        reply.push_str(texts.join("\n\n").as_str());
    }
    reply
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
