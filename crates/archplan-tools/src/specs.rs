use crate::documents::truncate_chars;
use archplan_engine::{ParsedDocuments, SpecSynthesizer};

const SECTION_LIMIT: usize = 4_000;

/// Renders parsed documents and the prompt as one markdown specification.
#[derive(Debug, Clone, Default)]
pub struct MarkdownSpecSynthesizer;

impl MarkdownSpecSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl SpecSynthesizer for MarkdownSpecSynthesizer {
    fn synthesize(&self, documents: &ParsedDocuments, prompt: &str) -> String {
        let mut parts = vec!["# Specification".to_string()];
        if !prompt.is_empty() {
            parts.push("## User Prompt".to_string());
            parts.push(prompt.to_string());
        }
        for (key, record) in documents {
            parts.push(format!("## {key} - {}", record.file));
            parts.push(truncate_chars(&record.content, SECTION_LIMIT));
        }
        parts.join("\n\n")
    }
}

#[cfg(test)]
#[path = "specs_test.rs"]
mod tests;
