use archplan_engine::{DocumentParser, DocumentRecord, ParsedDocuments};
use serde_json::Value;
use std::path::{Path, PathBuf};

const TEXT_LIMIT: usize = 5_000;
const OTHER_LIMIT: usize = 2_000;

/// Reads input documents from disk, keyed by what kind of input they are.
///
/// Binary office formats are recorded by name only. Files sharing a key overwrite each
/// other in input order.
#[derive(Debug, Clone, Default)]
pub struct FileDocumentParser;

impl FileDocumentParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_one(&self, path: &Path) -> (String, DocumentRecord) {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "md" | "txt" => (
                "doc".to_string(),
                DocumentRecord::with_content(file, truncate_chars(&read_lossy(path), TEXT_LIMIT)),
            ),
            "csv" => ("analytics".to_string(), csv_record(file, &read_lossy(path))),
            "json" => ("analytics".to_string(), json_record(file, &read_lossy(path))),
            "xls" | "xlsx" => ("excel".to_string(), DocumentRecord::with_content(file, "")),
            "pdf" | "docx" => (extension.clone(), DocumentRecord::with_content(file, "")),
            _ => (
                "file".to_string(),
                DocumentRecord::with_content(file, truncate_chars(&read_lossy(path), OTHER_LIMIT)),
            ),
        }
    }
}

impl DocumentParser for FileDocumentParser {
    fn parse(&self, documents: &[PathBuf]) -> ParsedDocuments {
        documents
            .iter()
            .map(|path| self.parse_one(path))
            .collect()
    }
}

fn read_lossy(path: &Path) -> String {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn csv_record(file: String, text: &str) -> DocumentRecord {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let columns = lines
        .next()
        .map(|header| {
            header
                .split(',')
                .map(|column| column.trim().trim_matches('"').to_string())
                .collect()
        })
        .unwrap_or_default();
    DocumentRecord {
        file,
        columns,
        rows: Some(lines.count()),
        ..DocumentRecord::default()
    }
}

fn json_record(file: String, text: &str) -> DocumentRecord {
    let keys = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => object.keys().cloned().collect(),
        _ => Vec::new(),
    };
    DocumentRecord {
        file,
        keys,
        ..DocumentRecord::default()
    }
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
