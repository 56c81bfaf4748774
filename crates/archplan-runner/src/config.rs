use archplan_core::{IssueSeverity, StructuredIssue};
use archplan_engine::ExecutorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const RUNNER_CONFIG_SCHEMA: &str = "archplan-runner/0.0.1";
const MAX_PLAN_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_runner_schema")]
    pub schema: String,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            schema: default_runner_schema(),
            executor: ExecutorConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerConfigError {
    #[error("read runner config failed `{path}`: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("runner config parse failed: {0}")]
    Parse(String),
    #[error("runner config validation failed: {0:?}")]
    Validation(Vec<StructuredIssue>),
}

pub fn load_runner_config(path: &Path) -> Result<RunnerConfig, RunnerConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| RunnerConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let expanded = expand_env_placeholders(raw.as_str()).map_err(RunnerConfigError::Parse)?;
    let config: RunnerConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(expanded.as_str()).map_err(|error| {
            RunnerConfigError::Parse(format!("json decode error: {error}"))
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(expanded.as_str()).map_err(|error| {
            RunnerConfigError::Parse(format!("yaml decode error: {error}"))
        })?,
        _ => serde_yaml::from_str(expanded.as_str())
            .or_else(|_| serde_json::from_str(expanded.as_str()))
            .map_err(|error| RunnerConfigError::Parse(error.to_string()))?,
    };

    let mut issues = validate_runner_config(&config);
    StructuredIssue::sort_stable(&mut issues);
    if !issues.is_empty() {
        return Err(RunnerConfigError::Validation(issues));
    }
    Ok(config)
}

/// No config file means the built-in defaults.
pub fn load_runner_config_or_default(
    path: Option<&Path>,
) -> Result<RunnerConfig, RunnerConfigError> {
    match path {
        Some(path) => load_runner_config(path),
        None => Ok(RunnerConfig::default()),
    }
}

pub fn validate_runner_config(config: &RunnerConfig) -> Vec<StructuredIssue> {
    let mut issues = Vec::<StructuredIssue>::new();
    if config.schema != RUNNER_CONFIG_SCHEMA {
        issues.push(config_issue(
            "runner.config.schema",
            "$.schema",
            format!(
                "unsupported runner config schema `{}` (expected `{RUNNER_CONFIG_SCHEMA}`)",
                config.schema
            ),
        ));
    }

    let executor = &config.executor;
    if executor.tool_timeout_ms == 0 {
        issues.push(config_issue(
            "runner.config.executor.tool_timeout",
            "$.executor.tool_timeout_ms",
            "tool_timeout_ms must be > 0".to_string(),
        ));
    }
    if executor.plan_retry_count > MAX_PLAN_RETRIES {
        issues.push(config_issue(
            "runner.config.executor.plan_retry_count",
            "$.executor.plan_retry_count",
            format!(
                "plan_retry_count {} exceeds the limit of {MAX_PLAN_RETRIES}",
                executor.plan_retry_count
            ),
        ));
    }
    if executor
        .default_tool_command
        .as_deref()
        .is_some_and(|command| command.trim().is_empty())
    {
        issues.push(config_issue(
            "runner.config.executor.default_tool_command",
            "$.executor.default_tool_command",
            "default_tool_command must not be blank; omit it instead".to_string(),
        ));
    }
    if executor.output_dir.as_os_str().is_empty() {
        issues.push(config_issue(
            "runner.config.executor.output_dir",
            "$.executor.output_dir",
            "output_dir must not be empty".to_string(),
        ));
    }

    issues
}

fn config_issue(reference: &str, field: &str, message: String) -> StructuredIssue {
    StructuredIssue::new("runner_config_error", IssueSeverity::Error, field, message)
        .with_reference(reference)
}

fn default_runner_schema() -> String {
    RUNNER_CONFIG_SCHEMA.to_string()
}

fn expand_env_placeholders(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err("unterminated env placeholder `${...`".to_string());
        };
        let key = &after[..end];
        if key.is_empty() {
            return Err("empty env placeholder `${}`".to_string());
        }
        let value = std::env::var(key)
            .map_err(|_| format!("missing env var for placeholder `${{{key}}}`"))?;
        out.push_str(value.as_str());
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
