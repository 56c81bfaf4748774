use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

/// Everything the executor would otherwise read from the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    pub tool_timeout_ms: u64,
    /// Extra attempts granted to the planner call at the chat boundary.
    pub plan_retry_count: u32,
    pub default_tool_command: Option<String>,
    pub output_dir: PathBuf,
    pub default_providers: Vec<String>,
    pub diagram_kinds: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tool_timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
            plan_retry_count: 1,
            default_tool_command: None,
            output_dir: PathBuf::from("outputs"),
            default_providers: vec!["aws".to_string()],
            diagram_kinds: vec![
                "class".to_string(),
                "sequence".to_string(),
                "deployment".to_string(),
            ],
        }
    }
}

impl ExecutorConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }
}
