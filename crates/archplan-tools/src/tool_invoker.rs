use archplan_engine::{CollaboratorError, ToolCall, ToolInvoker, ToolResponse};
use serde::Deserialize;
use serde_json::json;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum ToolInvokerError {
    #[error("build tokio runtime for tool invoker failed: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Talks to a tool server over stdio: one JSON request line in, one reply out.
///
/// The server command is split on whitespace and spawned per call. Calls block on a
/// private current-thread runtime; a call that outlives its timeout is abandoned and the
/// child killed.
pub struct ProcessToolInvoker {
    runtime: tokio::runtime::Runtime,
}

#[derive(Debug, Deserialize)]
struct ToolReply {
    #[serde(default)]
    image_path: Option<PathBuf>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ProcessToolInvoker {
    pub fn new() -> Result<Self, ToolInvokerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }
}

impl ToolInvoker for ProcessToolInvoker {
    fn call_tool(&self, call: &ToolCall) -> Result<ToolResponse, CollaboratorError> {
        let mut parts = call.server_command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CollaboratorError::Unavailable("empty server command".to_string()))?;
        let args = parts.collect::<Vec<_>>();
        let request = serde_json::to_string(&json!({ "tool": call.tool, "params": call.params }))
            .map_err(|error| CollaboratorError::Failed(format!("encode tool request: {error}")))?;
        let after_ms = u64::try_from(call.timeout.as_millis()).unwrap_or(u64::MAX);

        self.runtime.block_on(async {
            let mut child = Command::new(program)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|error| {
                    CollaboratorError::Unavailable(format!("spawn `{program}` failed: {error}"))
                })?;
            let stdin = child.stdin.take();

            let exchange = async move {
                if let Some(mut stdin) = stdin {
                    let line = format!("{request}\n");
                    if let Err(error) = stdin.write_all(line.as_bytes()).await {
                        // Servers that answer without reading close stdin early.
                        if error.kind() != ErrorKind::BrokenPipe {
                            return Err(error);
                        }
                    }
                }
                child.wait_with_output().await
            };

            match tokio::time::timeout(call.timeout, exchange).await {
                Err(_) => Err(CollaboratorError::Timeout { after_ms }),
                Ok(Err(error)) => Err(CollaboratorError::Failed(format!(
                    "tool `{}` i/o failed: {error}",
                    call.tool
                ))),
                Ok(Ok(output)) => {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if !output.status.success() {
                        return Err(CollaboratorError::Failed(format!(
                            "tool `{}` exited with {}: {}",
                            call.tool,
                            output.status,
                            stdout.trim()
                        )));
                    }
                    parse_tool_reply(stdout.trim())
                }
            }
        })
    }
}

/// Reads a server reply: a JSON object with `image_path`, `text` or `error`, or plain
/// text. A silent server contributes nothing.
pub(crate) fn parse_tool_reply(stdout: &str) -> Result<ToolResponse, CollaboratorError> {
    if stdout.trim().is_empty() {
        return Ok(ToolResponse::default());
    }
    match serde_json::from_str::<ToolReply>(stdout) {
        Ok(ToolReply {
            error: Some(error), ..
        }) => Err(CollaboratorError::Failed(error)),
        Ok(ToolReply {
            image_path,
            text,
            error: None,
        }) if image_path.is_some() || text.is_some() => Ok(ToolResponse { image_path, text }),
        _ => Ok(ToolResponse::text(stdout)),
    }
}

#[cfg(test)]
#[path = "tool_invoker_test.rs"]
mod tests;
