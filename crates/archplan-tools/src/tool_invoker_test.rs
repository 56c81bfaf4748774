use super::{parse_tool_reply, ProcessToolInvoker};
use archplan_engine::{CollaboratorError, ToolCall, ToolInvoker, ToolResponse};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

fn call(server_command: &str, timeout_ms: u64) -> ToolCall {
    ToolCall {
        server_command: server_command.to_string(),
        tool: "generate_diagram".to_string(),
        params: BTreeMap::from([("format".to_string(), json!("png"))]),
        timeout: Duration::from_millis(timeout_ms),
    }
}

#[test]
fn reply_shapes() {
    assert_eq!(
        parse_tool_reply(r#"{"image_path": "out/net.png"}"#),
        Ok(ToolResponse::image("out/net.png"))
    );
    assert_eq!(
        parse_tool_reply(r#"{"error": "bad code"}"#),
        Err(CollaboratorError::Failed("bad code".to_string()))
    );
    assert_eq!(
        parse_tool_reply("plain answer"),
        Ok(ToolResponse::text("plain answer"))
    );
    assert_eq!(
        parse_tool_reply(r#"{"status": "ok"}"#),
        Ok(ToolResponse::text(r#"{"status": "ok"}"#))
    );
}

#[test]
fn silent_server_contributes_nothing() {
    assert_eq!(parse_tool_reply(""), Ok(ToolResponse::default()));
    assert_eq!(parse_tool_reply("  \n"), Ok(ToolResponse::default()));
}

#[cfg(unix)]
#[test]
fn request_line_reaches_the_server() {
    let invoker = ProcessToolInvoker::new().expect("runtime");
    let response = invoker.call_tool(&call("cat", 5_000)).expect("cat echoes");

    let echoed = response.text.expect("text reply");
    let request: serde_json::Value = serde_json::from_str(&echoed).expect("request json");
    assert_eq!(request["tool"], "generate_diagram");
    assert_eq!(request["params"]["format"], "png");
}

#[cfg(unix)]
#[test]
fn json_reply_from_server_is_decoded() {
    let invoker = ProcessToolInvoker::new().expect("runtime");
    let response = invoker
        .call_tool(&call(r#"echo {"image_path":"out/net.png","text":"done"}"#, 5_000))
        .expect("echo replies");

    assert_eq!(response.image_path, Some(PathBuf::from("out/net.png")));
    assert_eq!(response.text.as_deref(), Some("done"));
}

#[cfg(unix)]
#[test]
fn slow_server_times_out() {
    let invoker = ProcessToolInvoker::new().expect("runtime");
    let result = invoker.call_tool(&call("sleep 5", 100));

    assert_eq!(result, Err(CollaboratorError::Timeout { after_ms: 100 }));
}

#[test]
fn missing_server_binary_is_unavailable() {
    let invoker = ProcessToolInvoker::new().expect("runtime");
    let result = invoker.call_tool(&call("archplan-no-such-tool-server", 1_000));

    assert!(matches!(result, Err(CollaboratorError::Unavailable(_))));
    assert!(matches!(
        invoker.call_tool(&call("   ", 1_000)),
        Err(CollaboratorError::Unavailable(_))
    ));
}
