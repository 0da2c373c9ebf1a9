//! Local MCP server transport.
//!
//! Each invocation spawns the server, calls one tool whose name is the
//! collaborator's logical name with the payload as arguments, and shuts
//! the server down again.

use std::rc::Rc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tracing::debug;

use super::Invoker;
use crate::dispatch::DispatchError;

pub struct McpInvoker {
    runtime: Rc<Runtime>,
    program: String,
    args: Vec<String>,
    tool: String,
    label: String,
    timeout: Duration,
}

impl McpInvoker {
    pub fn new(
        runtime: Rc<Runtime>,
        program: String,
        args: Vec<String>,
        tool: &str,
        timeout: Duration,
    ) -> Self {
        let label = if args.is_empty() {
            format!("local: {program} #{tool}")
        } else {
            format!("local: {} {} #{tool}", program, args.join(" "))
        };
        Self {
            runtime,
            program,
            args,
            tool: tool.to_string(),
            label,
            timeout,
        }
    }

    async fn call(&self, payload: &Value) -> Result<Value, DispatchError> {
        use rmcp::ServiceExt;
        use rmcp::model::CallToolRequestParam;
        use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
        use tokio::process::Command;

        let transport = TokioChildProcess::new(Command::new(&self.program).configure(|c| {
            c.args(&self.args);
            // stdout carries the protocol; keep the server's banner noise out of the terminal
            c.stderr(std::process::Stdio::null());
        }))
        .map_err(|e| DispatchError::unavailable(&self.label, format!("spawn failed: {e}")))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| DispatchError::unavailable(&self.label, format!("initialize failed: {e}")))?;

        let outcome = service
            .call_tool(CallToolRequestParam {
                name: self.tool.clone().into(),
                arguments: payload.as_object().cloned(),
            })
            .await;

        // Shutdown failures don't affect the answer.
        let _ = service.cancel().await;

        let call_result = outcome
            .map_err(|e| DispatchError::unavailable(&self.label, format!("tool call failed: {e}")))?;
        let raw = serde_json::to_value(&call_result)
            .map_err(|e| DispatchError::backend(&self.label, format!("unreadable tool result: {e}")))?;
        debug!(tool = %self.tool, "mcp tool returned");
        tool_result_json(&raw).map_err(|msg| DispatchError::backend(&self.label, msg))
    }
}

impl Invoker for McpInvoker {
    fn target(&self) -> &str {
        &self.label
    }

    fn invoke(&self, payload: &Value) -> Result<Value, DispatchError> {
        self.runtime
            .block_on(async { tokio::time::timeout(self.timeout, self.call(payload)).await })
            .map_err(|_| {
                DispatchError::unavailable(
                    &self.label,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            })?
    }
}

/// Extract the JSON answer from a serialized tool result: structured content
/// first, else the first text block parsed as JSON. Tool errors become an
/// `error` field.
fn tool_result_json(result: &Value) -> Result<Value, String> {
    let first_text = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| {
            blocks
                .iter()
                .find_map(|b| b.get("text").and_then(Value::as_str))
        });

    if result.get("isError").and_then(Value::as_bool) == Some(true) {
        let message = first_text.unwrap_or("tool reported an error");
        return Ok(json!({ "error": message }));
    }

    if let Some(structured) = result.get("structuredContent").filter(|v| v.is_object()) {
        return Ok(structured.clone());
    }

    match first_text {
        Some(text) => serde_json::from_str::<Value>(text)
            .map_err(|_| format!("tool answered with non-JSON text: {}", text.trim())),
        None => Err("tool answered without content".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_content_wins() {
        let raw = json!({
            "content": [{"type": "text", "text": "{\"goals\": []}"}],
            "structuredContent": {"goals": [{"name": "Car"}]}
        });
        assert_eq!(
            tool_result_json(&raw).unwrap(),
            json!({"goals": [{"name": "Car"}]})
        );
    }

    #[test]
    fn text_content_is_parsed() {
        let raw = json!({"content": [{"type": "text", "text": "{\"products\": []}"}]});
        assert_eq!(tool_result_json(&raw).unwrap(), json!({"products": []}));
    }

    #[test]
    fn tool_errors_become_error_fields() {
        let raw = json!({"content": [{"type": "text", "text": "unknown action"}], "isError": true});
        assert_eq!(
            tool_result_json(&raw).unwrap(),
            json!({"error": "unknown action"})
        );
    }

    #[test]
    fn plain_text_is_rejected() {
        let raw = json!({"content": [{"type": "text", "text": "hello"}]});
        assert!(tool_result_json(&raw).is_err());
        assert!(tool_result_json(&json!({"content": []})).is_err());
    }
}
