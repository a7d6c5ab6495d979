use serde_json::Value;

/// A decoded `data:` payload from the agent endpoint.
///
/// Variants are listed in dispatch priority: an assistant payload wins over a
/// `type` tag when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// `{ role: "assistant", content }` with non-empty content
    AssistantContent(String),
    /// `{ type: "text" | "content", content?, text? }`
    Text(String),
    /// `{ type: "tool_call", tool_name?, name? }`
    ToolCall(String),
    /// `{ type: "tool_result", content?, result? }`
    ToolResult(String),
    /// `{ type: "error", message }`
    Error(String),
    /// Anything else
    Ignored,
}

/// Shown when a tool call or result names nothing.
const UNKNOWN: &str = "unknown";

impl ServerEvent {
    pub fn from_value(value: &Value) -> Self {
        if value.get("role").and_then(Value::as_str) == Some("assistant") {
            if let Some(content) = text_field(value, "content") {
                return ServerEvent::AssistantContent(content);
            }
        }

        match value.get("type").and_then(Value::as_str) {
            Some("text") | Some("content") => ServerEvent::Text(
                text_field(value, "content")
                    .or_else(|| text_field(value, "text"))
                    .unwrap_or_default(),
            ),
            Some("tool_call") => ServerEvent::ToolCall(
                text_field(value, "tool_name")
                    .or_else(|| text_field(value, "name"))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            ),
            Some("tool_result") => ServerEvent::ToolResult(
                text_field(value, "content")
                    .or_else(|| text_field(value, "result"))
                    .unwrap_or_default(),
            ),
            Some("error") => {
                ServerEvent::Error(text_field(value, "message").unwrap_or_default())
            }
            _ => ServerEvent::Ignored,
        }
    }

    /// Text to append to the open assistant message, if any
    pub fn fragment(&self) -> Option<String> {
        match self {
            ServerEvent::AssistantContent(text) | ServerEvent::Text(text) => Some(text.clone()),
            ServerEvent::ToolCall(name) => Some(format!("\n\nTool Call: {}\n", name)),
            ServerEvent::ToolResult(result) => Some(format!("Result: {}\n\n", result)),
            ServerEvent::Error(message) => Some(format!("Error: {}\n", message)),
            ServerEvent::Ignored => None,
        }
    }
}

/// Non-empty textual value of `key`. Numbers and `true` are rendered; empty
/// strings, `false`, `null` and containers count as missing.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
