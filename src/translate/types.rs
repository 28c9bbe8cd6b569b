//! Wire shapes for both sides of the proxy.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    /// Legacy alias for [`Role::Tool`].
    Function,
}

impl Role {
    /// Collapse the legacy `function` role onto `tool`.
    pub fn normalized(self) -> Self {
        match self {
            Role::Function => Role::Tool,
            other => other,
        }
    }
}

/// A tool invocation emitted by the assistant.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolCall {
    /// Opaque; absent stays absent.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,

    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,

    /// Name and arguments, copied verbatim.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub function: Value,
}

pub(crate) fn function_kind() -> String {
    "function".to_string()
}

/// One entry of `messages`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,

    /// Text or null. Other JSON shapes are carried verbatim. `None` when the
    /// client left the field out; an explicit null is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// `name`, `tool_call_id` and anything else the client sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// `tool_choice` as sent by the client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ToolChoice {
    Mode(String),
    Named(NamedToolChoice),
    Other(Value),
}

/// Object form of `tool_choice`, e.g. `{"type":"function","function":{...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NamedToolChoice {
    /// Any JSON value; only the string `"function"` is meaningful.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Downstream (OpenAI-style) chat completion request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatRequest {
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,

    /// Legacy function declarations. Only a non-empty array is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// temperature, max_tokens, and any other field, opaque to translation.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tool entry synthesised from a legacy function declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: Value,
}

impl NamedToolChoice {
    pub fn names_function(&self) -> bool {
        self.kind.as_ref().and_then(Value::as_str) == Some("function")
    }
}

impl Tool {
    pub fn function(schema: Value) -> Self {
        Self {
            kind: "function",
            function: schema,
        }
    }
}

/// `tools` as sent upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamTools {
    /// Built from the legacy `functions` list.
    Synthesized(Vec<Tool>),
    /// The client's own `tools` value, untouched.
    Verbatim(Value),
}

/// Request body sent to the upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamRequest {
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<UpstreamTools>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpstreamRequest {
    pub fn is_streaming(&self) -> bool {
        self.stream == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_keeps_unknown_fields() {
        let message: Message = serde_json::from_value(json!({
            "role": "tool",
            "content": "42",
            "tool_call_id": "call_1"
        }))
        .unwrap();

        assert_eq!(message.extra.get("tool_call_id"), Some(&json!("call_1")));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "tool", "content": "42", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({"role": "narrator", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn tool_choice_shapes() {
        let mode: ToolChoice = serde_json::from_value(json!("none")).unwrap();
        assert_eq!(mode, ToolChoice::Mode("none".into()));

        let named: ToolChoice =
            serde_json::from_value(json!({"type": "function", "function": {"name": "x"}})).unwrap();
        match named {
            ToolChoice::Named(choice) => assert!(choice.names_function()),
            other => panic!("expected object form, got {other:?}"),
        }

        let odd_type: ToolChoice = serde_json::from_value(json!({"type": 5})).unwrap();
        match odd_type {
            ToolChoice::Named(choice) => assert!(!choice.names_function()),
            other => panic!("expected object form, got {other:?}"),
        }

        let other: ToolChoice = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(other, ToolChoice::Other(json!(true)));
    }

    #[test]
    fn content_presence_is_preserved() {
        let absent: Message = serde_json::from_value(json!({"role": "assistant"})).unwrap();
        assert_eq!(absent.content, None);
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({"role": "assistant"}));

        let null: Message = serde_json::from_value(json!({"role": "assistant", "content": null})).unwrap();
        assert_eq!(null.content, Some(Value::Null));
        assert_eq!(
            serde_json::to_value(&null).unwrap(),
            json!({"role": "assistant", "content": null})
        );
    }

    #[test]
    fn tool_call_fields_are_opaque() {
        let calls: Vec<ToolCall> = serde_json::from_value(json!([
            {"type": "function", "function": {"name": "f"}},
            {"id": 7, "type": "function"}
        ]))
        .unwrap();

        assert_eq!(calls[0].id, Value::Null);
        assert_eq!(calls[1].id, json!(7));
        assert_eq!(
            serde_json::to_value(&calls).unwrap(),
            json!([
                {"type": "function", "function": {"name": "f"}},
                {"id": 7, "type": "function"}
            ])
        );
    }
}
