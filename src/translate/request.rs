//! Downstream request decoding and upstream request assembly.

use serde_json::{Map, Value};

use super::messages::translate_messages;
use super::tools::{translate_tool_choice, translate_tools};
use super::types::{ChatRequest, ToolChoice, UpstreamRequest};
use crate::error::ProxyError;

/// Parse raw body bytes into a JSON object.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ProxyError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ProxyError::InvalidRequest(format!("Request body is not valid JSON: {e}")))?;

    match value {
        Value::Object(object) => Ok(object),
        _ => Err(ProxyError::InvalidRequest(
            "Request body must be a JSON object.".to_string(),
        )),
    }
}

/// Check the requested model against the single public model id.
pub fn validate_model(model: Option<&Value>, public_model: &str) -> Result<(), ProxyError> {
    match model {
        None | Some(Value::Null) => Err(ProxyError::InvalidRequest(
            "Missing required field `model`.".to_string(),
        )),
        Some(Value::String(model)) if model == public_model => Ok(()),
        Some(Value::String(model)) => Err(ProxyError::UnsupportedModel(model.clone())),
        Some(_) => Err(ProxyError::InvalidRequest(
            "Field `model` must be a string.".to_string(),
        )),
    }
}

/// Decode a validated body object into the typed request.
pub fn decode_chat_request(body: Map<String, Value>) -> Result<ChatRequest, ProxyError> {
    let request: ChatRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| ProxyError::InvalidRequest(format!("Invalid chat completion request: {e}")))?;

    if request.messages.is_none() {
        return Err(ProxyError::InvalidRequest(
            "Missing required field `messages`.".to_string(),
        ));
    }
    Ok(request)
}

/// Shallow-merge the downstream request into the upstream shape.
///
/// `model` is always replaced; `messages`, `tools` and `tool_choice` are
/// replaced only when a translation exists. Everything else passes through.
pub fn build_upstream_request(request: ChatRequest, upstream_model: &str) -> UpstreamRequest {
    let messages = request.messages.as_deref().map(translate_messages);
    let tools = translate_tools(&request);
    let tool_choice = request.tool_choice.as_ref().map(|choice| {
        translate_tool_choice(choice)
            .map(Value::String)
            .unwrap_or_else(|| choice_value(choice))
    });

    UpstreamRequest {
        model: upstream_model.to_string(),
        messages,
        tools,
        functions: request.functions,
        tool_choice,
        stream: request.stream,
        extra: request.extra,
    }
}

fn choice_value(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Mode(mode) => Value::String(mode.clone()),
        ToolChoice::Named(named) => {
            let mut object = named.rest.clone();
            if let Some(kind) = &named.kind {
                object.insert("type".to_string(), kind.clone());
            }
            Value::Object(object)
        }
        ToolChoice::Other(value) => value.clone(),
    }
}
