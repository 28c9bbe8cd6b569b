//! Message list translation.

use super::types::{function_kind, Message, ToolCall};

/// Map downstream messages onto the upstream message shape.
///
/// Role `function` becomes `tool`; every tool call is re-tagged as a
/// `function` call with its descriptor copied verbatim. A message without
/// `tool_calls` keeps the field absent. Applying this twice is a no-op.
pub fn translate_messages(messages: &[Message]) -> Vec<Message> {
    messages.iter().map(translate_message).collect()
}

fn translate_message(message: &Message) -> Message {
    Message {
        role: message.role.normalized(),
        content: message.content.clone(),
        tool_calls: message
            .tool_calls
            .as_ref()
            .map(|calls| calls.iter().map(translate_tool_call).collect()),
        extra: message.extra.clone(),
    }
}

fn translate_tool_call(call: &ToolCall) -> ToolCall {
    ToolCall {
        id: call.id.clone(),
        kind: function_kind(),
        function: call.function.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::types::Role;
    use serde_json::{json, Value};

    fn messages(value: Value) -> Vec<Message> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn function_role_becomes_tool() {
        let translated = translate_messages(&messages(json!([
            {"role": "function", "name": "lookup", "content": "sunny"},
            {"role": "tool", "tool_call_id": "call_1", "content": "42"}
        ])));

        assert_eq!(translated[0].role, Role::Tool);
        assert_eq!(translated[1].role, Role::Tool);
        assert_eq!(translated[0].extra.get("name"), Some(&json!("lookup")));
    }

    #[test]
    fn tool_calls_are_retagged_and_copied() {
        let translated = translate_messages(&messages(json!([{
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {"id": "call_1", "function": {"name": "f", "arguments": "{\"a\":1}"}},
                {"id": "call_2", "type": "custom", "function": {"name": "g", "arguments": "{}"}}
            ]
        }])));

        let value = serde_json::to_value(&translated).unwrap();
        assert_eq!(
            value,
            json!([{
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {"id": "call_1", "type": "function", "function": {"name": "f", "arguments": "{\"a\":1}"}},
                    {"id": "call_2", "type": "function", "function": {"name": "g", "arguments": "{}"}}
                ]
            }])
        );
    }

    #[test]
    fn absent_tool_calls_stay_absent() {
        let translated = translate_messages(&messages(json!([{"role": "user", "content": "hi"}])));
        let value = serde_json::to_value(&translated).unwrap();

        assert_eq!(value, json!([{"role": "user", "content": "hi"}]));
        assert!(value[0].get("tool_calls").is_none());
    }

    #[test]
    fn translation_is_idempotent() {
        let input = messages(json!([
            {"role": "system", "content": "be brief"},
            {"role": "function", "name": "f", "content": "x"},
            {"role": "assistant", "content": null, "tool_calls": [{"id": "c", "function": {"name": "f"}}]}
        ]));

        let once = translate_messages(&input);
        let twice = translate_messages(&once);
        assert_eq!(once, twice);
    }
}
