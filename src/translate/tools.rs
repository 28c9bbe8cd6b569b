//! Tool declarations and tool-choice translation.

use serde_json::Value;

use super::types::{ChatRequest, Tool, ToolChoice, UpstreamTools};

/// Where a request's tool declarations come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolDeclarations {
    /// Non-empty legacy `functions` list.
    Functions(Vec<Value>),
    /// Modern `tools` value.
    Tools(Value),
}

impl ToolDeclarations {
    /// Pick the declaration source. Legacy `functions` is checked first and
    /// wins whenever it is non-empty.
    pub fn resolve(request: &ChatRequest) -> Option<Self> {
        match (&request.functions, &request.tools) {
            (Some(Value::Array(functions)), _) if !functions.is_empty() => {
                Some(ToolDeclarations::Functions(functions.clone()))
            }
            (_, Some(tools)) => Some(ToolDeclarations::Tools(tools.clone())),
            _ => None,
        }
    }

    pub fn into_upstream(self) -> UpstreamTools {
        match self {
            ToolDeclarations::Functions(functions) => {
                UpstreamTools::Synthesized(functions.into_iter().map(Tool::function).collect())
            }
            ToolDeclarations::Tools(tools) => UpstreamTools::Verbatim(tools),
        }
    }
}

/// Upstream `tools` for a request, if it declares any.
pub fn translate_tools(request: &ChatRequest) -> Option<UpstreamTools> {
    ToolDeclarations::resolve(request).map(ToolDeclarations::into_upstream)
}

/// Coerce `tool_choice` to the values the upstream accepts.
///
/// Strings pass through only when they are `"auto"` or `"none"`; any other
/// string becomes `"auto"`. Objects naming a function become `"auto"`, every
/// other object becomes the empty string. Shapes that are neither have no
/// translation.
pub fn translate_tool_choice(choice: &ToolChoice) -> Option<String> {
    match choice {
        ToolChoice::Mode(mode) if mode == "auto" || mode == "none" => Some(mode.clone()),
        ToolChoice::Mode(_) => Some("auto".to_string()),
        ToolChoice::Named(named) if named.names_function() => Some("auto".to_string()),
        // An unrecognised object collapses to "", not to "auto".
        ToolChoice::Named(_) => Some(String::new()),
        ToolChoice::Other(_) => None,
    }
}
