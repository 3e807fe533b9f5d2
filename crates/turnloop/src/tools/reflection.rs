//! Error text for failed tool calls.
//!
//! A failed call is reported back to the model instead of aborting the run,
//! so the message names what went wrong and suggests how to recover.

use crate::error::ToolError;

/// Format a tool failure for the model: the error followed by a recovery hint.
pub fn format_tool_failure(tool_name: &str, error: &ToolError) -> String {
    let mut msg = format!("Error from tool '{tool_name}': {error}");
    if let Some(hint) = recovery_hint(error) {
        msg.push_str("\nRecovery: ");
        msg.push_str(hint);
    }
    msg
}

fn recovery_hint(error: &ToolError) -> Option<&'static str> {
    match error {
        ToolError::UnknownTool { .. } => {
            Some("call one of the available tools by its exact name.")
        }
        ToolError::InvalidArguments { .. } => Some(
            "send a JSON object whose field names and types match the tool's parameter schema.",
        ),
        ToolError::NonFinite { .. } => {
            Some("the operation is undefined for these operands; do not retry it unchanged.")
        }
        ToolError::Timeout { .. } => {
            Some("the operation took too long. Try smaller input or different arguments.")
        }
        ToolError::Execution(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unknown_tool_suggests_available_names() {
        let err = ToolError::UnknownTool {
            name: "multiply2".into(),
            available: "add, sub, mul, div".into(),
        };
        let text = format_tool_failure("multiply2", &err);
        assert!(text.starts_with("Error from tool 'multiply2'"));
        assert!(text.contains("add, sub, mul, div"));
        assert!(text.contains("exact name"));
    }

    #[test]
    fn execution_error_has_no_hint() {
        let text = format_tool_failure("search", &ToolError::execution("HTTP 503"));
        assert_eq!(text, "Error from tool 'search': HTTP 503");
    }

    #[test]
    fn timeout_hint() {
        let err = ToolError::Timeout {
            tool: "search".into(),
            limit: Duration::from_secs(3),
        };
        assert!(format_tool_failure("search", &err).contains("took too long"));
    }
}
