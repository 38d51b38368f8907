//! Action parsing - turn raw model text into what the agent should do

use serde_json::Value;
use smolagent_error::{Error, Result};
use smolagent_tools::Arguments;

/// What the model asked for in one reply
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Invoke a tool with named arguments
    ToolCall { tool: String, arguments: Arguments },
    /// The run is finished
    FinalAnswer(String),
    /// Valid JSON object naming neither a tool nor a final answer
    NoAction,
}

/// Extract an [`Action`] from model output.
///
/// The text from the first `{` to the last `}` is tried first, so prose or
/// code fences around the object are ignored. If that slice is not valid
/// JSON the whole text is tried. A reply carrying both `final_answer` and
/// `tool` is treated as a final answer.
pub fn parse_action(text: &str) -> Result<Action> {
    let value = match object_slice(text).and_then(|slice| serde_json::from_str(slice).ok()) {
        Some(value) => value,
        None => serde_json::from_str::<Value>(text.trim()).map_err(|e| {
            Error::malformed_action(format!("response is not valid JSON: {}", e))
                .with_operation("agent::parse_action")
                .set_source(e)
        })?,
    };
    interpret(value)
}

fn object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn interpret(value: Value) -> Result<Action> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(malformed(format!("expected a JSON object, got {}", type_name(&other))))
        }
    };

    match object.remove("final_answer") {
        None | Some(Value::Null) => {}
        Some(answer) => return Ok(Action::FinalAnswer(render_value(&answer))),
    }

    let tool = match object.remove("tool") {
        None | Some(Value::Null) => return Ok(Action::NoAction),
        Some(Value::String(tool)) => tool,
        Some(other) => {
            return Err(malformed(format!("\"tool\" must be a string, got {}", type_name(&other))))
        }
    };

    let arguments = match object.remove("arguments") {
        None | Some(Value::Null) => Arguments::new(),
        Some(Value::Object(arguments)) => arguments,
        Some(other) => {
            return Err(malformed(format!(
                "\"arguments\" must be an object, got {}",
                type_name(&other)
            )))
        }
    };

    Ok(Action::ToolCall { tool, arguments })
}

fn malformed(message: String) -> Error {
    Error::malformed_action(message).with_operation("agent::parse_action")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Text form of a tool result or answer value.
///
/// Strings are used verbatim; everything else is compact JSON, so numbers
/// read `8` or `5.0` and booleans read `true` or `false`.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smolagent_error::ErrorKind;

    fn tool_call(tool: &str, arguments: Value) -> Action {
        let Value::Object(arguments) = arguments else {
            panic!("arguments must be an object");
        };
        Action::ToolCall {
            tool: tool.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_parse_tool_call() {
        let action =
            parse_action(r#"{"tool": "calculator", "arguments": {"expression": "2 + 2"}}"#).unwrap();
        assert_eq!(action, tool_call("calculator", json!({"expression": "2 + 2"})));
    }

    #[test]
    fn test_parse_final_answer() {
        let action = parse_action(r#"{"final_answer": "392"}"#).unwrap();
        assert_eq!(action, Action::FinalAnswer("392".into()));
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let text = "Let me compute that.\n```json\n{\"tool\": \"calculator\", \"arguments\": {\"expression\": \"(1 + 2) * 3\"}}\n```\nDone.";
        let action = parse_action(text).unwrap();
        assert_eq!(action, tool_call("calculator", json!({"expression": "(1 + 2) * 3"})));
    }

    #[test]
    fn test_final_answer_wins() {
        let action = parse_action(r#"{"tool": "calculator", "final_answer": "done"}"#).unwrap();
        assert_eq!(action, Action::FinalAnswer("done".into()));
    }

    #[test]
    fn test_missing_arguments_default_empty() {
        assert_eq!(parse_action(r#"{"tool": "clock"}"#).unwrap(), tool_call("clock", json!({})));
        assert_eq!(
            parse_action(r#"{"tool": "clock", "arguments": null}"#).unwrap(),
            tool_call("clock", json!({}))
        );
    }

    #[test]
    fn test_no_action() {
        assert_eq!(parse_action(r#"{"thought": "hmm"}"#).unwrap(), Action::NoAction);
        assert_eq!(parse_action("{}").unwrap(), Action::NoAction);
        assert_eq!(parse_action(r#"{"final_answer": null}"#).unwrap(), Action::NoAction);
    }

    #[test]
    fn test_non_string_final_answer() {
        assert_eq!(parse_action(r#"{"final_answer": 8}"#).unwrap(), Action::FinalAnswer("8".into()));
        assert_eq!(
            parse_action(r#"{"final_answer": true}"#).unwrap(),
            Action::FinalAnswer("true".into())
        );
        assert_eq!(
            parse_action(r#"{"final_answer": {"x": 1}}"#).unwrap(),
            Action::FinalAnswer(r#"{"x":1}"#.into())
        );
    }

    #[test]
    fn test_malformed() {
        for text in [
            "The answer is 4",
            "",
            "{",
            "{not json}",
            r#"{"a": 1} and then {"b": 2}"#,
        ] {
            let err = parse_action(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedAction, "{text:?}");
        }
    }

    #[test]
    fn test_wrong_shapes() {
        assert_eq!(parse_action("[1, 2]").unwrap_err().kind(), ErrorKind::MalformedAction);
        assert_eq!(parse_action("42").unwrap_err().kind(), ErrorKind::MalformedAction);

        let err = parse_action(r#"{"tool": 7}"#).unwrap_err();
        assert!(err.message().contains("\"tool\" must be a string"));

        let err = parse_action(r#"{"tool": "calculator", "arguments": "2+2"}"#).unwrap_err();
        assert!(err.message().contains("\"arguments\" must be an object"));
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("hello")), "hello");
        assert_eq!(render_value(&json!(8)), "8");
        assert_eq!(render_value(&json!(5.0)), "5.0");
        assert_eq!(render_value(&json!(false)), "false");
        assert_eq!(render_value(&json!(null)), "null");
        assert_eq!(render_value(&json!([1, 2])), "[1,2]");
    }
}
