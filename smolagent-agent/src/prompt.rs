//! Prompt text sent to the model

use smolagent_tools::ToolRegistry;

/// Sent after a reply that is not valid JSON
pub const INVALID_JSON_REPLY: &str = "Please respond with a valid JSON object.";

/// Sent after a JSON reply naming neither a tool nor a final answer
pub const NO_ACTION_REPLY: &str = "Please specify a tool to use or provide a final_answer.";

/// One `- name: description` line per tool, in registry order
pub fn tools_description(tools: &ToolRegistry) -> String {
    tools
        .iter()
        .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt describing the available tools and the reply format
pub fn system_prompt(tools: &ToolRegistry) -> String {
    format!(
        r#"You are a helpful AI assistant that can use tools to accomplish tasks.

Available tools:
{}

To use a tool, respond with a JSON object in this format:
{{"tool": "tool_name", "arguments": {{"arg1": "value1", "arg2": "value2"}}}}

When you have completed the task, respond with:
{{"final_answer": "your answer here"}}

Always think step by step and use tools to verify your work when possible.
"#,
        tools_description(tools)
    )
}
