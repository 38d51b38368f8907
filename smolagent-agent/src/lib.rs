//! # smolagent Agent
//!
//! The agent orchestrates the model <-> tool loop:
//! 1. The caller provides a task and a set of tools
//! 2. The model is shown the tools and the task
//! 3. Each reply is parsed as a JSON action: call a tool, or give a final answer
//! 4. Tool results (or errors) go back to the model as user messages
//! 5. Repeat until a final answer or the iteration budget runs out
//!
//! ```rust,no_run
//! use smolagent_agent::Agent;
//! use smolagent_llm::{OpenAIProvider, ProviderConfig};
//! use smolagent_tools::calculator_tools;
//!
//! # async fn demo() -> smolagent_error::Result<()> {
//! let provider = OpenAIProvider::new(ProviderConfig::openrouter("sk-or-..."))
//!     .map_err(|e| e.into_error())?;
//! let agent = Agent::new(provider, calculator_tools());
//! let answer = agent.run("What is 15 * 23 + 47?", false).await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

mod action;
mod agent;
mod conversation;
mod prompt;

pub use action::{parse_action, render_value, Action};
pub use agent::{Agent, AgentConfig, RunReport};
pub use conversation::Conversation;
pub use prompt::{system_prompt, tools_description, INVALID_JSON_REPLY, NO_ACTION_REPLY};
