//! Agent implementation - drives the model <-> tool loop

use crate::action::{parse_action, render_value, Action};
use crate::conversation::Conversation;
use crate::prompt::{self, INVALID_JSON_REPLY, NO_ACTION_REPLY};
use smolagent_error::{Error, Result};
use smolagent_llm::{ChatMessage, CompletionRequest, LlmProvider, UsageTracker};
use smolagent_tools::{Arguments, Tool, ToolRegistry};

/// Configuration for the agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Backend calls allowed per run before giving up
    pub max_iterations: usize,
    /// Model override; the provider's default when `None`
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: None,
            temperature: Some(0.7),
            max_tokens: Some(1000),
        }
    }
}

impl AgentConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub answer: String,
    /// Full message history, ending with the reply that held the answer
    pub conversation: Conversation,
    /// Backend calls made
    pub iterations: usize,
    pub usage: UsageTracker,
}

/// The agent - asks the model what to do, runs tools, feeds results back
pub struct Agent<P: LlmProvider> {
    provider: P,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl<P: LlmProvider> Agent<P> {
    /// Create an agent with default configuration
    pub fn new(provider: P, tools: impl IntoIterator<Item = Box<dyn Tool>>) -> Self {
        Self::with_config(provider, tools, AgentConfig::default())
    }

    /// Create an agent with custom configuration.
    ///
    /// Tools sharing a name replace one another; the last one wins.
    pub fn with_config(
        provider: P,
        tools: impl IntoIterator<Item = Box<dyn Tool>>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools: tools.into_iter().collect(),
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn system_prompt(&self) -> String {
        prompt::system_prompt(&self.tools)
    }

    /// Run a task to completion and return the final answer.
    ///
    /// `verbose` prints each step to stdout; it never changes behavior.
    pub async fn run(&self, task: &str, verbose: bool) -> Result<String> {
        self.run_with_report(task, verbose)
            .await
            .map(|report| report.answer)
    }

    /// Run a task to completion, keeping the conversation and usage
    pub async fn run_with_report(&self, task: &str, verbose: bool) -> Result<RunReport> {
        let mut conversation = Conversation::new(self.system_prompt(), task);
        let mut usage = UsageTracker::new();

        tracing::info!(
            provider = self.provider.name(),
            tools = self.tools.len(),
            max_iterations = self.config.max_iterations,
            "starting run"
        );

        for iteration in 1..=self.config.max_iterations {
            if verbose {
                println!("\n=== Iteration {} ===", iteration);
            }

            let reply = self.next_reply(&conversation, &mut usage).await?;
            if verbose {
                println!("Agent: {}", reply);
            }
            conversation.push(ChatMessage::assistant(reply.as_str()));

            let observation = match parse_action(&reply) {
                Ok(Action::FinalAnswer(answer)) => {
                    tracing::info!(iterations = iteration, "run finished with final answer");
                    return Ok(RunReport {
                        answer,
                        conversation,
                        iterations: iteration,
                        usage,
                    });
                }
                Ok(Action::ToolCall { tool, arguments }) => self.dispatch(&tool, &arguments, verbose),
                Ok(Action::NoAction) => {
                    tracing::debug!(iteration, "reply named neither a tool nor an answer");
                    NO_ACTION_REPLY.to_string()
                }
                Err(e) => {
                    tracing::warn!(iteration, error = %e, "could not parse action");
                    INVALID_JSON_REPLY.to_string()
                }
            };
            conversation.push(ChatMessage::user(observation));
        }

        tracing::warn!(max_iterations = self.config.max_iterations, "iteration budget exhausted");
        Err(Error::budget_exceeded(self.config.max_iterations).with_operation("agent::run"))
    }

    /// Ask the backend for the next assistant message
    async fn next_reply(
        &self,
        conversation: &Conversation,
        usage: &mut UsageTracker,
    ) -> Result<String> {
        let mut request = CompletionRequest::new(conversation.messages().to_vec());
        if let Some(model) = &self.config.model {
            request = request.with_model(model.as_str());
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(messages = conversation.len(), "requesting completion");
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| e.into_error().with_operation("agent::run"))?;
        usage.track(&response.model, &response.usage);

        Ok(response.content.unwrap_or_else(|| {
            tracing::warn!(id = %response.id, "backend reply had no content");
            String::new()
        }))
    }

    /// Execute one tool call and describe the outcome for the model
    fn dispatch(&self, name: &str, arguments: &Arguments, verbose: bool) -> String {
        let Some(tool) = self.tools.get(name) else {
            let err = Error::unknown_tool(name);
            tracing::warn!(tool = name, "model requested an unknown tool");
            if verbose {
                println!("Error: {}", err.message());
            }
            return err.message().to_string();
        };

        tracing::debug!(tool = name, ?arguments, "dispatching tool");
        let observation = match tool.execute(arguments) {
            Ok(value) => format!("Tool result: {}", render_value(&value)),
            Err(e) => {
                tracing::debug!(tool = name, kind = %e.kind(), error = %e, "tool failed");
                format!("Tool error: {}", e.message())
            }
        };
        if verbose {
            println!("{}", observation);
        }
        observation
    }
}
