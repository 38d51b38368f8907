//! # smolagent LLM
//!
//! Chat types and the provider abstraction the agent talks to.
//!
//! - **ChatMessage / Role**: one (role, content) entry of a conversation
//! - **LlmProvider**: conversation in, completion out
//! - **OpenAIProvider**: OpenAI-compatible HTTP backend, OpenRouter by default
//! - **ScriptedProvider**: canned replies for offline runs and tests

pub mod provider;

pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, ScriptedProvider, Usage,
    UsageTracker, OPENAI_BASE_URL, OPENROUTER_BASE_URL, OPENROUTER_DEFAULT_MODEL,
};
