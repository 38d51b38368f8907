//! Conversation - the message history of one run

use smolagent_llm::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Ordered, append-only message history.
///
/// Always starts with the system prompt followed by the user's task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(task)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages with the given role, in order
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(move |m| m.role == role)
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    /// Print every message to stdout
    pub fn pretty_print(&self) {
        for message in &self.messages {
            message.pretty_print();
        }
    }
}
