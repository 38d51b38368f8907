//! Scripted provider - replays canned replies without any network access
//!
//! Used by the offline demo and by tests that need to drive the agent loop
//! through an exact sequence of model replies.

use super::*;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// A provider that answers from a queue of prepared replies.
///
/// Every request is recorded so callers can inspect what the agent sent.
/// Once the queue is empty the provider answers with the repeating reply if
/// one was configured, otherwise it fails.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Result<String, ProviderError>>>,
    repeat: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
    model: String,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
            model: "scripted".to_string(),
        }
    }

    /// A provider that gives the same reply forever
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self::new(Vec::<String>::new()).with_repeat(reply)
    }

    /// Reply used once the scripted queue runs dry
    pub fn with_repeat(mut self, reply: impl Into<String>) -> Self {
        self.repeat = Some(reply.into());
        self
    }

    /// Queue a failure after the replies queued so far
    pub fn with_error(self, error: ProviderError) -> Self {
        lock(&self.steps).push_back(Err(error));
        self
    }

    /// Queue another reply
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        lock(&self.steps).push_back(Ok(reply.into()));
        self
    }

    /// Number of completion requests received so far
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Copies of every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let call = {
            let mut requests = lock(&self.requests);
            requests.push(request);
            requests.len()
        };

        let step = lock(&self.steps).pop_front();
        let content = match step {
            Some(step) => step?,
            None => self.repeat.clone().ok_or_else(|| {
                ProviderError::Other(format!("scripted provider has no reply for call {}", call))
            })?,
        };

        Ok(CompletionResponse {
            id: format!("scripted-{}", call),
            model: self.model.clone(),
            content: Some(content),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}
