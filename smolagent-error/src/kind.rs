//! Error kinds for smolagent operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to tell conditions the agent loop recovers
/// from (malformed actions, unknown tools, tool failures) apart from the
/// ones that end a run (budget exhaustion, backend failures).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Agent loop errors
    // =========================================================================
    /// Assistant text did not decode to an action
    MalformedAction,

    /// The requested tool is not registered
    UnknownTool,

    /// Iteration budget exhausted without a final answer
    BudgetExceeded,

    // =========================================================================
    // Tool errors
    // =========================================================================
    /// A tool failed while executing
    ToolFailed,

    /// Invalid argument passed to a tool or function
    InvalidArgument,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed (non-success response, bad payload)
    InferenceFailed,

    /// Rate limit exceeded
    RateLimited,

    /// The backend rejected our credentials
    AuthenticationFailed,

    /// Network error or timeout talking to the backend
    NetworkFailed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// A backend response body could not be decoded
    ParseFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            // Agent loop
            ErrorKind::MalformedAction => "MalformedAction",
            ErrorKind::UnknownTool => "UnknownTool",
            ErrorKind::BudgetExceeded => "BudgetExceeded",

            // Tool
            ErrorKind::ToolFailed => "ToolFailed",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Inference
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",

            // Parse
            ErrorKind::ParseFailed => "ParseFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed | ErrorKind::NetworkFailed | ErrorKind::RateLimited
        )
    }

    /// Whether the agent loop turns this condition into an observation
    /// instead of aborting the run.
    pub fn is_recoverable_in_loop(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedAction
                | ErrorKind::UnknownTool
                | ErrorKind::ToolFailed
                | ErrorKind::InvalidArgument
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::UnknownTool.to_string(), "UnknownTool");
        assert_eq!(ErrorKind::BudgetExceeded.to_string(), "BudgetExceeded");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::BudgetExceeded.is_retryable());
        assert!(!ErrorKind::ToolFailed.is_retryable());
    }

    #[test]
    fn test_recoverable_in_loop() {
        assert!(ErrorKind::MalformedAction.is_recoverable_in_loop());
        assert!(ErrorKind::ToolFailed.is_recoverable_in_loop());
        assert!(!ErrorKind::BudgetExceeded.is_recoverable_in_loop());
        assert!(!ErrorKind::NetworkFailed.is_recoverable_in_loop());
    }
}
