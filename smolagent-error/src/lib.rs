//! # smolagent-error
//!
//! One error type for the whole workspace.
//!
//! - **ErrorKind**: what went wrong (`UnknownTool`, `BudgetExceeded`, ...)
//! - **ErrorStatus**: whether a caller may retry it
//! - **Context**: operation name plus key/value pairs for logs
//! - **Source**: the wrapped lower-level error, if any
//!
//! ```rust
//! use smolagent_error::{Error, ErrorKind};
//!
//! fn lookup(name: &str) -> smolagent_error::Result<()> {
//!     Err(Error::unknown_tool(name).with_operation("agent::dispatch"))
//! }
//!
//! let err = lookup("weather").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::UnknownTool);
//! ```
//!
//! Library functions return `Result<T, smolagent_error::Error>`. Foreign
//! errors are attached with `set_source(err)` rather than converted through
//! blanket `From` impls, so the kind is always chosen deliberately.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using smolagent Error
pub type Result<T> = std::result::Result<T, Error>;
