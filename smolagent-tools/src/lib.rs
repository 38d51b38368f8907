//! # smolagent-tools
//!
//! Capabilities an agent can call.
//!
//! A [`Tool`] has a name, a description shown to the model, and an
//! `execute` entry point taking the model's named arguments as a JSON map.
//! Tools validate their own input and report failures as errors; they never
//! panic on bad input.
//!
//! ```rust
//! use smolagent_tools::{calculator_registry, Arguments};
//! use serde_json::json;
//!
//! let tools = calculator_registry();
//! let mut args = Arguments::new();
//! args.insert("expression".into(), json!("2 + 2 * 3"));
//!
//! let result = tools.get("calculator").unwrap().execute(&args).unwrap();
//! assert_eq!(result, json!(8));
//! ```

pub mod calculator;
pub mod expr;
pub mod tool;

pub use calculator::{
    calculator_registry, calculator_tools, CalculatorTool, MathFunctionTool,
    VerifyCalculationTool,
};
pub use expr::Number;
pub use tool::{decode_arguments, Arguments, Tool, ToolRegistry};
