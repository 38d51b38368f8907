use crate::expr;
use crate::tool::{decode_arguments, Arguments, Tool};
use serde::Deserialize;
use serde_json::Value;
use smolagent_error::Result;

/// Evaluates arithmetic expressions with [`expr::evaluate`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CalculatorArgs {
    expression: String,
}

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluates a mathematical expression and returns the result. \
         Supports basic operations (+, -, *, /, **), parentheses, and numbers. \
         Example: calculator(expression='2 + 2 * 3')"
    }

    fn execute(&self, arguments: &Arguments) -> Result<Value> {
        let args: CalculatorArgs = decode_arguments(self.name(), arguments)?;
        let result = expr::evaluate(&args.expression)
            .map_err(|e| e.with_operation("calculator::execute"))?;
        tracing::debug!(expression = %args.expression, %result, "evaluated expression");
        result.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smolagent_error::ErrorKind;

    fn calc(expression: &str) -> Result<Value> {
        let mut args = Arguments::new();
        args.insert("expression".into(), json!(expression));
        CalculatorTool.execute(&args)
    }

    #[test]
    fn test_description() {
        assert!(!CalculatorTool.description().is_empty());
        assert!(CalculatorTool.description().to_lowercase().contains("expression"));
    }

    #[test]
    fn test_basic_operations() {
        assert_eq!(calc("2 + 2").unwrap(), json!(4));
        assert_eq!(calc("10 - 3").unwrap(), json!(7));
        assert_eq!(calc("5 * 4").unwrap(), json!(20));
        assert_eq!(calc("15 / 3").unwrap(), json!(5.0));
        assert_eq!(calc("2 ** 3").unwrap(), json!(8));
    }

    #[test]
    fn test_complex_expression() {
        assert_eq!(calc("(10 - 2) / 4").unwrap(), json!(2.0));
        assert_eq!(calc("2 + 2 * 3").unwrap(), json!(8));
        assert_eq!(calc("round(10 / 3, 2)").unwrap(), json!(3.33));
    }

    #[test]
    fn test_invalid_expression() {
        let err = calc("import os").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().starts_with("Invalid expression:"));

        let err = calc("2 +").unwrap_err();
        assert!(err.message().starts_with("Invalid expression:"));
    }

    #[test]
    fn test_long_operator_chain_fails_cleanly() {
        let err = calc(&vec!["1"; 200_000].join("+")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("too many operators"));
    }

    #[test]
    fn test_missing_argument() {
        let err = CalculatorTool.execute(&Arguments::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("expression"));
    }
}
