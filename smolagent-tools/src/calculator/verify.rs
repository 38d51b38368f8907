use super::number_argument;
use crate::expr::{self, Number};
use crate::tool::{decode_arguments, Arguments, Tool};
use serde::Deserialize;
use serde_json::Value;
use smolagent_error::{Error, Result};

/// Absolute tolerance used when either side is a float
pub const TOLERANCE: f64 = 1e-9;

/// Checks a claimed result against the value of an expression
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyCalculationTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VerifyArgs {
    expression: String,
    expected: Value,
}

impl Tool for VerifyCalculationTool {
    fn name(&self) -> &str {
        "verify_calculation"
    }

    fn description(&self) -> &str {
        "Verifies if a calculation result is correct. \
         Takes an expression and an expected result, returns True if correct. \
         Example: verify_calculation(expression='2 + 2', expected=4)"
    }

    fn execute(&self, arguments: &Arguments) -> Result<Value> {
        let args: VerifyArgs = decode_arguments(self.name(), arguments)?;
        let expected = number_argument(&args.expected).ok_or_else(|| {
            Error::invalid_argument(format!(
                "invalid arguments for verify_calculation: expected must be a number, got {}",
                args.expected
            ))
            .with_context("tool", self.name())
        })?;

        let verdict = match expr::evaluate(&args.expression) {
            Ok(actual) => matches(actual, expected),
            Err(e) => {
                tracing::debug!(expression = %args.expression, error = %e, "verification expression failed");
                false
            }
        };
        Ok(Value::Bool(verdict))
    }
}

fn matches(actual: Number, expected: Number) -> bool {
    match (actual, expected) {
        (Number::Int(a), Number::Int(b)) => a == b,
        (a, b) => (a.as_f64() - b.as_f64()).abs() < TOLERANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smolagent_error::ErrorKind;

    fn verify(expression: &str, expected: Value) -> bool {
        let mut args = Arguments::new();
        args.insert("expression".into(), json!(expression));
        args.insert("expected".into(), expected);
        VerifyCalculationTool.execute(&args).unwrap().as_bool().unwrap()
    }

    #[test]
    fn test_correct_calculation() {
        assert!(verify("2 + 2", json!(4)));
        assert!(verify("25 * 4", json!(100)));
        assert!(verify("10 / 2", json!(5)));
    }

    #[test]
    fn test_incorrect_calculation() {
        assert!(!verify("2 + 2", json!(5)));
        assert!(!verify("25 * 4", json!(99)));
    }

    #[test]
    fn test_floating_point_tolerance() {
        assert!(verify("1 / 3 * 3", json!(1.0)));
        assert!(verify("0.1 + 0.2", json!(0.3)));
        assert!(!verify("0.1 + 0.2", json!(0.31)));
    }

    #[test]
    fn test_invalid_expression_is_false() {
        assert!(!verify("invalid", json!(5)));
        assert!(!verify("1 / 0", json!(0)));
        assert!(!verify(&vec!["2"; 50_000].join("*"), json!(0)));
    }

    #[test]
    fn test_expected_must_be_numeric() {
        let mut args = Arguments::new();
        args.insert("expression".into(), json!("2 + 2"));
        args.insert("expected".into(), json!([4]));
        let err = VerifyCalculationTool.execute(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let mut args = Arguments::new();
        args.insert("expression".into(), json!("2 + 2"));
        let err = VerifyCalculationTool.execute(&args).unwrap_err();
        assert!(err.message().contains("missing field `expected`"));
    }
}
