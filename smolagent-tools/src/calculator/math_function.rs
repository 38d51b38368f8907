use super::number_argument;
use crate::expr::Number;
use crate::tool::{decode_arguments, Arguments, Tool};
use serde::Deserialize;
use serde_json::Value;
use smolagent_error::{Error, Result};

/// Names accepted by `math_function`
pub const MATH_FUNCTIONS: &[&str] = &[
    "sqrt", "sin", "cos", "tan", "log", "log10", "exp", "floor", "ceil", "factorial", "degrees",
    "radians", "abs",
];

/// Largest n with n! representable as i64
const MAX_FACTORIAL: i64 = 20;

/// Applies one named math function to a single number
#[derive(Debug, Clone, Copy, Default)]
pub struct MathFunctionTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MathFunctionArgs {
    function: String,
    value: Value,
}

impl Tool for MathFunctionTool {
    fn name(&self) -> &str {
        "math_function"
    }

    fn description(&self) -> &str {
        "Applies a mathematical function to a number. \
         Available functions: sqrt, sin, cos, tan, log, log10, exp, \
         floor, ceil, factorial, degrees, radians, abs. \
         Example: math_function(function='sqrt', value=16)"
    }

    fn execute(&self, arguments: &Arguments) -> Result<Value> {
        let args: MathFunctionArgs = decode_arguments(self.name(), arguments)?;

        if !MATH_FUNCTIONS.contains(&args.function.as_str()) {
            return Err(Error::tool_failed(
                self.name(),
                format!(
                    "Unknown function: {}. Available: {}",
                    args.function,
                    MATH_FUNCTIONS.join(", ")
                ),
            ));
        }

        let value = number_argument(&args.value).ok_or_else(|| {
            Error::invalid_argument(format!(
                "invalid arguments for math_function: value must be a number, got {}",
                args.value
            ))
            .with_context("tool", self.name())
        })?;

        let result = apply(&args.function, value)
            .and_then(|n| n.to_json().map_err(|_| "math range error".to_string()))
            .map_err(|reason| {
                Error::tool_failed(
                    self.name(),
                    format!("Error applying {} to {}: {}", args.function, value, reason),
                )
            })?;

        tracing::debug!(function = %args.function, %value, %result, "applied math function");
        Ok(result)
    }
}

fn apply(function: &str, value: Number) -> std::result::Result<Number, String> {
    let x = value.as_f64();
    let float = |f: f64| {
        if f.is_finite() {
            Ok(Number::Float(f))
        } else {
            Err("math range error".to_string())
        }
    };
    let domain = || Err("math domain error".to_string());

    match function {
        "sqrt" if x < 0.0 => domain(),
        "sqrt" => float(x.sqrt()),
        "sin" => float(x.sin()),
        "cos" => float(x.cos()),
        "tan" => float(x.tan()),
        "log" | "log10" if x <= 0.0 => domain(),
        "log" => float(x.ln()),
        "log10" => float(x.log10()),
        "exp" => float(x.exp()),
        "floor" => to_int(value, f64::floor),
        "ceil" => to_int(value, f64::ceil),
        "factorial" => factorial(value),
        "degrees" => float(x.to_degrees()),
        "radians" => float(x.to_radians()),
        "abs" => match value {
            Number::Int(i) => i
                .checked_abs()
                .map(Number::Int)
                .ok_or_else(|| "integer overflow".to_string()),
            Number::Float(f) => float(f.abs()),
        },
        other => Err(format!("unsupported function {}", other)),
    }
}

fn to_int(value: Number, round: fn(f64) -> f64) -> std::result::Result<Number, String> {
    match value {
        Number::Int(i) => Ok(Number::Int(i)),
        Number::Float(f) => {
            let r = round(f);
            if !r.is_finite() || r.abs() >= i64::MAX as f64 {
                return Err("cannot convert float to integer".to_string());
            }
            Ok(Number::Int(r as i64))
        }
    }
}

fn factorial(value: Number) -> std::result::Result<Number, String> {
    let n = match value {
        Number::Int(i) => i,
        Number::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
        Number::Float(_) => return Err("factorial() only accepts integral values".to_string()),
    };
    if n < 0 {
        return Err("factorial() not defined for negative values".to_string());
    }
    if n > MAX_FACTORIAL {
        return Err(format!("factorial() argument too large (max {})", MAX_FACTORIAL));
    }
    Ok(Number::Int((1..=n).product()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smolagent_error::ErrorKind;

    fn call(function: &str, value: Value) -> Result<Value> {
        let mut args = Arguments::new();
        args.insert("function".into(), json!(function));
        args.insert("value".into(), value);
        MathFunctionTool.execute(&args)
    }

    fn float(function: &str, value: Value) -> f64 {
        call(function, value).unwrap().as_f64().unwrap()
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(call("sqrt", json!(16)).unwrap(), json!(4.0));
        assert_eq!(call("sqrt", json!(144)).unwrap(), json!(12.0));
    }

    #[test]
    fn test_sqrt_negative() {
        let err = call("sqrt", json!(-1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolFailed);
        assert_eq!(err.message(), "Error applying sqrt to -1: math domain error");
    }

    #[test]
    fn test_trigonometry() {
        assert!(float("sin", json!(0)).abs() < 1e-12);
        assert!((float("cos", json!(0)) - 1.0).abs() < 1e-12);
        assert!((float("degrees", json!(std::f64::consts::PI)) - 180.0).abs() < 1e-9);
        assert!((float("radians", json!(180)) - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_logarithms() {
        assert!((float("log", json!(std::f64::consts::E)) - 1.0).abs() < 1e-12);
        assert_eq!(float("log10", json!(1000)), 3.0);
        assert!(call("log", json!(0)).is_err());
        assert!(call("log10", json!(-5)).is_err());
        assert!(call("exp", json!(1000)).unwrap_err().message().contains("math range error"));
    }

    #[test]
    fn test_floor_ceil() {
        assert_eq!(call("floor", json!(3.7)).unwrap(), json!(3));
        assert_eq!(call("ceil", json!(3.2)).unwrap(), json!(4));
        assert_eq!(call("floor", json!(-3.2)).unwrap(), json!(-4));
        assert_eq!(call("ceil", json!(5)).unwrap(), json!(5));
    }

    #[test]
    fn test_factorial() {
        assert_eq!(call("factorial", json!(5)).unwrap(), json!(120));
        assert_eq!(call("factorial", json!(0)).unwrap(), json!(1));
        assert_eq!(call("factorial", json!(20)).unwrap(), json!(2432902008176640000i64));
        assert_eq!(call("factorial", json!(5.0)).unwrap(), json!(120));
        assert!(call("factorial", json!(-1)).is_err());
        assert!(call("factorial", json!(2.5)).is_err());
        assert!(call("factorial", json!(21)).unwrap_err().message().contains("too large"));
    }

    #[test]
    fn test_abs() {
        assert_eq!(call("abs", json!(-7)).unwrap(), json!(7));
        assert_eq!(call("abs", json!(-2.5)).unwrap(), json!(2.5));
    }

    #[test]
    fn test_numeric_string_value() {
        assert_eq!(call("sqrt", json!("16")).unwrap(), json!(4.0));
        let err = call("sqrt", json!("sixteen")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_unknown_function() {
        let err = call("cbrt", json!(8)).unwrap_err();
        assert!(err.message().starts_with("Unknown function: cbrt. Available: sqrt, sin"));
        assert!(err.message().ends_with("radians, abs"));
    }
}
