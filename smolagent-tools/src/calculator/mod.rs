//! Calculator tools
//!
//! - **calculator**: evaluate an arithmetic expression
//! - **math_function**: apply a named function (sqrt, log, factorial, ...) to a number
//! - **verify_calculation**: check a claimed result against an expression

mod arithmetic;
mod math_function;
mod verify;

pub use arithmetic::CalculatorTool;
pub use math_function::{MathFunctionTool, MATH_FUNCTIONS};
pub use verify::{VerifyCalculationTool, TOLERANCE};

use crate::tool::{Tool, ToolRegistry};
use crate::expr::Number;
use serde_json::Value;

/// All three calculator tools, in prompt order
pub fn calculator_tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(CalculatorTool),
        Box::new(MathFunctionTool),
        Box::new(VerifyCalculationTool),
    ]
}

/// Registry holding `calculator_tools()`
pub fn calculator_registry() -> ToolRegistry {
    calculator_tools().into_iter().collect()
}

/// Accept a JSON number, or a string holding one
fn number_argument(value: &Value) -> Option<Number> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::Int)
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Number::Float))
        }
        other => Number::from_json(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_calculator_tools_order() {
        let registry = calculator_registry();
        assert_eq!(
            registry.names(),
            vec!["calculator", "math_function", "verify_calculation"]
        );
    }

    #[test]
    fn test_number_argument() {
        assert_eq!(number_argument(&json!(16)), Some(Number::Int(16)));
        assert_eq!(number_argument(&json!(2.5)), Some(Number::Float(2.5)));
        assert_eq!(number_argument(&json!(" 16 ")), Some(Number::Int(16)));
        assert_eq!(number_argument(&json!("0.5")), Some(Number::Float(0.5)));
        assert_eq!(number_argument(&json!("sixteen")), None);
        assert_eq!(number_argument(&json!(true)), None);
        assert_eq!(number_argument(&json!(null)), None);
    }
}
