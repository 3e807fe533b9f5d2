//! Binary arithmetic tools: `add`, `sub`, `mul`, `div`.
//!
//! Each takes two numbers, `term1` and `term2`, and returns
//! `{"result": <number>}`. Results that are not finite (division by zero,
//! overflow to infinity, NaN) are rejected with [`ToolError::NonFinite`], so
//! `Infinity` or `NaN` never reach the transcript.

use crate::ToolDef;
use crate::error::ToolError;
use crate::tools::core::{Tool, ToolFuture, ToolSet, parse_tool_args};
use serde::Deserialize;
use serde_json::json;

/// Largest integer magnitude an `f64` represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 4] = [
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::Mul,
        ArithmeticOp::Div,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Mul => "mul",
            ArithmeticOp::Div => "div",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "Add two numbers: term1 + term2.",
            ArithmeticOp::Sub => "Subtract the second number from the first: term1 - term2.",
            ArithmeticOp::Mul => "Multiply two numbers: term1 * term2.",
            ArithmeticOp::Div => "Divide the first number by the second: term1 / term2.",
        }
    }

    /// Apply the operation, rejecting non-finite results.
    pub fn apply(self, term1: f64, term2: f64) -> Result<f64, ToolError> {
        let value = match self {
            ArithmeticOp::Add => term1 + term2,
            ArithmeticOp::Sub => term1 - term2,
            ArithmeticOp::Mul => term1 * term2,
            ArithmeticOp::Div => term1 / term2,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ToolError::NonFinite {
                operation: format!("{}({term1}, {term2})", self.name()),
                value,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArithmeticArgs {
    term1: f64,
    term2: f64,
}

/// One arithmetic operation exposed as a tool.
#[derive(Debug, Clone, Copy)]
pub struct Arithmetic {
    op: ArithmeticOp,
}

impl Arithmetic {
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }
}

impl Tool for Arithmetic {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            self.op.name(),
            self.op.description(),
            json!({
                "type": "object",
                "properties": {
                    "term1": { "type": "number", "description": "The first operand." },
                    "term2": { "type": "number", "description": "The second operand." }
                },
                "required": ["term1", "term2"],
                "additionalProperties": false
            }),
        )
        .strict()
    }

    fn execute(&self, arguments: serde_json::Value) -> ToolFuture<'_> {
        let op = self.op;
        Box::pin(async move {
            let args: ArithmeticArgs = parse_tool_args(op.name(), arguments)?;
            let value = op.apply(args.term1, args.term2)?;
            Ok(json!({ "result": number_value(value) }))
        })
    }
}

/// Integral results serialize without a fractional part (`8`, not `8.0`).
fn number_value(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        json!(value as i64)
    } else {
        json!(value)
    }
}

impl ToolSet {
    /// Register `add`, `sub`, `mul` and `div`.
    pub fn with_arithmetic_tools(self) -> Self {
        ArithmeticOp::ALL
            .into_iter()
            .fold(self, |set, op| set.with(Arithmetic::new(op)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{ToolCallRequest, ToolResultContent};

    #[test]
    fn apply_basic_operations() {
        assert_eq!(ArithmeticOp::Add.apply(5.0, 3.0), Ok(8.0));
        assert_eq!(ArithmeticOp::Sub.apply(5.0, 3.0), Ok(2.0));
        assert_eq!(ArithmeticOp::Mul.apply(2.5, 4.0), Ok(10.0));
        assert_eq!(ArithmeticOp::Div.apply(7.0, 2.0), Ok(3.5));
    }

    #[test]
    fn division_by_zero_is_rejected() {
        let err = ArithmeticOp::Div.apply(10.0, 0.0).unwrap_err();
        assert!(matches!(err, ToolError::NonFinite { .. }));
        assert!(ArithmeticOp::Div.apply(0.0, 0.0).is_err());
        assert!(ArithmeticOp::Mul.apply(f64::MAX, 2.0).is_err());
    }

    #[test]
    fn integral_results_have_no_fraction() {
        assert_eq!(number_value(8.0).to_string(), "8");
        assert_eq!(number_value(3.5).to_string(), "3.5");
        assert_eq!(number_value(-2.0).to_string(), "-2");
    }

    #[test]
    fn registers_four_strict_tools() {
        let set = ToolSet::new().with_arithmetic_tools();
        let defs = set.definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["add", "sub", "mul", "div"]);
        assert!(defs.iter().all(|d| d.strict));
        assert!(set.validate().is_ok());
    }

    #[tokio::test]
    async fn add_returns_result_object() {
        let set = ToolSet::new().with_arithmetic_tools();
        let call = ToolCallRequest::new("c1", "add", r#"{"term1": 5, "term2": 3}"#);
        assert_eq!(
            set.execute(&call).await,
            ToolResultContent::Output(r#"{"result":8}"#.into())
        );
    }

    #[tokio::test]
    async fn div_by_zero_is_error_result_without_infinity() {
        let set = ToolSet::new().with_arithmetic_tools();
        let call = ToolCallRequest::new("c1", "div", r#"{"term1": 10, "term2": 0}"#);
        let content = set.execute(&call).await;
        assert!(content.is_error());
        let wire = content.to_wire();
        assert!(!wire.contains("Infinity"));
        assert!(!wire.contains("NaN"));
    }

    #[tokio::test]
    async fn extra_fields_fail_validation() {
        let set = ToolSet::new().with_arithmetic_tools();
        let call = ToolCallRequest::new("c1", "mul", r#"{"term1": 1, "term2": 2, "term3": 3}"#);
        let err = set.try_execute(&call, None).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
