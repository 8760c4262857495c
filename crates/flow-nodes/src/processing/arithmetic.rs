//! Binary operations with inputs `a`, `b` and output `c`
//!
//! Integer operands stay integers (except for division) and fall back to
//! floating point on overflow. `Add` also concatenates strings and arrays.

use std::collections::HashMap;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, Result};
use serde_json::Value;

use crate::values::take;

/// The arithmetic operation a node applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn key(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "Addition",
            Self::Sub => "Subtraction",
            Self::Mul => "Multiplication",
            Self::Div => "Division",
        }
    }

    fn apply_int(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Self::Add => a.checked_add(b),
            Self::Sub => a.checked_sub(b),
            Self::Mul => a.checked_mul(b),
            Self::Div => None,
        }
    }

    fn apply_float(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }

    /// Apply the operation to two values
    pub fn apply(self, a: &Value, b: &Value) -> std::result::Result<Value, String> {
        match (self, a, b) {
            (Self::Add, Value::String(x), Value::String(y)) => return Ok(Value::String(format!("{x}{y}"))),
            (Self::Add, Value::Array(x), Value::Array(y)) => {
                return Ok(Value::Array(x.iter().chain(y).cloned().collect()));
            }
            _ => {}
        }

        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            if let Some(result) = self.apply_int(x, y) {
                return Ok(Value::from(result));
            }
        }

        match (a.as_f64(), b.as_f64()) {
            (Some(_), Some(y)) if self == Self::Div && y == 0.0 => Err("division by zero".to_string()),
            (Some(x), Some(y)) => Ok(Value::from(self.apply_float(x, y))),
            _ => Err(format!("unsupported operands {} and {}", a, b)),
        }
    }
}

/// Node applying one [`Operator`]
pub struct Operation {
    operator: Operator,
}

impl Operation {
    pub const PORT_A: &'static str = "a";
    pub const PORT_B: &'static str = "b";
    pub const PORT_C: &'static str = "c";

    pub fn node(operator: Operator) -> Node {
        Node::new(operator.label(), Operation { operator })
            .with_input(Self::PORT_A, None)
            .with_input(Self::PORT_B, None)
            .with_output(Self::PORT_C, None)
    }

    pub fn add() -> Node {
        Self::node(Operator::Add)
    }

    pub fn sub() -> Node {
        Self::node(Operator::Sub)
    }

    pub fn mul() -> Node {
        Self::node(Operator::Mul)
    }

    pub fn div() -> Node {
        Self::node(Operator::Div)
    }
}

impl NodeProcessor for Operation {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let label = self.operator.label();
        let a = take(&mut inputs, label, Self::PORT_A)?;
        let b = take(&mut inputs, label, Self::PORT_B)?;
        let c = self
            .operator
            .apply(&a, &b)
            .map_err(|e| FlowError::failed(format!("{}: {}", label, e)))?;
        outputs.push(Self::PORT_C, c)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: "add",
    factory: Operation::add,
});

inventory::submit!(flow_engine::NodeTypeFn {
    key: "sub",
    factory: Operation::sub,
});

inventory::submit!(flow_engine::NodeTypeFn {
    key: "mul",
    factory: Operation::mul,
});

inventory::submit!(flow_engine::NodeTypeFn {
    key: "div",
    factory: Operation::div,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::IntegerSource;
    use flow_engine::Graph;
    use serde_json::json;

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(Operator::Add.apply(&json!(2), &json!(3)), Ok(json!(5)));
        assert_eq!(Operator::Sub.apply(&json!(2), &json!(3)), Ok(json!(-1)));
        assert_eq!(Operator::Mul.apply(&json!(4), &json!(3)), Ok(json!(12)));
        assert_eq!(Operator::Div.apply(&json!(3), &json!(2)), Ok(json!(1.5)));
    }

    #[test]
    fn test_mixed_and_overflow_fall_back_to_float() {
        assert_eq!(Operator::Add.apply(&json!(1), &json!(0.5)), Ok(json!(1.5)));
        let big = Operator::Mul.apply(&json!(i64::MAX), &json!(2)).unwrap();
        assert!(big.is_f64());
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(Operator::Add.apply(&json!("ab"), &json!("cd")), Ok(json!("abcd")));
        assert_eq!(Operator::Add.apply(&json!([1]), &json!([2, 3])), Ok(json!([1, 2, 3])));
        assert!(Operator::Sub.apply(&json!("ab"), &json!("cd")).is_err());
    }

    #[test]
    fn test_division_by_zero() {
        assert!(Operator::Div.apply(&json!(1), &json!(0)).is_err());
    }

    #[test]
    fn test_two_sources_into_addition() {
        let mut graph = Graph::new();
        graph.add_node(IntegerSource::node());
        graph.add_node(IntegerSource::node());
        graph.add_node(Operation::add());
        let a = graph.input_ref("Int out", "value").unwrap();
        let b = graph.input_ref("Int out.1", "value").unwrap();
        graph.set_default(a, Some(json!(2))).unwrap();
        graph.set_default(b, Some(json!(3))).unwrap();
        graph.connect_by_name("Int out", "int", "Addition", "a").unwrap();
        graph.connect_by_name("Int out.1", "int", "Addition", "b").unwrap();

        let report = graph.process().unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(report.result("Addition", "c"), Some(&json!(5)));
    }
}
