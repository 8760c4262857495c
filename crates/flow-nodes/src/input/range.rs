//! Range source
//!
//! Pushes an inclusive integer range as an array, plus its length.

use std::collections::HashMap;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::{json, Value};

use crate::values::take_i64;

/// Inclusive range `start..=stop` in steps of `step`
pub struct RangeSource;

impl RangeSource {
    pub const KEY: &'static str = "range-source";
    pub const PORT_START: &'static str = "start";
    pub const PORT_STEP: &'static str = "step";
    pub const PORT_STOP: &'static str = "stop";
    pub const PORT_ARRAY: &'static str = "array";
    pub const PORT_LENGTH: &'static str = "length";

    const NAME: &'static str = "Range out";

    pub fn node() -> Node {
        Node::new(Self::NAME, RangeSource)
            .with_input(Self::PORT_START, Some(json!(1)))
            .with_input(Self::PORT_STEP, Some(json!(1)))
            .with_input(Self::PORT_STOP, Some(json!(10)))
            .with_output(Self::PORT_ARRAY, Some(PortDataType::List))
            .with_output(Self::PORT_LENGTH, Some(PortDataType::Int))
    }
}

fn inclusive_range(start: i64, step: i64, stop: i64) -> Vec<i64> {
    let mut values = Vec::new();
    let mut current = start;
    while (step > 0 && current <= stop) || (step < 0 && current >= stop) {
        values.push(current);
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    values
}

impl NodeProcessor for RangeSource {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let start = take_i64(&mut inputs, Self::NAME, Self::PORT_START)?;
        let step = take_i64(&mut inputs, Self::NAME, Self::PORT_STEP)?;
        let stop = take_i64(&mut inputs, Self::NAME, Self::PORT_STOP)?;
        if step == 0 {
            return Err(FlowError::failed(format!("{}: step must not be zero", Self::NAME)));
        }

        let values = inclusive_range(start, step, stop);
        let length = values.len();
        outputs.push(Self::PORT_ARRAY, values)?;
        outputs.push(Self::PORT_LENGTH, length)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: RangeSource::KEY,
    factory: RangeSource::node,
});

#[cfg(test)]
mod tests {
    use super::*;
    use flow_engine::Graph;

    #[test]
    fn test_inclusive_range() {
        assert_eq!(inclusive_range(1, 1, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(inclusive_range(0, 3, 10), vec![0, 3, 6, 9]);
        assert_eq!(inclusive_range(5, -2, 0), vec![5, 3, 1]);
        assert!(inclusive_range(5, 1, 0).is_empty());
    }

    #[test]
    fn test_default_range() {
        let mut graph = Graph::new();
        graph.add_node(RangeSource::node());
        let report = graph.process().unwrap();
        assert_eq!(
            report.result("Range out", "array"),
            Some(&json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]))
        );
        assert_eq!(report.result("Range out", "length"), Some(&json!(10)));
    }

    #[test]
    fn test_zero_step_fails() {
        let mut graph = Graph::new();
        graph.add_node(RangeSource::node());
        let step = graph.input_ref("Range out", "step").unwrap();
        graph.set_default(step, Some(json!(0))).unwrap();
        assert!(graph.process().is_err());
    }
}
