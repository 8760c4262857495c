//! Array utilities

use std::cmp::Ordering;
use std::collections::HashMap;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::{json, Value};

use crate::values::{take, take_array, take_i64};

/// Collects incoming elements and releases them as one array
///
/// With `length > 0` a full array is pushed every `length` elements. With
/// `length < 1` the collection is pushed once no more elements are queued.
#[derive(Default)]
pub struct PackArray {
    collected: Vec<Value>,
}

impl PackArray {
    pub const KEY: &'static str = "pack-array";
    const NAME: &'static str = "Pack array";

    pub fn node() -> Node {
        Node::new(Self::NAME, PackArray::default())
            .with_input("elements", None)
            .with_input("length", Some(json!(0)))
            .with_output("array", Some(PortDataType::List))
    }
}

impl NodeProcessor for PackArray {
    fn prepare(&mut self) -> Result<()> {
        self.collected.clear();
        Ok(())
    }

    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let element = take(&mut inputs, Self::NAME, "elements")?;
        let length = take_i64(&mut inputs, Self::NAME, "length")?;
        self.collected.push(element);

        if length > 0 {
            if self.collected.len() as i64 >= length {
                outputs.push("array", std::mem::take(&mut self.collected))?;
            }
        } else if outputs.pending("elements") == 0 {
            outputs.push("array", self.collected.clone())?;
        }
        Ok(())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: PackArray::KEY,
    factory: PackArray::node,
});

/// Pushes every element of an array
pub struct UnpackArray;

impl UnpackArray {
    pub const KEY: &'static str = "unpack-array";
    const NAME: &'static str = "Unpack array";

    pub fn node() -> Node {
        Node::new(Self::NAME, UnpackArray)
            .with_typed_input("array", None, PortDataType::List)
            .with_output("elements", None)
    }
}

impl NodeProcessor for UnpackArray {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        for element in take_array(&mut inputs, Self::NAME, "array")? {
            outputs.push("elements", element)?;
        }
        Ok(())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: UnpackArray::KEY,
    factory: UnpackArray::node,
});

/// Element at an index; negative indices count from the end
pub struct IndexToValue;

impl IndexToValue {
    pub const KEY: &'static str = "index-to-value";
    const NAME: &'static str = "Array value";

    pub fn node() -> Node {
        Node::new(Self::NAME, IndexToValue)
            .with_typed_input("array", None, PortDataType::List)
            .with_input("index", Some(json!(-1)))
            .with_output("value", None)
    }
}

impl NodeProcessor for IndexToValue {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let mut array = take_array(&mut inputs, Self::NAME, "array")?;
        let index = take_i64(&mut inputs, Self::NAME, "index")?;
        let len = array.len() as i64;
        let position = if index < 0 { len + index } else { index };
        // Out of range pushes nothing
        if (0..len).contains(&position) {
            outputs.push("value", array.swap_remove(position as usize))?;
        }
        Ok(())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: IndexToValue::KEY,
    factory: IndexToValue::node,
});

/// Index of the first element equal to a value
pub struct ValueToIndex;

impl ValueToIndex {
    pub const KEY: &'static str = "value-to-index";
    const NAME: &'static str = "Array index";

    pub fn node() -> Node {
        Node::new(Self::NAME, ValueToIndex)
            .with_typed_input("array", None, PortDataType::List)
            .with_input("value", None)
            .with_output("index", Some(PortDataType::Int))
    }
}

impl NodeProcessor for ValueToIndex {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let array = take_array(&mut inputs, Self::NAME, "array")?;
        let value = take(&mut inputs, Self::NAME, "value")?;
        if let Some(index) = array.iter().position(|v| *v == value) {
            outputs.push("index", index)?;
        }
        Ok(())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: ValueToIndex::KEY,
    factory: ValueToIndex::node,
});

/// Order numbers numerically and strings lexically; mixed kinds are unordered
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Position of the extreme element; the first one wins on ties
fn extreme(node: &str, array: &[Value], wanted: Ordering) -> Result<usize> {
    let mut best = 0;
    if array.is_empty() {
        return Err(FlowError::failed(format!("{}: empty array", node)));
    }
    for (i, value) in array.iter().enumerate().skip(1) {
        let ordering = compare(value, &array[best]).ok_or_else(|| {
            FlowError::failed(format!("{}: cannot compare {} with {}", node, value, array[best]))
        })?;
        if ordering == wanted {
            best = i;
        }
    }
    Ok(best)
}

/// Maximum or minimum of an array, with its index
pub struct ArrayExtreme {
    wanted: Ordering,
    name: &'static str,
}

impl ArrayExtreme {
    pub const MAX_KEY: &'static str = "array-max";
    pub const MIN_KEY: &'static str = "array-min";

    fn node(wanted: Ordering, name: &'static str) -> Node {
        Node::new(name, ArrayExtreme { wanted, name })
            .with_typed_input("array", None, PortDataType::List)
            .with_output("value", None)
            .with_output("index", Some(PortDataType::Int))
    }

    pub fn max() -> Node {
        Self::node(Ordering::Greater, "Maximum in array")
    }

    pub fn min() -> Node {
        Self::node(Ordering::Less, "Minimum in array")
    }
}

impl NodeProcessor for ArrayExtreme {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let mut array = take_array(&mut inputs, self.name, "array")?;
        let index = extreme(self.name, &array, self.wanted)?;
        outputs.push("value", array.swap_remove(index))?;
        outputs.push("index", index)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: ArrayExtreme::MAX_KEY,
    factory: ArrayExtreme::max,
});

inventory::submit!(flow_engine::NodeTypeFn {
    key: ArrayExtreme::MIN_KEY,
    factory: ArrayExtreme::min,
});

pub struct ArrayLength;

impl ArrayLength {
    pub const KEY: &'static str = "array-length";
    const NAME: &'static str = "Array length";

    pub fn node() -> Node {
        Node::new(Self::NAME, ArrayLength)
            .with_typed_input("array", None, PortDataType::List)
            .with_output("length", Some(PortDataType::Int))
    }
}

impl NodeProcessor for ArrayLength {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let array = take_array(&mut inputs, Self::NAME, "array")?;
        outputs.push("length", array.len())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: ArrayLength::KEY,
    factory: ArrayLength::node,
});

/// Appends an element to an array
///
/// The default array is empty, so an unconnected `array` input starts from
/// scratch every time.
pub struct ArrayAppend;

impl ArrayAppend {
    pub const KEY: &'static str = "array-append";
    const NAME: &'static str = "Append to array";

    pub fn node() -> Node {
        Node::new(Self::NAME, ArrayAppend)
            .with_input("array", Some(json!([])))
            .with_input("data", None)
            .with_output("array", Some(PortDataType::List))
    }
}

impl NodeProcessor for ArrayAppend {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let mut array = take_array(&mut inputs, Self::NAME, "array")?;
        array.push(take(&mut inputs, Self::NAME, "data")?);
        outputs.push("array", array)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: ArrayAppend::KEY,
    factory: ArrayAppend::node,
});

/// Removes the first element equal to `data`
pub struct ArrayRemove;

impl ArrayRemove {
    pub const KEY: &'static str = "array-remove";
    const NAME: &'static str = "Remove from array";

    pub fn node() -> Node {
        Node::new(Self::NAME, ArrayRemove)
            .with_typed_input("array", None, PortDataType::List)
            .with_input("data", None)
            .with_output("array", Some(PortDataType::List))
    }
}

impl NodeProcessor for ArrayRemove {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let mut array = take_array(&mut inputs, Self::NAME, "array")?;
        let data = take(&mut inputs, Self::NAME, "data")?;
        let position = array
            .iter()
            .position(|v| *v == data)
            .ok_or_else(|| FlowError::failed(format!("{}: {} is not in the array", Self::NAME, data)))?;
        array.remove(position);
        outputs.push("array", array)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: ArrayRemove::KEY,
    factory: ArrayRemove::node,
});
