//! String utilities

use std::collections::HashMap;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::{json, Value};

use crate::values::{take, take_string};

/// Splits a string by a delimiter and pushes every part
pub struct StrSplit;

impl StrSplit {
    pub const KEY: &'static str = "str-split";
    const NAME: &'static str = "String split";

    pub fn node() -> Node {
        Node::new(Self::NAME, StrSplit)
            .with_typed_input("string", None, PortDataType::Str)
            .with_input("delimiter", Some(json!(",")))
            .with_output("parts", Some(PortDataType::Str))
    }
}

impl NodeProcessor for StrSplit {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let string = take_string(&mut inputs, Self::NAME, "string")?;
        let delimiter = take_string(&mut inputs, Self::NAME, "delimiter")?;
        if delimiter.is_empty() {
            return Err(FlowError::failed(format!("{}: empty delimiter", Self::NAME)));
        }
        for part in string.split(delimiter.as_str()) {
            outputs.push("parts", part)?;
        }
        Ok(())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: StrSplit::KEY,
    factory: StrSplit::node,
});

/// Replaces every occurrence of a pattern
pub struct StrReplace;

impl StrReplace {
    pub const KEY: &'static str = "str-replace";
    const NAME: &'static str = "String replace";

    pub fn node() -> Node {
        Node::new(Self::NAME, StrReplace)
            .with_typed_input("string", None, PortDataType::Str)
            .with_input("find", Some(json!(";")))
            .with_input("replace", Some(json!(",")))
            .with_output("modified", Some(PortDataType::Str))
    }
}

impl NodeProcessor for StrReplace {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let string = take_string(&mut inputs, Self::NAME, "string")?;
        let find = take_string(&mut inputs, Self::NAME, "find")?;
        let replace = take_string(&mut inputs, Self::NAME, "replace")?;
        outputs.push("modified", string.replace(&find, &replace))
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: StrReplace::KEY,
    factory: StrReplace::node,
});

/// Parses a JSON formatted string
pub struct StrToDict;

impl StrToDict {
    pub const KEY: &'static str = "str-to-dict";
    const NAME: &'static str = "String to dictionary";

    pub fn node() -> Node {
        Node::new(Self::NAME, StrToDict)
            .with_typed_input("string", None, PortDataType::Str)
            .with_output("dictionary", Some(PortDataType::Dict))
    }
}

impl NodeProcessor for StrToDict {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let string = take_string(&mut inputs, Self::NAME, "string")?;
        let parsed: Value = serde_json::from_str(&string).map_err(|e| {
            let preview: String = string.chars().take(50).collect();
            FlowError::failed(format!("{} cannot convert {}... to a dictionary: {}", Self::NAME, preview, e))
        })?;
        outputs.push("dictionary", parsed)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: StrToDict::KEY,
    factory: StrToDict::node,
});

/// Formats a value as indented JSON
pub struct DictToStr;

impl DictToStr {
    pub const KEY: &'static str = "dict-to-str";
    const NAME: &'static str = "Dictionary to string";

    pub fn node() -> Node {
        Node::new(Self::NAME, DictToStr)
            .with_typed_input("dictionary", None, PortDataType::Dict)
            .with_output("string", Some(PortDataType::Str))
    }
}

impl NodeProcessor for DictToStr {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let dictionary = take(&mut inputs, Self::NAME, "dictionary")?;
        let text = serde_json::to_string_pretty(&dictionary)?;
        outputs.push("string", text)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: DictToStr::KEY,
    factory: DictToStr::node,
});

#[cfg(test)]
mod tests {
    use super::*;
    use flow_engine::Graph;

    fn run_single(node: Node, defaults: &[(&str, Value)]) -> flow_engine::Result<flow_engine::RunReport> {
        let mut graph = Graph::new();
        let id = graph.add_node(node);
        let name = graph.node(id).unwrap().name().to_string();
        for (input, value) in defaults {
            let input = graph.input_ref(&name, input).unwrap();
            graph.set_default(input, Some(value.clone())).unwrap();
        }
        graph.process()
    }

    #[test]
    fn test_split_pushes_parts_in_order() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut graph = Graph::new();
        graph.add_node(StrSplit::node());
        graph.add_node(
            Node::from_fn("Collect", move |inputs, _| {
                sink.lock().unwrap().push(inputs["part"].clone());
                Ok(())
            })
            .with_input("part", None),
        );
        let string = graph.input_ref("String split", "string").unwrap();
        graph.set_default(string, Some(json!("a,b,c"))).unwrap();
        graph
            .connect_by_name("String split", "parts", "Collect", "part")
            .unwrap();

        graph.process().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_replace() {
        let report = run_single(StrReplace::node(), &[("string", json!("a;b;c"))]).unwrap();
        assert_eq!(report.result("String replace", "modified"), Some(&json!("a,b,c")));
    }

    #[test]
    fn test_str_to_dict() {
        let report = run_single(StrToDict::node(), &[("string", json!(r#"{"k": [1, 2]}"#))]).unwrap();
        assert_eq!(
            report.result("String to dictionary", "dictionary"),
            Some(&json!({"k": [1, 2]}))
        );

        let err = run_single(StrToDict::node(), &[("string", json!("not json"))]).unwrap_err();
        assert!(err.to_string().contains("cannot convert"));
    }

    #[test]
    fn test_dict_to_str() {
        let report = run_single(DictToStr::node(), &[("dictionary", json!({"a": 1}))]).unwrap();
        assert_eq!(
            report.result("Dictionary to string", "string"),
            Some(&json!("{\n  \"a\": 1\n}"))
        );
    }
}
