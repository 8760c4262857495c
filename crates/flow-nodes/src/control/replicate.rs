//! Data flow control: replication, gating and delays

use std::collections::HashMap;
use std::time::Duration;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, Result};
use serde_json::{json, Value};

use crate::values::{take, take_f64, take_i64, truthy};

/// Pushes incoming data `n` times
pub struct Replicate;

impl Replicate {
    pub const KEY: &'static str = "replicate";
    const NAME: &'static str = "Replicate";

    pub fn node() -> Node {
        Node::new(Self::NAME, Replicate)
            .with_input("data", None)
            .with_input("n", Some(json!(1)))
            .with_output("replicates", None)
    }
}

impl NodeProcessor for Replicate {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let data = take(&mut inputs, Self::NAME, "data")?;
        let n = take_i64(&mut inputs, Self::NAME, "n")?;
        for _ in 0..n {
            outputs.push("replicates", data.clone())?;
        }
        Ok(())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: Replicate::KEY,
    factory: Replicate::node,
});

/// Passes data on whenever a value arrives at `trigger`
///
/// With `reuse_old_data` set, the last data value is queued again once no
/// fresh data is waiting, so every trigger releases the latest data.
pub struct Trigger;

impl Trigger {
    pub const KEY: &'static str = "trigger";
    pub const PORT_DATA: &'static str = "data";
    pub const PORT_TRIGGER: &'static str = "trigger";
    pub const PORT_REUSE: &'static str = "reuse_old_data";

    const NAME: &'static str = "Trigger";

    pub fn node() -> Node {
        Node::new(Self::NAME, Trigger)
            .with_input(Self::PORT_DATA, None)
            .with_input(Self::PORT_TRIGGER, None)
            .with_input(Self::PORT_REUSE, Some(json!(false)))
            .with_output(Self::PORT_DATA, None)
    }
}

impl NodeProcessor for Trigger {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let data = take(&mut inputs, Self::NAME, Self::PORT_DATA)?;
        let reuse = truthy(&take(&mut inputs, Self::NAME, Self::PORT_REUSE)?);
        if reuse && outputs.pending(Self::PORT_DATA) == 0 {
            outputs.requeue(Self::PORT_DATA, data.clone())?;
        }
        outputs.push(Self::PORT_DATA, data)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: Trigger::KEY,
    factory: Trigger::node,
});

/// Blocks for `sleep` seconds, then passes the data on
pub struct Pause;

impl Pause {
    pub const KEY: &'static str = "pause";
    const NAME: &'static str = "Pause";

    pub fn node() -> Node {
        Node::new(Self::NAME, Pause)
            .with_input("data", None)
            .with_input("sleep", Some(json!(1.0)))
            .with_output("data", None)
    }
}

impl NodeProcessor for Pause {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let data = take(&mut inputs, Self::NAME, "data")?;
        let seconds = take_f64(&mut inputs, Self::NAME, "sleep")?;
        let delay = Duration::try_from_secs_f64(seconds)
            .map_err(|e| FlowError::failed(format!("{}: invalid sleep {}: {}", Self::NAME, seconds, e)))?;
        std::thread::sleep(delay);
        outputs.push("data", data)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: Pause::KEY,
    factory: Pause::node,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{IntegerSource, RangeSource};
    use crate::processing::UnpackArray;
    use flow_engine::Graph;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_replicate_fans_out_in_time() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut graph = Graph::new();
        graph.add_node(Replicate::node());
        graph.add_node(
            Node::from_fn("Collect", move |inputs, _| {
                sink.lock().unwrap().push(inputs["value"].clone());
                Ok(())
            })
            .with_input("value", None),
        );
        let data = graph.input_ref("Replicate", "data").unwrap();
        let n = graph.input_ref("Replicate", "n").unwrap();
        graph.set_default(data, Some(json!("x"))).unwrap();
        graph.set_default(n, Some(json!(3))).unwrap();
        graph
            .connect_by_name("Replicate", "replicates", "Collect", "value")
            .unwrap();

        let report = graph.process().unwrap();
        // One value is consumed per iteration
        assert_eq!(report.iterations, 3);
        assert_eq!(*seen.lock().unwrap(), vec![json!("x"); 3]);
    }

    fn trigger_graph(reuse: bool, released: Arc<Mutex<Vec<Value>>>) -> Graph {
        let mut graph = Graph::new();
        graph.add_node(IntegerSource::node());
        graph.add_node(RangeSource::node());
        graph.add_node(UnpackArray::node());
        graph.add_node(Trigger::node());
        graph.add_node(
            Node::from_fn("Collect", move |inputs, _| {
                released.lock().unwrap().push(inputs["value"].clone());
                Ok(())
            })
            .with_input("value", None),
        );
        let value = graph.input_ref("Int out", "value").unwrap();
        graph.set_default(value, Some(json!(7))).unwrap();
        let stop = graph.input_ref("Range out", "stop").unwrap();
        graph.set_default(stop, Some(json!(3))).unwrap();
        let reuse_input = graph.input_ref("Trigger", "reuse_old_data").unwrap();
        graph.set_default(reuse_input, Some(json!(reuse))).unwrap();
        graph.connect_by_name("Int out", "int", "Trigger", "data").unwrap();
        graph
            .connect_by_name("Range out", "array", "Unpack array", "array")
            .unwrap();
        graph
            .connect_by_name("Unpack array", "elements", "Trigger", "trigger")
            .unwrap();
        graph.connect_by_name("Trigger", "data", "Collect", "value").unwrap();
        graph
    }

    #[test]
    fn test_trigger_reuses_old_data() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut graph = trigger_graph(true, released.clone());

        graph.process().unwrap();
        // One release per trigger value, although the data arrived once
        assert_eq!(*released.lock().unwrap(), vec![json!(7); 3]);
    }

    #[test]
    fn test_trigger_without_reuse_releases_once() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let mut graph = trigger_graph(false, released.clone());

        graph.process().unwrap();
        assert_eq!(*released.lock().unwrap(), vec![json!(7)]);
    }

    #[test]
    fn test_pause_passes_data() {
        let mut graph = Graph::new();
        graph.add_node(Pause::node());
        let data = graph.input_ref("Pause", "data").unwrap();
        let sleep = graph.input_ref("Pause", "sleep").unwrap();
        graph.set_default(data, Some(json!(7))).unwrap();
        graph.set_default(sleep, Some(json!(0.001))).unwrap();

        let report = graph.process().unwrap();
        assert_eq!(report.result("Pause", "data"), Some(&json!(7)));
    }

    #[test]
    fn test_negative_pause_fails() {
        let mut graph = Graph::new();
        graph.add_node(Pause::node());
        let data = graph.input_ref("Pause", "data").unwrap();
        let sleep = graph.input_ref("Pause", "sleep").unwrap();
        graph.set_default(data, Some(json!(7))).unwrap();
        graph.set_default(sleep, Some(json!(-1.0))).unwrap();
        assert!(graph.process().is_err());
    }
}
