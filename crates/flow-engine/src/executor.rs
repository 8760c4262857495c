//! Iteration driver
//!
//! `process` repeatedly collects every node in run order until a full pass
//! leaves every node idle, the caller cancels, or the configured iteration
//! cap is reached. Everything runs on the calling thread; to keep a host
//! responsive, move the graph to a worker thread and cancel through a
//! [`CancelFlag`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::graph::{Graph, GraphState};

/// Final value of one sink output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkResult {
    pub node: String,
    pub output: String,
    /// `None` when the output never produced anything
    pub result: Option<Value>,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: Vec<SinkResult>,
    /// Number of passes in which at least one node processed
    pub iterations: u64,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Look up the result of a sink output
    pub fn result(&self, node: &str, output: &str) -> Option<&Value> {
        self.results
            .iter()
            .find(|r| r.node == node && r.output == output)
            .and_then(|r| r.result.as_ref())
    }
}

/// Shareable cancellation request, checked once per completed iteration
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the flag can be reused
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Graph {
    /// Compute run order, reset every node and analyse loops
    pub fn prepare(&mut self) -> Result<()> {
        self.order = self.run_order();
        log::info!("Run order:");
        for id in self.order.clone() {
            log::info!("\t{}", self.name_of(id));
            if let Some(node) = self.node_mut(id) {
                node.reset()?;
            }
        }

        self.loop_inputs = self.detect_loops()?;
        if !self.loop_inputs.is_empty() {
            log::warn!("Loop detected. The graph may run forever");
        }

        self.state = GraphState::Prepared;
        Ok(())
    }

    /// Run until no node can process any more
    pub fn process(&mut self) -> Result<RunReport> {
        self.process_with_cancel(&|| false)
    }

    /// Run until idle or until `cancel` returns true after an iteration
    ///
    /// Prepares the graph first unless it is freshly prepared. Every node's
    /// `finish` runs afterwards, also when a node failed; the node error
    /// then takes precedence over any finish error.
    pub fn process_with_cancel(&mut self, cancel: &dyn Fn() -> bool) -> Result<RunReport> {
        log::debug!("{}", self);
        if self.state != GraphState::Prepared {
            self.prepare()?;
        }

        log::info!("Graph processing...");
        self.state = GraphState::Running;
        let start = Instant::now();
        let mut iterations = 0;
        let outcome = self.iterate(cancel, &mut iterations);
        let elapsed = start.elapsed();

        log::info!(
            "Finished. Took {:.3} ms and {} iterations",
            elapsed.as_secs_f64() * 1e3,
            iterations
        );
        log::debug!("{}", self);

        let finished = self.finish_nodes();
        self.state = GraphState::Finished;
        match outcome {
            Ok(()) => finished?,
            Err(e) => {
                if let Err(finish_err) = finished {
                    log::warn!("Ignoring finish error after failed run: {}", finish_err);
                }
                return Err(e);
            }
        }

        Ok(RunReport {
            results: self.results(),
            iterations,
            elapsed,
        })
    }

    fn iterate(&mut self, cancel: &dyn Fn() -> bool, iterations: &mut u64) -> Result<()> {
        let order = self.order.clone();
        loop {
            if let Some(max) = self.config.max_iterations {
                if *iterations >= max {
                    log::warn!("Stopping after reaching the limit of {} iterations", max);
                    return Ok(());
                }
            }

            log::debug!("======== Iteration {} ========", iterations);
            for id in &order {
                self.collect_node(*id)?;
            }

            if self.is_idle() {
                return Ok(());
            }
            *iterations += 1;

            if cancel() {
                log::info!("Processing cancelled after {} iterations", iterations);
                return Ok(());
            }
        }
    }

    fn finish_nodes(&mut self) -> Result<()> {
        let mut first_error = None;
        for id in self.node_ids() {
            let Some(node) = self.node_mut(id) else {
                continue;
            };
            if let Err(e) = node.finish() {
                log::error!("Node '{}' failed to finish: {}", node.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// True when no node processed during the last pass
    pub fn is_idle(&self) -> bool {
        self.nodes().all(|(_, node)| !node.is_busy())
    }

    /// Results of every output of every sink node
    pub fn results(&self) -> Vec<SinkResult> {
        let mut results = Vec::new();
        for id in self.sinks() {
            let Some(node) = self.node(id) else {
                continue;
            };
            for output in node.outputs() {
                results.push(SinkResult {
                    node: node.name().to_string(),
                    output: output.name().to_string(),
                    result: output.result().cloned(),
                });
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::FlowError;
    use crate::node::{Node, NodeProcessor, Outputs};
    use serde_json::json;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn constant(name: &str, value: Value) -> Node {
        Node::from_fn(name, |inputs, outputs| {
            outputs.push("value", inputs.get("value").cloned().unwrap_or(Value::Null))
        })
        .with_input("value", Some(value))
        .with_output("value", None)
    }

    fn adder() -> Node {
        Node::from_fn("Add", |inputs, outputs| {
            let a = inputs.get("a").and_then(Value::as_i64).unwrap_or(0);
            let b = inputs.get("b").and_then(Value::as_i64).unwrap_or(0);
            outputs.push("c", a + b)
        })
        .with_input("a", None)
        .with_input("b", None)
        .with_output("c", None)
    }

    fn counter(seen: Arc<Mutex<Vec<i64>>>) -> Node {
        Node::from_fn("Counter", move |inputs, outputs| {
            let n = inputs.get("n").and_then(Value::as_i64).unwrap_or(0);
            seen.lock().unwrap().push(n);
            outputs.push("next", n + 1)
        })
        .with_input("n", Some(json!(0)))
        .with_output("next", None)
    }

    fn add_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(constant("A", json!(2)));
        graph.add_node(constant("B", json!(3)));
        graph.add_node(adder());
        graph.connect_by_name("A", "value", "Add", "a").unwrap();
        graph.connect_by_name("B", "value", "Add", "b").unwrap();
        graph
    }

    #[test]
    fn test_two_sources_feed_adder() {
        let mut graph = add_graph();
        let report = graph.process().unwrap();

        assert_eq!(report.iterations, 1);
        assert_eq!(
            report.results,
            vec![SinkResult {
                node: "Add".to_string(),
                output: "c".to_string(),
                result: Some(json!(5)),
            }]
        );
        assert_eq!(report.result("Add", "c"), Some(&json!(5)));
        assert!(graph.is_idle());
        assert_eq!(graph.state(), GraphState::Finished);
    }

    #[test]
    fn test_self_loop_runs_until_cancelled() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut graph = Graph::new();
        graph.add_node(counter(seen.clone()));
        graph.connect_by_name("Counter", "next", "Counter", "n").unwrap();
        graph.prepare().unwrap();

        let checks = Cell::new(0);
        let report = graph
            .process_with_cancel(&|| {
                checks.set(checks.get() + 1);
                checks.get() >= 5
            })
            .unwrap();

        assert_eq!(report.iterations, 5);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        let input = graph.input_ref("Counter", "n").unwrap();
        assert_eq!(graph.input(input).unwrap().buffer()[0], json!(5));
        // No sinks in a pure self loop
        assert!(report.results.is_empty());
    }

    #[test]
    fn test_iteration_cap() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut graph =
            Graph::new().with_config(EngineConfig { max_iterations: Some(3), ..Default::default() });
        graph.add_node(counter(seen.clone()));
        graph.connect_by_name("Counter", "next", "Counter", "n").unwrap();

        let report = graph.process().unwrap();
        assert_eq!(report.iterations, 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_process_prepares_when_needed() {
        let mut graph = add_graph();
        assert_eq!(graph.state(), GraphState::Unprepared);
        graph.process().unwrap();

        // A finished graph is prepared again, so the run repeats
        let report = graph.process().unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(report.result("Add", "c"), Some(&json!(5)));
    }

    #[test]
    fn test_prepare_resets_results() {
        let mut graph = add_graph();
        graph.process().unwrap();
        graph.prepare().unwrap();
        assert_eq!(graph.results()[0].result, None);
        assert_eq!(graph.state(), GraphState::Prepared);
    }

    #[test]
    fn test_empty_graph_finishes_immediately() {
        let report = Graph::new().process().unwrap();
        assert_eq!(report.iterations, 0);
        assert!(report.results.is_empty());
    }

    #[test]
    fn test_unproduced_sink_output_is_none() {
        let mut graph = Graph::new();
        graph.add_node(adder());
        let report = graph.process().unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.result("Add", "c"), None);
        assert_eq!(report.results.len(), 1);
    }

    struct Tracked {
        fail: bool,
        finished: Arc<Mutex<u32>>,
    }

    impl NodeProcessor for Tracked {
        fn process(&mut self, _: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
            if self.fail {
                return Err(FlowError::failed("boom"));
            }
            outputs.push("out", 1)
        }

        fn finish(&mut self) -> Result<()> {
            *self.finished.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_node_error_propagates_and_finish_still_runs() {
        let finished = Arc::new(Mutex::new(0));
        let mut graph = Graph::new();
        graph.add_node(
            Node::new(
                "Ok",
                Tracked {
                    fail: false,
                    finished: finished.clone(),
                },
            )
            .with_output("out", None),
        );
        graph.add_node(
            Node::new(
                "Bad",
                Tracked {
                    fail: true,
                    finished: finished.clone(),
                },
            )
            .with_output("out", None),
        );

        let err = graph.process().unwrap_err();
        assert!(matches!(err, FlowError::ExecutionFailed(ref msg) if msg == "boom"));
        assert_eq!(*finished.lock().unwrap(), 2);
        assert_eq!(graph.state(), GraphState::Finished);
    }

    #[test]
    fn test_loop_without_default_fails_prepare() {
        let mut graph = Graph::new();
        graph.add_node(adder());
        graph.connect_by_name("Add", "c", "Add", "a").unwrap();
        assert!(matches!(
            graph.process(),
            Err(FlowError::LoopWithoutDefault { .. })
        ));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        fn assert_send<T: Send>(_: &T) {}

        let mut graph = Graph::new();
        graph.add_node(
            Node::from_fn("Spin", |inputs, outputs| {
                let n = inputs.get("n").and_then(Value::as_i64).unwrap_or(0);
                outputs.push("next", n + 1)
            })
            .with_input("n", Some(json!(0)))
            .with_output("next", None),
        );
        graph.connect_by_name("Spin", "next", "Spin", "n").unwrap();
        assert_send(&graph);

        let flag = CancelFlag::new();
        let worker_flag = flag.clone();
        let handle = std::thread::spawn(move || {
            let report = graph.process_with_cancel(&|| worker_flag.is_cancelled());
            (graph, report)
        });

        std::thread::sleep(Duration::from_millis(20));
        flag.cancel();
        let (graph, report) = handle.join().unwrap();
        let report = report.unwrap();

        assert!(report.iterations > 0);
        assert_eq!(graph.state(), GraphState::Finished);
        assert!(flag.is_cancelled());
        flag.reset();
        assert!(!flag.is_cancelled());
    }
}
