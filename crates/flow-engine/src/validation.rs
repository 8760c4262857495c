//! Loop analysis
//!
//! Loops are legal as long as at least one input along the traced chain has
//! a default value to bootstrap the first iteration. That input is marked
//! `looped`, which lets it fall back to its default while connected.

use crate::error::{FlowError, Result};
use crate::graph::Graph;
use crate::types::InputRef;

impl Graph {
    /// Trace the chain of inputs upstream from `start`
    ///
    /// Only the first input of every upstream node is followed. Returns the
    /// chain when it leads back to the node owning `start`, `None` when it
    /// dead-ends or circles without returning there.
    pub fn input_loop(&self, start: InputRef) -> Option<Vec<InputRef>> {
        let mut path = vec![start];
        let mut current = start;
        loop {
            let upstream = self.input(current)?.connection()?;
            let node = self.node(upstream.node)?;
            if node.inputs().is_empty() {
                return None;
            }
            if upstream.node == start.node {
                return Some(path);
            }

            let next = InputRef::new(upstream.node, 0);
            if path.contains(&next) {
                return None;
            }
            path.push(next);
            current = next;
        }
    }

    /// Find every loop and mark its bootstrap input
    ///
    /// Returns all inputs taking part in a loop. Fails when a loop has no
    /// input with a default value.
    pub fn detect_loops(&mut self) -> Result<Vec<InputRef>> {
        let mut loops: Vec<InputRef> = Vec::new();

        for id in self.node_ids() {
            let inputs = self.node(id).map(|n| n.inputs().len()).unwrap_or(0);
            for index in 0..inputs {
                let start = InputRef::new(id, index);
                if loops.contains(&start) {
                    continue;
                }
                let Some(chain) = self.input_loop(start) else {
                    continue;
                };

                let bootstrap = chain.iter().copied().find(|input| {
                    self.input(*input)
                        .is_some_and(|port| port.default_value().is_some())
                });
                match bootstrap {
                    Some(input) => {
                        log::debug!(
                            "Loop through {} bootstraps at {}",
                            self.name_of(start.node),
                            self.name_of(input.node)
                        );
                        self.input_mut(input)?.looped = true;
                    }
                    None => {
                        let node = self.name_of(id).to_string();
                        let input = self
                            .input(start)
                            .map(|p| p.name().to_string())
                            .unwrap_or_default();
                        return Err(FlowError::LoopWithoutDefault { node, input });
                    }
                }
                loops.extend(chain);
            }
        }

        Ok(loops)
    }
}
