//! Source/sink classification and run order

use std::collections::HashSet;

use crate::graph::Graph;
use crate::types::NodeId;

impl Graph {
    /// Nodes without any connected input
    pub fn sources(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.inputs().iter().all(|i| !i.is_connected()))
            .map(|(id, _)| id)
            .collect()
    }

    /// Nodes without any connected output
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.outputs().iter().all(|o| !o.is_connected()))
            .map(|(id, _)| id)
            .collect()
    }

    /// Layer-wise execution order starting from the sources
    ///
    /// Every node appears exactly once. A node reachable from several
    /// producers is placed when it is first discovered. When no node can be
    /// reached any more (no sources at all, or a detached cycle), the first
    /// unplaced non-sink node seeds a new layer.
    pub fn run_order(&self) -> Vec<NodeId> {
        let all = self.node_ids();
        let sinks: HashSet<NodeId> = self.sinks().into_iter().collect();

        let mut frontier = self.sources();
        if frontier.is_empty() && !all.is_empty() {
            log::warn!("No source node found for run order");
        }

        let mut placed: HashSet<NodeId> = frontier.iter().copied().collect();
        let mut order = frontier.clone();

        while order.len() < all.len() {
            if frontier.is_empty() {
                let unplaced = all.iter().copied().filter(|id| !placed.contains(id));
                let seed = unplaced
                    .clone()
                    .find(|id| !sinks.contains(id))
                    .or_else(|| unplaced.clone().next());
                let Some(seed) = seed else {
                    break;
                };
                log::warn!(
                    "Using '{}' as pseudo source, run order may be suboptimal",
                    self.name_of(seed)
                );
                placed.insert(seed);
                order.push(seed);
                frontier.push(seed);
            }

            let mut next = Vec::new();
            for id in &frontier {
                let Some(node) = self.node(*id) else {
                    continue;
                };
                for output in node.outputs() {
                    for target in output.connections() {
                        if placed.insert(target.node) {
                            order.push(target.node);
                            next.push(target.node);
                        }
                    }
                }
            }
            frontier = next;
        }

        order
    }
}
