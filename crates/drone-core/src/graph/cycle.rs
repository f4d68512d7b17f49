//! Cycle detection and delay insertion.
//!
//! A connection that would close a loop among non-delay nodes is never made
//! directly. Instead the graph creates a unit delay, wires
//! `source → delay → destination`, and records the replaced connection on the
//! delay node as a [`DelayLink`]. Delay nodes terminate the reachability
//! search, so a path that runs through one is not a cycle: the delay turns an
//! instantaneous dependency into a one-block-late one.

use std::collections::BTreeSet;

use crate::engine::{AudioEngine, Port, Primitive};

use super::node::{DelayLink, NodeId};
use super::routing::{GraphError, RoutingGraph};

impl<E: AudioEngine> RoutingGraph<E> {
    /// Would adding `from → to` create a cycle?
    ///
    /// The candidate edge is added speculatively, a depth-first search looks
    /// for a path from `to` back to itself, and the edge is rolled back
    /// whatever the outcome. Unknown nodes never form a cycle.
    pub fn would_create_cycle(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return false;
        }
        let outgoing = self.connections.entry(from).or_default();
        let previous = outgoing.insert(to, Port::Input);

        let cycle = self.reaches_itself(to);

        if let Some(outgoing) = self.connections.get_mut(&from) {
            match previous {
                Some(port) => {
                    outgoing.insert(to, port);
                }
                None => {
                    outgoing.remove(&to);
                }
            }
        }
        cycle
    }

    /// DFS from `start` for a path back to `start`. Delays are not expanded.
    fn reaches_itself(&self, start: NodeId) -> bool {
        if self.is_delay(start) {
            return false;
        }
        let mut visited = BTreeSet::new();
        let mut stack: Vec<NodeId> = self.destinations(start);

        while let Some(current) = stack.pop() {
            if current == start {
                return true;
            }
            if !visited.insert(current) || self.is_delay(current) {
                continue;
            }
            if let Some(outgoing) = self.connections.get(&current) {
                stack.extend(outgoing.keys().copied());
            }
        }
        false
    }

    fn is_delay(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.kind.is_delay())
    }

    /// Routes `source → destination` through a new delay node.
    ///
    /// On failure the half-built delay is removed again.
    pub(crate) fn break_cycle(
        &mut self,
        source: NodeId,
        destination: NodeId,
        port: Port,
    ) -> Result<NodeId, GraphError> {
        let link = DelayLink {
            source,
            destination,
            param: port.param_name().map(str::to_owned),
        };
        let name = link.node_name();
        tracing::warn!("connection {source} => {destination}{port} would create a cycle; routing through {name}");

        let handle = self.engine_mut().create(Primitive::unit_delay());
        let delay = self.insert_node(handle, name, Some(link));

        let wired = self
            .link(source, delay, Port::Input)
            .and_then(|()| self.link(delay, destination, port));
        if let Err(err) = wired {
            self.detach(delay);
            return Err(err);
        }
        Ok(delay)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{FREQUENCY, HeadlessEngine, Primitive};
    use crate::graph::{Connection, NodeKind, RoutingGraph};

    fn graph() -> RoutingGraph<HeadlessEngine> {
        RoutingGraph::new(HeadlessEngine::new())
    }

    #[test]
    fn cycle_check_rolls_back_candidate_edge() {
        let mut g = graph();
        let a = g.add(Primitive::gain(1.0), Some("a"));
        let b = g.add(Primitive::gain(1.0), Some("b"));
        g.connect(a, b).unwrap();

        assert!(g.would_create_cycle(b, a));
        assert!(!g.contains_edge(b, a));
        assert!(!g.would_create_cycle(a, b));
        assert!(g.contains_edge(a, b), "existing edge survives rollback");
        assert_eq!(g.connection_count(), 1);
    }

    #[test]
    fn cycle_check_on_removed_node_leaves_no_trace() {
        let mut g = graph();
        let a = g.add(Primitive::gain(1.0), Some("a"));
        let b = g.add(Primitive::gain(1.0), Some("b"));
        g.connect(a, b).unwrap();
        g.remove_node(b).unwrap();

        assert!(!g.would_create_cycle(b, a));
        assert!(!g.would_create_cycle(a, b));
        assert_eq!(g.describe(), "a => []\n");
        assert_eq!(g.connection_count(), 0);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut g = graph();
        let a = g.add(Primitive::gain(1.0), None);
        assert!(g.would_create_cycle(a, a));
    }

    #[test]
    fn delay_destination_never_cycles() {
        let mut g = graph();
        let a = g.add(Primitive::gain(1.0), None);
        let d = g.add(Primitive::unit_delay(), None);
        g.connect(d, a).unwrap();
        assert!(!g.would_create_cycle(a, d));
    }

    #[test]
    fn closing_loop_inserts_named_delay() {
        let mut g = graph();
        let a = g.add(Primitive::sine(55.0), Some("a"));
        let b = g.add(Primitive::sine(110.0), Some("b"));
        g.connect(a, b).unwrap();

        let Connection::ViaDelay(delay) = g.connect_to_param(b, a, FREQUENCY).unwrap() else {
            panic!("expected delay insertion");
        };
        let node = g.node(delay).unwrap();
        assert_eq!(node.kind(), NodeKind::Delay);
        assert_eq!(node.name(), format!("delay_{}_to_{}_frequency", b.index(), a.index()));
        assert!(g.contains_edge(b, delay));
        assert!(g.contains_edge(delay, a));
        assert!(!g.contains_edge(b, a));
    }

    #[test]
    fn failed_delay_wiring_leaves_no_trace() {
        let mut g = graph();
        let a = g.add(Primitive::gain(1.0), None);
        let b = g.add(Primitive::gain(1.0), None);
        g.connect(a, b).unwrap();
        let handle = *g.node(a).unwrap().handle();
        g.engine_mut().reject_connections_to(&handle);

        assert!(g.connect(b, a).is_err());
        assert_eq!(g.delay_nodes().count(), 0);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.connection_count(), 1);
    }
}
