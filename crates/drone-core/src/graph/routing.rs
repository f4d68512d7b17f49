//! Routing graph: node registry, connection bookkeeping and teardown.
//!
//! [`RoutingGraph`] owns the audio engine and every primitive created through
//! it. Callers address nodes by [`NodeId`]; the graph forwards the matching
//! primitive operations to the engine and keeps an adjacency map that mirrors
//! what the engine has been told. Connections that would close a feedback
//! loop are rerouted through a delay node (see the `cycle` module).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::engine::{AudioEngine, EngineError, Port, Primitive, PrimitiveHandle};

use super::edge::{Edge, Outgoing};
use super::node::{DelayLink, Node, NodeId, NodeKind};

/// Errors that can occur during graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// The destination does not expose a numeric parameter with this name.
    #[error("parameter '{param}' not found on {node}")]
    MissingParam {
        /// Name of the destination node.
        node: String,
        /// Requested parameter.
        param: String,
    },
    /// The engine refused a primitive-level connection.
    #[error("failed to connect {from} to {to}: {cause}")]
    Primitive {
        /// Name of the source node.
        from: String,
        /// Name of the destination node (with `.param` suffix for parameters).
        to: String,
        /// Engine error.
        #[source]
        cause: EngineError,
    },
    /// The engine refused a parameter or playback operation.
    #[error("engine error on {node}: {cause}")]
    Engine {
        /// Name of the node addressed.
        node: String,
        /// Engine error.
        #[source]
        cause: EngineError,
    },
}

/// How a successful connect was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connection {
    /// A new direct edge was created.
    Direct,
    /// The pair was already connected; nothing changed.
    Existing,
    /// A direct edge would have closed a cycle; the signal now runs through
    /// this delay node.
    ViaDelay(NodeId),
}

/// Directed routing graph over engine primitives.
///
/// # Usage
///
/// 1. Create a graph around an engine with [`new()`](Self::new)
/// 2. Add nodes: [`add()`](Self::add) or [`create_node()`](Self::create_node)
/// 3. Wire them: [`connect()`](Self::connect),
///    [`connect_to_param()`](Self::connect_to_param)
/// 4. Tear down: [`disconnect()`](Self::disconnect),
///    [`remove_node()`](Self::remove_node)
///
/// # Invariants
///
/// - Node IDs are never reused.
/// - At most one edge exists per ordered (source, destination) pair.
/// - Treating delay nodes as terminators, the graph is acyclic after every
///   connect call.
/// - Every delay node inserted by the graph is removed together with either
///   endpoint of the connection it replaces.
#[derive(Debug)]
pub struct RoutingGraph<E: AudioEngine> {
    engine: E,
    pub(crate) nodes: BTreeMap<NodeId, Node<E::Handle>>,
    pub(crate) connections: BTreeMap<NodeId, Outgoing>,
    next_id: u32,
}

impl<E: AudioEngine> RoutingGraph<E> {
    /// Creates an empty graph that drives `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// The engine behind this graph.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the engine.
    ///
    /// Connections made directly on the engine are invisible to the graph.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // --- Node mutations ---

    /// Registers an existing engine handle as a node.
    ///
    /// Unnamed nodes are called `Node{id}`.
    pub fn create_node(&mut self, handle: E::Handle, name: Option<&str>) -> NodeId {
        let id = NodeId(self.next_id);
        let name = name.map_or_else(|| format!("Node{}", id.0), str::to_owned);
        self.insert_node(handle, name, None)
    }

    /// Creates `primitive` in the engine and registers it.
    pub fn add(&mut self, primitive: Primitive, name: Option<&str>) -> NodeId {
        let handle = self.engine.create(primitive);
        self.create_node(handle, name)
    }

    pub(crate) fn insert_node(
        &mut self,
        handle: E::Handle,
        name: String,
        delay: Option<DelayLink>,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let kind = handle.kind();
        tracing::debug!("graph_add: {kind} node {name} ({id})");
        self.nodes.insert(
            id,
            Node {
                id,
                name,
                kind,
                handle,
                delay,
            },
        );
        self.connections.insert(id, Outgoing::new());
        id
    }

    /// Removes a node.
    ///
    /// Disconnects every edge leaving or entering the node, removes every delay
    /// node standing in for a connection to or from it, and releases the
    /// primitive back to the engine.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let anchored = self.delays_where(|link| link.touches(id));
        for delay in anchored {
            self.detach(delay);
        }
        self.detach(id);
        Ok(())
    }

    // --- Connections ---

    /// Connects the output of `source` to the input of `destination`.
    ///
    /// An existing connection is left alone. A connection that would close a
    /// feedback loop is routed through a new delay node. Engine failures are
    /// logged and returned; the graph is left unchanged.
    pub fn connect(&mut self, source: NodeId, destination: NodeId) -> Result<Connection, GraphError> {
        self.connect_port(source, destination, Port::Input)
    }

    /// Connects the output of `source` to parameter `param` of `destination`.
    ///
    /// Fails with [`GraphError::MissingParam`] if the destination has no
    /// numeric parameter of that name. The edge is recorded against the
    /// destination node, exactly as [`connect()`](Self::connect) would.
    pub fn connect_to_param(
        &mut self,
        source: NodeId,
        destination: NodeId,
        param: &str,
    ) -> Result<Connection, GraphError> {
        let target = lookup(&self.nodes, destination)?;
        if self.engine.param(&target.handle, param).is_none() {
            tracing::warn!("parameter {param} not found on {}", target.name);
            return Err(GraphError::MissingParam {
                node: target.name.clone(),
                param: param.to_owned(),
            });
        }
        self.connect_port(source, destination, Port::Param(param.to_owned()))
    }

    fn connect_port(
        &mut self,
        source: NodeId,
        destination: NodeId,
        port: Port,
    ) -> Result<Connection, GraphError> {
        lookup(&self.nodes, source)?;
        lookup(&self.nodes, destination)?;

        if self.contains_edge(source, destination) || self.linked_via_delay(source, destination) {
            if let (Some(from), Some(to)) = (self.nodes.get(&source), self.nodes.get(&destination)) {
                tracing::debug!("already connected: {} => {}{port}", from.name, to.name);
            }
            return Ok(Connection::Existing);
        }

        if self.would_create_cycle(source, destination) {
            return self
                .break_cycle(source, destination, port)
                .map(Connection::ViaDelay);
        }

        self.link(source, destination, port)?;
        Ok(Connection::Direct)
    }

    /// Returns `true` if a delay node still carries `source → destination`.
    ///
    /// A delay whose edges on either side were disconnected no longer links
    /// the pair; it is removed so the caller can connect afresh.
    fn linked_via_delay(&mut self, source: NodeId, destination: NodeId) -> bool {
        let Some(delay) = self.find_delay(source, destination) else {
            return false;
        };
        if self.contains_edge(source, delay) && self.contains_edge(delay, destination) {
            return true;
        }
        tracing::debug!("removing stale delay {delay} for {source} => {destination}");
        self.detach(delay);
        false
    }

    /// Issues the primitive connect and records the edge. No policy checks.
    pub(crate) fn link(
        &mut self,
        source: NodeId,
        destination: NodeId,
        port: Port,
    ) -> Result<(), GraphError> {
        let from = lookup(&self.nodes, source)?;
        let to = lookup(&self.nodes, destination)?;

        if let Err(cause) = self.engine.connect(&from.handle, &to.handle, &port) {
            tracing::error!("failed to connect {} to {}{port}: {cause}", from.name, to.name);
            return Err(GraphError::Primitive {
                from: from.name.clone(),
                to: format!("{}{port}", to.name),
                cause,
            });
        }
        tracing::debug!("graph_connect: {} => {}{port}", from.name, to.name);

        self.connections
            .entry(source)
            .or_default()
            .insert(destination, port);
        Ok(())
    }

    /// Disconnects `source` from `destination`, or from everything when `None`.
    ///
    /// Any delay node standing in for the removed connection(s) is removed
    /// as well. Unknown nodes are ignored.
    pub fn disconnect(&mut self, source: NodeId, destination: Option<NodeId>) {
        if !self.nodes.contains_key(&source) {
            tracing::debug!("disconnect: unknown source {source}");
            return;
        }
        match destination {
            Some(destination) => {
                if let Some(delay) = self.find_delay(source, destination) {
                    self.detach(delay);
                }
                let removed = self
                    .connections
                    .get_mut(&source)
                    .and_then(|outgoing| outgoing.remove(&destination));
                if let (Some(port), Some(from), Some(to)) = (
                    removed,
                    self.nodes.get(&source),
                    self.nodes.get(&destination),
                ) {
                    self.engine.disconnect(&from.handle, Some((&to.handle, &port)));
                    tracing::debug!("graph_disconnect: {} => {}{port}", from.name, to.name);
                }
            }
            None => {
                let owned = self.delays_where(|link| link.source == source);
                for delay in owned {
                    self.detach(delay);
                }
                if let Some(from) = self.nodes.get(&source) {
                    self.engine.disconnect(&from.handle, None);
                    tracing::debug!("graph_disconnect: all from {}", from.name);
                }
                if let Some(outgoing) = self.connections.get_mut(&source) {
                    outgoing.clear();
                }
            }
        }
    }

    /// Drops every edge of `id`, deregisters it and releases its primitive.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        self.engine.disconnect(&node.handle, None);
        self.connections.remove(&id);

        for (source, outgoing) in &mut self.connections {
            if let Some(port) = outgoing.remove(&id)
                && let Some(from) = self.nodes.get(source)
            {
                self.engine.disconnect(&from.handle, Some((&node.handle, &port)));
            }
        }

        self.engine.release(&node.handle);
        tracing::debug!("graph_remove: {} ({id})", node.name);
    }

    // --- Parameters and playback ---

    /// Current value of a node parameter.
    pub fn param(&self, id: NodeId, name: &str) -> Option<f32> {
        let node = self.nodes.get(&id)?;
        self.engine.param(&node.handle, name)
    }

    /// Sets a node parameter immediately.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: f32) -> Result<(), GraphError> {
        let node = lookup(&self.nodes, id)?;
        self.engine
            .set_param(&node.handle, name, value)
            .map_err(|cause| engine_error(node, cause))
    }

    /// Schedules an exponential approach of a node parameter to `target`.
    pub fn ramp_param(
        &mut self,
        id: NodeId,
        name: &str,
        target: f32,
        start_time: f64,
        time_constant: f64,
    ) -> Result<(), GraphError> {
        let node = lookup(&self.nodes, id)?;
        self.engine
            .set_target_at_time(&node.handle, name, target, start_time, time_constant)
            .map_err(|cause| engine_error(node, cause))
    }

    /// Starts a source node. Non-source nodes are left alone.
    pub fn start(&mut self, id: NodeId, when: Option<f64>) -> Result<(), GraphError> {
        let node = lookup(&self.nodes, id)?;
        if !node.kind.is_source() {
            return Ok(());
        }
        self.engine
            .start(&node.handle, when)
            .map_err(|cause| engine_error(node, cause))
    }

    /// Stops a source node. Non-source nodes are left alone.
    pub fn stop(&mut self, id: NodeId, when: Option<f64>) -> Result<(), GraphError> {
        let node = lookup(&self.nodes, id)?;
        if !node.kind.is_source() {
            return Ok(());
        }
        self.engine
            .stop(&node.handle, when)
            .map_err(|cause| engine_error(node, cause))
    }

    /// Engine clock in seconds.
    pub fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    // --- Introspection ---

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node<E::Handle>> {
        self.nodes.get(&id)
    }

    /// All registered nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<E::Handle>> {
        self.nodes.values()
    }

    /// Kind of a node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).map(|n| n.kind)
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of recorded edges.
    pub fn connection_count(&self) -> usize {
        self.connections.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if a direct edge `source → destination` is recorded.
    pub fn contains_edge(&self, source: NodeId, destination: NodeId) -> bool {
        self.connections
            .get(&source)
            .is_some_and(|outgoing| outgoing.contains_key(&destination))
    }

    /// Destinations of the direct edges leaving `source`.
    pub fn destinations(&self, source: NodeId) -> Vec<NodeId> {
        self.connections
            .get(&source)
            .map(|outgoing| outgoing.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every recorded edge, ordered by source then destination.
    pub fn edges(&self) -> Vec<Edge> {
        self.connections
            .iter()
            .flat_map(|(from, outgoing)| {
                outgoing.iter().map(|(to, port)| Edge {
                    from: *from,
                    to: *to,
                    port: port.clone(),
                })
            })
            .collect()
    }

    /// First node with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.values().find(|n| n.name == name).map(|n| n.id)
    }

    /// Delay nodes inserted by the cycle breaker.
    pub fn delay_nodes(&self) -> impl Iterator<Item = &Node<E::Handle>> {
        self.nodes.values().filter(|n| n.delay.is_some())
    }

    /// The delay node standing in for `source → destination`, if any.
    pub fn find_delay(&self, source: NodeId, destination: NodeId) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|n| {
                n.delay
                    .as_ref()
                    .is_some_and(|l| l.source == source && l.destination == destination)
            })
            .map(|n| n.id)
    }

    fn delays_where(&self, predicate: impl Fn(&DelayLink) -> bool) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.delay.as_ref().is_some_and(&predicate))
            .map(|n| n.id)
            .collect()
    }

    /// Connection listing, one line per node: `name => [dest, ...]`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (id, outgoing) in &self.connections {
            let name = self.nodes.get(id).map_or("?", |n| n.name.as_str());
            let targets: Vec<String> = outgoing
                .iter()
                .map(|(to, port)| {
                    let to_name = self
                        .nodes
                        .get(to)
                        .map_or_else(|| format!("Node{}", to.0), |n| n.name.clone());
                    format!("{to_name}{port}")
                })
                .collect();
            let _ = writeln!(out, "{name} => [{}]", targets.join(", "));
        }
        out
    }

    /// Logs [`describe()`](Self::describe) at debug level.
    pub fn log_connections(&self) {
        tracing::debug!("routing graph ({} connections)", self.connection_count());
        for line in self.describe().lines() {
            tracing::debug!("  {line}");
        }
    }
}

fn lookup<H>(nodes: &BTreeMap<NodeId, Node<H>>, id: NodeId) -> Result<&Node<H>, GraphError> {
    nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
}

fn engine_error<H>(node: &Node<H>, cause: EngineError) -> GraphError {
    tracing::warn!("engine error on {}: {cause}", node.name);
    GraphError::Engine {
        node: node.name.clone(),
        cause,
    }
}
