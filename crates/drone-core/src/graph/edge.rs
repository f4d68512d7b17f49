//! Graph edge types for the routing graph.
//!
//! Edges are stored per source node, keyed by destination node ID, so at most
//! one edge can exist between any ordered pair. Connections into a parameter
//! are keyed by the node that owns the parameter; the [`Port`] kept with each
//! edge only tells the engine which input to address on disconnect.

use std::collections::BTreeMap;

use crate::engine::Port;

use super::node::NodeId;

/// Outgoing edges of one node: destination → port.
pub(crate) type Outgoing = BTreeMap<NodeId, Port>;

/// A directed connection between two nodes, as reported by
/// [`RoutingGraph::edges`](super::RoutingGraph::edges).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
    /// Input addressed on the destination.
    pub port: Port,
}
