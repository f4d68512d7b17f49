//! Routing graph for runtime-built signal paths.
//!
//! The graph module tracks which engine primitive feeds which, so that a
//! signal path described declaratively can be built, inspected, and torn down
//! again while audio is running.
//!
//! # Architecture
//!
//! - [`RoutingGraph`] owns the [`AudioEngine`](crate::engine::AudioEngine) and
//!   every node created through it. Mutations (add, connect, disconnect,
//!   remove) are forwarded to the engine and mirrored in an adjacency map.
//! - Edges are keyed by (source, destination): connecting the same pair twice
//!   is a no-op, and a connection into a node's parameter occupies the same
//!   slot as a connection into the node itself.
//! - Before a new edge is made, a depth-first search checks whether it would
//!   close a loop. If so, the graph inserts a delay node and routes through it
//!   instead. Delay nodes end the search, so the graph stays acyclic apart from
//!   paths that pass through a delay.
//! - Removing a node or disconnecting a pair also removes the delay nodes that
//!   were inserted on its behalf.
//!
//! # Example
//!
//! ```rust
//! use drone_core::engine::{FREQUENCY, HeadlessEngine, Primitive};
//! use drone_core::graph::{Connection, RoutingGraph};
//!
//! let mut graph = RoutingGraph::new(HeadlessEngine::new());
//! let a = graph.add(Primitive::sine(110.0), Some("a"));
//! let b = graph.add(Primitive::sine(220.0), Some("b"));
//!
//! assert_eq!(graph.connect_to_param(a, b, FREQUENCY).unwrap(), Connection::Direct);
//! // Feedback from b into a goes through a delay.
//! assert!(matches!(
//!     graph.connect_to_param(b, a, FREQUENCY).unwrap(),
//!     Connection::ViaDelay(_)
//! ));
//! assert_eq!(graph.delay_nodes().count(), 1);
//! ```

mod cycle;
pub mod edge;
pub mod node;
mod routing;

pub use edge::Edge;
pub use node::{DelayLink, Node, NodeId, NodeKind};
pub use routing::{Connection, GraphError, RoutingGraph};
