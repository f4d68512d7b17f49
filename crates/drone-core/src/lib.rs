//! Drone Core - routing graph and control primitives
//!
//! This crate provides the signal-routing layer of the drone synthesizer. It
//! does not process audio itself; it drives an external engine through the
//! [`AudioEngine`] trait and keeps track of what is connected to what.
//!
//! # Core Abstractions
//!
//! ## Routing Graph
//!
//! - [`RoutingGraph`] - Node registry and connection manager over engine primitives
//! - [`Connection`] - How a connect request was satisfied (direct, existing, via delay)
//! - [`GraphError`] - Errors surfaced by graph operations
//!
//! Connections that would close a feedback loop are routed through an
//! automatically inserted delay node; see [`graph`] for details.
//!
//! ## Engine Contract
//!
//! - [`AudioEngine`] - Primitive capability contract (create, connect, params, playback)
//! - [`HeadlessEngine`] - State-tracking engine for tests and hosts without audio
//!
//! ## Control
//!
//! - [`ControlSmoother`] - Per-tick exponential smoothing of control values
//! - [`PeriodicTask`] / [`FrameClock`] - Cancellable per-frame work
//!
//! ## Utilities
//!
//! - Level and shaping functions: [`db_to_linear`], [`cos_weighting`], [`clip_curve`], etc.
//!
//! # Example
//!
//! ```rust
//! use drone_core::{Connection, HeadlessEngine, Primitive, RoutingGraph};
//!
//! let mut graph = RoutingGraph::new(HeadlessEngine::new());
//! let osc = graph.add(Primitive::sine(55.0), Some("osc"));
//! let amp = graph.add(Primitive::gain(0.5), Some("amp"));
//!
//! assert_eq!(graph.connect(osc, amp).unwrap(), Connection::Direct);
//! assert_eq!(graph.connect(osc, amp).unwrap(), Connection::Existing);
//! assert_eq!(graph.connection_count(), 1);
//! ```

pub mod engine;
pub mod graph;
pub mod math;
pub mod param;
pub mod task;

// Re-export main types at crate root
pub use engine::{
    AudioEngine, EngineError, HeadlessEngine, HeadlessHandle, Port, Primitive, PrimitiveHandle,
    Waveform,
};
pub use graph::{
    Connection, DelayLink, Edge, GraphError, Node, NodeId, NodeKind, RoutingGraph,
};
pub use math::{clip_curve, cos_weighting, db_to_linear, hard_clip, linear_to_db};
pub use param::ControlSmoother;
pub use task::{Frame, FrameClock, PeriodicTask, TaskState};
