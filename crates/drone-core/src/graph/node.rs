//! Graph node types for the routing graph.
//!
//! Each node in the routing graph has a [`NodeId`], a human-readable name, the
//! engine handle of the primitive it wraps, and a [`NodeKind`] fixed when the
//! primitive was created. Delay nodes inserted by the cycle breaker also carry
//! a [`DelayLink`] naming the connection they stand in for.

use core::fmt;

/// Unique identifier for a node in the routing graph.
///
/// Node IDs are assigned sequentially and never reused within a graph instance,
/// so a stale ID can never alias a newer node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// The kind of primitive a node wraps.
///
/// Decided once, when the primitive is created. The cycle check uses
/// [`is_delay`](Self::is_delay); lifecycle calls use
/// [`is_source`](Self::is_source).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Periodic signal source with a `frequency` parameter.
    Oscillator,
    /// Amplifier with a `gain` parameter.
    Gain,
    /// Unit delay. Breaks instantaneous feedback.
    Delay,
    /// Static transfer-curve shaper.
    WaveShaper,
    /// Anything else the engine exposes (e.g. the output sink).
    Other,
}

impl NodeKind {
    /// Returns `true` for delay nodes, which terminate cycle searches.
    #[inline]
    pub fn is_delay(self) -> bool {
        matches!(self, Self::Delay)
    }

    /// Returns `true` for nodes that can be started and stopped.
    #[inline]
    pub fn is_source(self) -> bool {
        matches!(self, Self::Oscillator)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Oscillator => "oscillator",
            Self::Gain => "gain",
            Self::Delay => "delay",
            Self::WaveShaper => "wave-shaper",
            Self::Other => "node",
        };
        f.write_str(name)
    }
}

/// The connection an auto-inserted delay node replaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DelayLink {
    /// Node whose output enters the delay.
    pub source: NodeId,
    /// Node (or node parameter) the delay feeds.
    pub destination: NodeId,
    /// Parameter name when the replaced connection targeted a parameter.
    pub param: Option<String>,
}

impl DelayLink {
    /// Display name for the delay node, e.g. `delay_3_to_1_frequency`.
    pub fn node_name(&self) -> String {
        match &self.param {
            Some(param) => format!(
                "delay_{}_to_{}_{param}",
                self.source.0, self.destination.0
            ),
            None => format!("delay_{}_to_{}", self.source.0, self.destination.0),
        }
    }

    /// Returns `true` if `id` is either endpoint of the replaced connection.
    #[inline]
    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.destination == id
    }
}

/// A registered node: identity, name, kind and the engine handle it owns.
#[derive(Debug)]
pub struct Node<H> {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) handle: H,
    pub(crate) delay: Option<DelayLink>,
}

impl<H> Node<H> {
    /// Node identifier.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Human-readable name (`Node{id}` when none was given).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primitive kind.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Engine handle of the wrapped primitive.
    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// The connection this node replaces, if it was inserted by the cycle breaker.
    #[inline]
    pub fn delay_link(&self) -> Option<&DelayLink> {
        self.delay.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_link_names_encode_endpoints() {
        let plain = DelayLink {
            source: NodeId(4),
            destination: NodeId(1),
            param: None,
        };
        assert_eq!(plain.node_name(), "delay_4_to_1");

        let param = DelayLink {
            param: Some("frequency".to_string()),
            ..plain.clone()
        };
        assert_eq!(param.node_name(), "delay_4_to_1_frequency");
        assert!(param.touches(NodeId(4)));
        assert!(param.touches(NodeId(1)));
        assert!(!param.touches(NodeId(2)));
    }

    #[test]
    fn only_oscillators_are_sources() {
        assert!(NodeKind::Oscillator.is_source());
        assert!(!NodeKind::Gain.is_source());
        assert!(NodeKind::Delay.is_delay());
        assert!(!NodeKind::WaveShaper.is_delay());
    }
}
