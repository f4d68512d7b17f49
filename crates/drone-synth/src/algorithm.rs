//! Declarative FM routing algorithms.
//!
//! An algorithm lists which operators modulate which (`mod`, as
//! `[modulator, carrier]` pairs) and which operators reach the output bus
//! (`out`). The JSON form is the one hosts exchange:
//!
//! ```rust
//! use drone_synth::RoutingAlgorithm;
//!
//! let alg = RoutingAlgorithm::from_json(r#"{"mod": [[0, 1], [1, 0]], "out": [0, 1]}"#).unwrap();
//! assert_eq!(alg.modulations, vec![(0, 1), (1, 0)]);
//! assert_eq!(alg.outputs, vec![0, 1]);
//! ```
//!
//! Indices are not checked at decode time, and may be negative. Pairs or
//! outputs that name a missing operator are skipped when the chain is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operator::OPERATOR_COUNT;

/// Operator index as written in a descriptor. Anything outside
/// `0..OPERATOR_COUNT` names a missing operator.
pub type OperatorIndex = i64;

/// Maps a descriptor index to an operator slot, or `None` if no such
/// operator exists.
pub fn operator_slot(index: OperatorIndex) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < OPERATOR_COUNT)
}

/// Errors from decoding an algorithm descriptor.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// The descriptor is not valid JSON or has the wrong shape.
    #[error("invalid routing algorithm: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Modulation pairs and output set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingAlgorithm {
    /// `(modulator, carrier)` pairs, in build order.
    #[serde(rename = "mod", default)]
    pub modulations: Vec<(OperatorIndex, OperatorIndex)>,
    /// Operators routed to the output bus.
    #[serde(rename = "out", default)]
    pub outputs: Vec<OperatorIndex>,
}

impl Default for RoutingAlgorithm {
    /// Every operator straight to the output, no modulation.
    fn default() -> Self {
        Self {
            modulations: Vec::new(),
            outputs: (0..OPERATOR_COUNT as OperatorIndex).collect(),
        }
    }
}

impl RoutingAlgorithm {
    /// Creates an algorithm from pairs and outputs.
    pub fn new(
        modulations: impl Into<Vec<(OperatorIndex, OperatorIndex)>>,
        outputs: impl Into<Vec<OperatorIndex>>,
    ) -> Self {
        Self {
            modulations: modulations.into(),
            outputs: outputs.into(),
        }
    }

    /// Decodes the `{"mod": [[s, t], ...], "out": [i, ...]}` form.
    pub fn from_json(json: &str) -> Result<Self, AlgorithmError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes to the compact JSON form.
    pub fn to_json(&self) -> String {
        // Plain vectors of integers always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Modulation pairs that name a missing operator.
    pub fn invalid_modulations(&self) -> impl Iterator<Item = (OperatorIndex, OperatorIndex)> + '_ {
        self.modulations
            .iter()
            .copied()
            .filter(|&(s, t)| operator_slot(s).is_none() || operator_slot(t).is_none())
    }

    /// Outputs that name a missing operator.
    pub fn invalid_outputs(&self) -> impl Iterator<Item = OperatorIndex> + '_ {
        self.outputs
            .iter()
            .copied()
            .filter(|&i| operator_slot(i).is_none())
    }

    /// Returns `true` if every index names an operator.
    pub fn is_in_range(&self) -> bool {
        self.invalid_modulations().next().is_none() && self.invalid_outputs().next().is_none()
    }

    /// Returns `true` if the modulation pairs form a loop (self-modulation
    /// included). Such algorithms are built with delay nodes.
    pub fn has_feedback(&self) -> bool {
        let mut reach = [[false; OPERATOR_COUNT]; OPERATOR_COUNT];
        for &(s, t) in &self.modulations {
            if let (Some(s), Some(t)) = (operator_slot(s), operator_slot(t)) {
                reach[s][t] = true;
            }
        }
        // Warshall closure over the operator set.
        for k in 0..OPERATOR_COUNT {
            for i in 0..OPERATOR_COUNT {
                for j in 0..OPERATOR_COUNT {
                    reach[i][j] |= reach[i][k] && reach[k][j];
                }
            }
        }
        (0..OPERATOR_COUNT).any(|i| reach[i][i])
    }
}
