//! Synth error type.

use drone_core::GraphError;
use thiserror::Error;

use crate::algorithm::AlgorithmError;

/// Errors from synth lifecycle and control calls.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A graph operation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// An algorithm descriptor could not be decoded.
    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    /// Operator index out of range.
    #[error("no operator {index} (synth has {count})")]
    NoSuchOperator {
        /// Requested index.
        index: usize,
        /// Number of operators.
        count: usize,
    },
}
