//! Factory routing algorithms bundled with drone.
//!
//! These are always available by name, without any file on disk. Each is
//! stored in the same JSON form hosts exchange, so the table doubles as a set
//! of descriptor examples.

use drone_synth::RoutingAlgorithm;

/// A named factory algorithm.
#[derive(Debug, Clone, Copy)]
pub struct FactoryAlgorithm {
    /// Lookup name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// JSON descriptor.
    pub json: &'static str,
}

impl FactoryAlgorithm {
    /// Decodes the descriptor.
    pub fn algorithm(&self) -> RoutingAlgorithm {
        // Factory descriptors are checked by tests; fall back to the
        // all-carriers default rather than panic.
        RoutingAlgorithm::from_json(self.json).unwrap_or_default()
    }
}

/// Every factory algorithm, in display order.
pub static FACTORY_ALGORITHMS: &[FactoryAlgorithm] = &[
    FactoryAlgorithm {
        name: "parallel",
        description: "Four carriers, no modulation",
        json: r#"{"mod": [], "out": [0, 1, 2, 3]}"#,
    },
    FactoryAlgorithm {
        name: "stack",
        description: "3 -> 2 -> 1 -> 0, operator 0 heard",
        json: r#"{"mod": [[3, 2], [2, 1], [1, 0]], "out": [0]}"#,
    },
    FactoryAlgorithm {
        name: "pairs",
        description: "Two modulator/carrier pairs",
        json: r#"{"mod": [[1, 0], [3, 2]], "out": [0, 2]}"#,
    },
    FactoryAlgorithm {
        name: "feedback_pair",
        description: "Operators 0 and 1 modulate each other",
        json: r#"{"mod": [[0, 1], [1, 0]], "out": [0, 1]}"#,
    },
    FactoryAlgorithm {
        name: "ring",
        description: "Each operator modulates the next, all heard",
        json: r#"{"mod": [[0, 1], [1, 2], [2, 3], [3, 0]], "out": [0, 1, 2, 3]}"#,
    },
    FactoryAlgorithm {
        name: "cross",
        description: "Two crossed feedback loops, all heard",
        json: r#"{"mod": [[0, 2], [1, 3], [2, 0], [3, 1]], "out": [0, 1, 2, 3]}"#,
    },
    FactoryAlgorithm {
        name: "self_feedback",
        description: "Operator 0 modulates itself and is shaped by 1",
        json: r#"{"mod": [[0, 0], [1, 0]], "out": [0, 1]}"#,
    },
];

/// Name of the algorithm used when none is configured.
pub const DEFAULT_ALGORITHM: &str = "cross";

/// Looks up a factory algorithm by name (case-insensitive).
pub fn get_factory_algorithm(name: &str) -> Option<RoutingAlgorithm> {
    FACTORY_ALGORITHMS
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
        .map(FactoryAlgorithm::algorithm)
}

/// Returns `true` if `name` is a factory algorithm.
pub fn is_factory_algorithm(name: &str) -> bool {
    FACTORY_ALGORITHMS
        .iter()
        .any(|f| f.name.eq_ignore_ascii_case(name))
}

/// Factory algorithm names, in display order.
pub fn factory_algorithm_names() -> Vec<&'static str> {
    FACTORY_ALGORITHMS.iter().map(|f| f.name).collect()
}
