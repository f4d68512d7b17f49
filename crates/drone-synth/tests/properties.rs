//! Property-based tests for algorithm switching.
//!
//! Random algorithms (including out-of-range indices and feedback) are
//! built, switched between and torn down; the graph must stay consistent.

use drone_core::HeadlessEngine;
use drone_synth::{DroneSynth, RoutingAlgorithm, operator_slot};
use proptest::prelude::*;

/// Indices from -1 to 5 so some pairs name missing operators.
fn algorithm() -> impl Strategy<Value = RoutingAlgorithm> {
    (
        prop::collection::vec((-1i64..6, -1i64..6), 0..10),
        prop::collection::vec(-1i64..6, 0..6),
    )
        .prop_map(|(modulations, outputs)| RoutingAlgorithm {
            modulations,
            outputs,
        })
}

fn shape(synth: &DroneSynth<HeadlessEngine>) -> (usize, usize, usize) {
    let g = synth.graph();
    (g.node_count(), g.connection_count(), g.delay_nodes().count())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A → B → A leaves the graph exactly as A alone did.
    #[test]
    fn switching_back_restores_baseline(a in algorithm(), b in algorithm()) {
        let mut synth = DroneSynth::new(HeadlessEngine::new(), a.clone());
        synth.start().unwrap();
        let baseline = shape(&synth);

        synth.set_algorithm(b);
        synth.set_algorithm(a);
        prop_assert_eq!(shape(&synth), baseline);
    }

    /// One modulation gain per distinct in-range pair, and every modulation
    /// gain feeds the operator named by its target.
    #[test]
    fn modulation_gains_match_the_algorithm(a in algorithm()) {
        let mut synth = DroneSynth::new(HeadlessEngine::new(), a.clone());
        synth.start().unwrap();

        let mut pairs: Vec<(usize, usize)> = a
            .modulations
            .iter()
            .filter_map(|&(s, t)| operator_slot(s).zip(operator_slot(t)))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        prop_assert_eq!(synth.chain().modulation_gains().count(), pairs.len());

        for gain in synth.chain().modulation_gains() {
            let target = synth.chain().operators()[gain.target].osc().unwrap();
            let g = synth.graph();
            prop_assert!(g.contains_edge(gain.node, target) || g.find_delay(gain.node, target).is_some());
        }
    }

    /// Stopping always returns the engine to just its sink.
    #[test]
    fn stop_releases_everything(a in algorithm(), b in algorithm()) {
        let mut synth = DroneSynth::new(HeadlessEngine::new(), a);
        synth.start().unwrap();
        synth.set_algorithm(b);
        synth.stop().unwrap();

        prop_assert_eq!(synth.graph().node_count(), 1);
        prop_assert_eq!(synth.graph().connection_count(), 0);
        prop_assert_eq!(synth.graph().engine().live_count(), 1);
    }
}
