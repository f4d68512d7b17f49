//! FM chain builder.
//!
//! [`FmChain`] turns a [`RoutingAlgorithm`] into routing-graph operations.
//! For every modulation pair `(m, t)` it creates a modulation gain and wires
//!
//! ```text
//! osc[m] ──► mod_gain_m_t ──► osc[t].frequency
//! ```
//!
//! and for every output `i` it wires `osc[i] ──► carrier_gain_i ──► master`.
//! Feedback pairs are left to the graph, which routes the closing connection
//! through a delay node.
//!
//! Switching algorithms is a full teardown followed by a full rebuild; the
//! oscillators and carrier gains survive, modulation gains do not.

use std::collections::BTreeMap;

use drone_core::engine::{FREQUENCY, GAIN};
use drone_core::{AudioEngine, Connection, GraphError, NodeId, Primitive, RoutingGraph};

use crate::algorithm::{RoutingAlgorithm, operator_slot};
use crate::operator::{OPERATOR_COUNT, Operator, operators};

/// A modulation gain created for one `(source, target)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulationGain {
    /// Graph node.
    pub node: NodeId,
    /// Modulating operator.
    pub source: usize,
    /// Modulated operator. Its frequency sets the gain value.
    pub target: usize,
}

impl ModulationGain {
    /// Display name of the gain node.
    pub fn name(&self) -> String {
        modulation_gain_name(self.source, self.target)
    }
}

fn modulation_gain_name(source: usize, target: usize) -> String {
    format!("mod_gain_{source}_{target}")
}

/// What a rebuild produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSummary {
    /// Modulation pairs that were wired.
    pub modulation_paths: usize,
    /// Operators routed to the output.
    pub outputs: usize,
    /// Delay nodes the graph inserted while wiring.
    pub delays: Vec<NodeId>,
    /// Pairs and outputs skipped because an operator was missing.
    pub skipped: usize,
}

/// Four operators, their modulation gains, and the values that drive them.
#[derive(Debug, Clone)]
pub struct FmChain {
    operators: [Operator; OPERATOR_COUNT],
    modulation_gains: BTreeMap<(usize, usize), ModulationGain>,
    base_frequency: f32,
    modulation_depth: f32,
}

impl FmChain {
    /// Creates a chain with no nodes.
    pub fn new(base_frequency: f32, modulation_depth: f32, amplitude_factor: f32) -> Self {
        Self {
            operators: operators(amplitude_factor),
            modulation_gains: BTreeMap::new(),
            base_frequency,
            modulation_depth,
        }
    }

    /// Base frequency in Hz.
    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Modulation depth.
    pub fn modulation_depth(&self) -> f32 {
        self.modulation_depth
    }

    /// The operators.
    pub fn operators(&self) -> &[Operator; OPERATOR_COUNT] {
        &self.operators
    }

    /// Mutable access to the operators.
    pub fn operators_mut(&mut self) -> &mut [Operator; OPERATOR_COUNT] {
        &mut self.operators
    }

    /// Live modulation gains, ordered by `(source, target)`.
    pub fn modulation_gains(&self) -> impl Iterator<Item = &ModulationGain> {
        self.modulation_gains.values()
    }

    /// The modulation gain for one pair.
    pub fn modulation_gain(&self, source: usize, target: usize) -> Option<&ModulationGain> {
        self.modulation_gains.get(&(source, target))
    }

    /// Returns `true` while oscillator and carrier nodes exist.
    pub fn has_nodes(&self) -> bool {
        self.operators.iter().any(|op| op.osc.is_some())
    }

    /// Value of the modulation gain feeding operator `target`:
    /// `depth × (base × ratio + beat)`.
    pub fn modulation_level(&self, target: usize) -> f32 {
        self.operators
            .get(target)
            .map_or(0.0, |op| self.modulation_depth * op.frequency(self.base_frequency))
    }

    /// Creates an oscillator and a carrier gain for every operator.
    ///
    /// Oscillators start at their operator frequency; carrier gains at
    /// `level(amplitude)`.
    pub fn create_nodes<E: AudioEngine>(
        &mut self,
        graph: &mut RoutingGraph<E>,
        level: impl Fn(f32) -> f32,
    ) {
        for op in &mut self.operators {
            let osc = graph.add(
                Primitive::sine(op.frequency(self.base_frequency)),
                Some(&format!("osc_{}", op.index())),
            );
            let carrier = graph.add(
                Primitive::gain(level(op.amplitude().get())),
                Some(&format!("carrier_gain_{}", op.index())),
            );
            op.osc = Some(osc);
            op.carrier = Some(carrier);
        }
    }

    /// Tears the current routing down and builds `algorithm`.
    ///
    /// Carrier gains are connected to `master` when one is given. Missing
    /// operators are skipped; connection failures are logged by the graph and
    /// skipped as well, so a partial chain is still playable.
    pub fn rebuild<E: AudioEngine>(
        &mut self,
        graph: &mut RoutingGraph<E>,
        algorithm: &RoutingAlgorithm,
        master: Option<NodeId>,
    ) -> ChainSummary {
        self.teardown(graph);
        if let Err(err) = self.reset_frequencies(graph) {
            tracing::debug!("frequency reset incomplete: {err}");
        }

        let mut summary = ChainSummary::default();

        for &(raw_source, raw_target) in &algorithm.modulations {
            let slots = operator_slot(raw_source).zip(operator_slot(raw_target));
            let Some((source, target)) = slots else {
                tracing::debug!("skipping modulation {raw_source} -> {raw_target}: no such operator");
                summary.skipped += 1;
                continue;
            };
            if self.modulation_gains.contains_key(&(source, target)) {
                continue;
            }
            let (Some(from), Some(to)) = (self.osc(source), self.osc(target)) else {
                tracing::debug!("skipping modulation {source} -> {target}: operator has no nodes");
                summary.skipped += 1;
                continue;
            };

            let node = graph.add(
                Primitive::gain(self.modulation_level(target)),
                Some(&modulation_gain_name(source, target)),
            );
            let gain = ModulationGain {
                node,
                source,
                target,
            };
            self.modulation_gains.insert((source, target), gain);

            let wired = graph.connect(from, gain.node).and_then(|a| {
                graph
                    .connect_to_param(gain.node, to, FREQUENCY)
                    .map(|b| [a, b])
            });
            match wired {
                Ok(connections) => {
                    summary.modulation_paths += 1;
                    summary.delays.extend(connections.iter().filter_map(|c| match c {
                        Connection::ViaDelay(delay) => Some(*delay),
                        _ => None,
                    }));
                }
                Err(err) => tracing::debug!("modulation {source} -> {target} incomplete: {err}"),
            }
        }

        for &index in &algorithm.outputs {
            let Some((osc, carrier)) = operator_slot(index)
                .and_then(|slot| self.operators.get(slot))
                .and_then(|op| op.osc.zip(op.carrier))
            else {
                tracing::debug!("skipping output {index}: no such operator");
                summary.skipped += 1;
                continue;
            };
            let routed = graph.connect(osc, carrier).and_then(|_| match master {
                Some(master) => graph.connect(carrier, master).map(|_| ()),
                None => Ok(()),
            });
            match routed {
                Ok(()) => summary.outputs += 1,
                Err(err) => tracing::debug!("output {index} incomplete: {err}"),
            }
        }

        tracing::debug!(
            "chain built: {} modulation paths, {} outputs, {} delays, {} skipped",
            summary.modulation_paths,
            summary.outputs,
            summary.delays.len(),
            summary.skipped
        );
        summary
    }

    /// Disconnects every oscillator and carrier and removes every
    /// modulation gain. Oscillator and carrier nodes stay registered.
    pub fn teardown<E: AudioEngine>(&mut self, graph: &mut RoutingGraph<E>) {
        for op in &self.operators {
            for id in [op.osc, op.carrier].into_iter().flatten() {
                graph.disconnect(id, None);
            }
        }
        for gain in std::mem::take(&mut self.modulation_gains).into_values() {
            if let Err(err) = graph.remove_node(gain.node) {
                tracing::debug!("{} already gone: {err}", gain.name());
            }
        }
    }

    /// Tears down and removes the oscillator and carrier nodes.
    pub fn destroy_nodes<E: AudioEngine>(&mut self, graph: &mut RoutingGraph<E>) {
        self.teardown(graph);
        for op in &mut self.operators {
            for id in [op.osc.take(), op.carrier.take()].into_iter().flatten() {
                if let Err(err) = graph.remove_node(id) {
                    tracing::debug!("operator {} node already gone: {err}", op.index());
                }
            }
        }
    }

    /// Starts every oscillator.
    pub fn start_oscillators<E: AudioEngine>(
        &self,
        graph: &mut RoutingGraph<E>,
        when: Option<f64>,
    ) -> Result<(), GraphError> {
        for osc in self.operators.iter().filter_map(Operator::osc) {
            graph.start(osc, when)?;
        }
        Ok(())
    }

    /// Stops every oscillator. All are attempted; the first error is returned.
    pub fn stop_oscillators<E: AudioEngine>(
        &self,
        graph: &mut RoutingGraph<E>,
        when: Option<f64>,
    ) -> Result<(), GraphError> {
        let mut first = Ok(());
        for osc in self.operators.iter().filter_map(Operator::osc) {
            if let Err(err) = graph.stop(osc, when)
                && first.is_ok()
            {
                first = Err(err);
            }
        }
        first
    }

    /// Changes the base frequency of a live chain.
    ///
    /// Oscillators move to `f × ratio + beat`. Modulation gains move to
    /// `depth × f × ratio[target]`, without the beat offset.
    pub fn set_base_frequency<E: AudioEngine>(
        &mut self,
        graph: &mut RoutingGraph<E>,
        frequency: f32,
    ) -> Result<(), GraphError> {
        self.base_frequency = frequency;
        self.reset_frequencies(graph)?;
        for gain in self.modulation_gains.values() {
            let ratio = self.operators[gain.target].ratio();
            graph.set_param(gain.node, GAIN, self.modulation_depth * frequency * ratio)?;
        }
        Ok(())
    }

    /// Changes the modulation depth of a live chain.
    ///
    /// Every modulation gain moves to `depth × (base × ratio + beat)` of its
    /// target operator.
    pub fn set_modulation_depth<E: AudioEngine>(
        &mut self,
        graph: &mut RoutingGraph<E>,
        depth: f32,
    ) -> Result<(), GraphError> {
        self.modulation_depth = depth;
        for gain in self.modulation_gains.values() {
            graph.set_param(gain.node, GAIN, self.modulation_level(gain.target))?;
        }
        Ok(())
    }

    fn reset_frequencies<E: AudioEngine>(
        &self,
        graph: &mut RoutingGraph<E>,
    ) -> Result<(), GraphError> {
        for op in &self.operators {
            if let Some(osc) = op.osc {
                graph.set_param(osc, FREQUENCY, op.frequency(self.base_frequency))?;
            }
        }
        Ok(())
    }

    fn osc(&self, index: usize) -> Option<NodeId> {
        self.operators.get(index).and_then(Operator::osc)
    }
}
