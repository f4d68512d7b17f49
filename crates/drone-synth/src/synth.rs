//! The drone synthesizer.
//!
//! [`DroneSynth`] owns the routing graph (and through it the engine), the FM
//! chain, the output stage and the smoothing task. The signal path while
//! running is
//!
//! ```text
//! osc_i ──► carrier_gain_i ──► master_output ──► clipper ──► destination
//!   ▲
//!   └── mod_gain_m_i ◄── osc_m          (per modulation pair)
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start()──► Running ──stop()──► Idle
//! ```
//!
//! Engine oscillators can only be started once, so every `start()` creates a
//! fresh set of nodes and every `stop()` removes them.

use drone_core::engine::GAIN;
use drone_core::{
    AudioEngine, ControlSmoother, NodeId, PeriodicTask, Primitive, RoutingGraph, clip_curve,
    db_to_linear,
};

use crate::algorithm::RoutingAlgorithm;
use crate::chain::{ChainSummary, FmChain};
use crate::error::SynthError;
use crate::operator::{OPERATOR_COUNT, corner_weights};
use crate::smoothing::SmoothingSettings;

/// Default base frequency in Hz.
pub const DEFAULT_BASE_FREQUENCY: f32 = 55.0;
/// Default modulation depth.
pub const DEFAULT_MODULATION_DEPTH: f32 = 1.0;
/// Default master volume (linear).
pub const DEFAULT_VOLUME: f32 = 0.8;
/// Default clipper threshold.
pub const DEFAULT_CLIP_THRESHOLD: f32 = 0.8;
/// Number of points in the clipper transfer curve.
pub const CLIP_CURVE_POINTS: usize = 256;

/// Synth lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SynthState {
    /// No nodes exist.
    #[default]
    Idle,
    /// Nodes exist, oscillators are playing and smoothing is scheduled.
    Running,
}

/// Four-operator FM drone synthesizer.
///
/// # Example
///
/// ```rust
/// use drone_core::HeadlessEngine;
/// use drone_synth::{DroneSynth, RoutingAlgorithm};
///
/// let ring = RoutingAlgorithm::new([(0, 1), (1, 0)], [0, 1]);
/// let mut synth = DroneSynth::new(HeadlessEngine::new(), ring);
///
/// let summary = synth.start().unwrap();
/// assert_eq!(summary.delays.len(), 1);
///
/// synth.set_position(1.0, 0.0);
/// assert!(synth.tick().unwrap());
///
/// synth.stop().unwrap();
/// assert!(!synth.tick().unwrap());
/// ```
#[derive(Debug)]
pub struct DroneSynth<E: AudioEngine> {
    graph: RoutingGraph<E>,
    chain: FmChain,
    algorithm: RoutingAlgorithm,
    settings: SmoothingSettings,
    volume: ControlSmoother,
    clip_threshold: f32,
    destination: NodeId,
    master: Option<NodeId>,
    clipper: Option<NodeId>,
    smoothing: PeriodicTask,
    state: SynthState,
}

impl<E: AudioEngine> DroneSynth<E> {
    /// Creates an idle synth with default settings.
    pub fn new(engine: E, algorithm: RoutingAlgorithm) -> Self {
        Self::with_settings(engine, algorithm, SmoothingSettings::default())
    }

    /// Creates an idle synth with the given smoothing settings.
    ///
    /// The engine's destination is registered as a graph node right away and
    /// lives as long as the synth.
    pub fn with_settings(engine: E, algorithm: RoutingAlgorithm, settings: SmoothingSettings) -> Self {
        let mut graph = RoutingGraph::new(engine);
        let sink = graph.engine().destination();
        let destination = graph.create_node(sink, Some("destination"));
        Self {
            graph,
            chain: FmChain::new(
                DEFAULT_BASE_FREQUENCY,
                DEFAULT_MODULATION_DEPTH,
                settings.amplitude_factor,
            ),
            algorithm,
            settings,
            volume: ControlSmoother::new(DEFAULT_VOLUME, settings.volume_factor),
            clip_threshold: DEFAULT_CLIP_THRESHOLD,
            destination,
            master: None,
            clipper: None,
            smoothing: PeriodicTask::new("smoothing"),
            state: SynthState::Idle,
        }
    }

    // --- Lifecycle ---

    /// Builds the node graph and starts playing.
    ///
    /// A running synth is stopped first. Creates four oscillators and carrier
    /// gains, the master gain and the clipper, wires the output stage, builds
    /// the current algorithm, starts the oscillators and schedules smoothing.
    pub fn start(&mut self) -> Result<ChainSummary, SynthError> {
        if self.is_running()
            && let Err(err) = self.stop()
        {
            tracing::warn!("restart: previous stop incomplete: {err}");
        }
        self.release_nodes();

        let settings = self.settings;
        self.chain
            .create_nodes(&mut self.graph, |amplitude| settings.carrier_level(amplitude));

        let master = self
            .graph
            .add(Primitive::gain(self.volume.get()), Some("master_output"));
        let clipper = self.graph.add(
            Primitive::WaveShaper {
                curve: clip_curve(CLIP_CURVE_POINTS, self.clip_threshold),
            },
            Some("clipper"),
        );
        self.master = Some(master);
        self.clipper = Some(clipper);
        self.graph.connect(master, clipper)?;
        self.graph.connect(clipper, self.destination)?;

        let summary = self
            .chain
            .rebuild(&mut self.graph, &self.algorithm, Some(master));
        self.chain.start_oscillators(&mut self.graph, None)?;

        self.smoothing.schedule();
        self.state = SynthState::Running;
        tracing::info!(
            "synth started: {} nodes, {} connections",
            self.graph.node_count(),
            self.graph.connection_count()
        );
        self.graph.log_connections();
        Ok(summary)
    }

    /// Stops playing and removes every synth node.
    ///
    /// Smoothing is cancelled before anything is torn down. Stopping an idle
    /// synth does nothing.
    pub fn stop(&mut self) -> Result<(), SynthError> {
        self.smoothing.cancel();
        let stopped = if self.is_running() {
            self.chain.stop_oscillators(&mut self.graph, None)
        } else {
            Ok(())
        };
        self.release_nodes();
        if self.state == SynthState::Running {
            tracing::info!("synth stopped");
        }
        self.state = SynthState::Idle;
        stopped.map_err(SynthError::from)
    }

    fn release_nodes(&mut self) {
        self.chain.destroy_nodes(&mut self.graph);
        for id in [self.master.take(), self.clipper.take()].into_iter().flatten() {
            if let Err(err) = self.graph.remove_node(id) {
                tracing::debug!("output stage node already gone: {err}");
            }
        }
    }

    /// Runs one smoothing step.
    ///
    /// Moves operator amplitudes and master volume toward their targets and
    /// schedules the matching gain ramps `lookahead` seconds ahead. Returns
    /// `false` without doing anything when smoothing is not scheduled.
    pub fn tick(&mut self) -> Result<bool, SynthError> {
        if !self.smoothing.poll() {
            return Ok(false);
        }
        let at = self.graph.current_time() + self.settings.lookahead;
        let time_constant = self.settings.time_constant;

        for op in self.chain.operators_mut() {
            let amplitude = op.amplitude_mut().advance();
            if let Some(carrier) = op.carrier() {
                let level = self.settings.carrier_level(amplitude);
                self.graph.ramp_param(carrier, GAIN, level, at, time_constant)?;
            }
        }

        let volume = self.volume.advance();
        if let Some(master) = self.master {
            self.graph.ramp_param(master, GAIN, volume, at, time_constant)?;
        }
        Ok(true)
    }

    // --- Routing ---

    /// Switches the routing algorithm.
    ///
    /// While running, the chain is torn down and rebuilt immediately and the
    /// rebuild summary is returned. While idle, the algorithm is only stored.
    pub fn set_algorithm(&mut self, algorithm: RoutingAlgorithm) -> Option<ChainSummary> {
        tracing::info!("switching to algorithm {}", algorithm.to_json());
        self.algorithm = algorithm;
        if !self.is_running() {
            return None;
        }
        let summary = self
            .chain
            .rebuild(&mut self.graph, &self.algorithm, self.master);
        tracing::info!(
            "graph after algorithm change: {} connections",
            self.graph.connection_count()
        );
        self.graph.log_connections();
        Some(summary)
    }

    /// Decodes a JSON algorithm descriptor and switches to it.
    pub fn set_algorithm_json(&mut self, json: &str) -> Result<Option<ChainSummary>, SynthError> {
        let algorithm = RoutingAlgorithm::from_json(json)?;
        Ok(self.set_algorithm(algorithm))
    }

    // --- Parameters ---

    /// Sets the base frequency; live nodes follow immediately.
    pub fn set_base_frequency(&mut self, frequency: f32) -> Result<(), SynthError> {
        self.chain.set_base_frequency(&mut self.graph, frequency)?;
        Ok(())
    }

    /// Sets the modulation depth; live modulation gains follow immediately.
    pub fn set_modulation_depth(&mut self, depth: f32) -> Result<(), SynthError> {
        self.chain.set_modulation_depth(&mut self.graph, depth)?;
        Ok(())
    }

    /// Sets the master volume in dB.
    ///
    /// With `immediate`, the smoothed value jumps as well; otherwise smoothing
    /// glides toward it.
    pub fn set_volume_db(&mut self, db: f32, immediate: bool) {
        self.set_volume(db_to_linear(db), immediate);
    }

    /// Sets the master volume as a linear gain.
    pub fn set_volume(&mut self, linear: f32, immediate: bool) {
        if immediate {
            self.volume.set_immediate(linear);
        } else {
            self.volume.set_target(linear);
        }
    }

    /// Sets target amplitudes from a normalized 2-D position.
    ///
    /// See [`corner_weights`].
    pub fn set_position(&mut self, x: f32, y: f32) {
        let weights = corner_weights(x, y);
        for (op, weight) in self.chain.operators_mut().iter_mut().zip(weights) {
            op.amplitude_mut().set_target(weight);
        }
    }

    /// Sets one operator's target amplitude.
    pub fn set_target_amplitude(&mut self, index: usize, amplitude: f32) -> Result<(), SynthError> {
        self.operator_amplitude(index)?.set_target(amplitude);
        Ok(())
    }

    /// Sets one operator's amplitude with no glide.
    pub fn set_amplitude(&mut self, index: usize, amplitude: f32) -> Result<(), SynthError> {
        self.operator_amplitude(index)?.set_immediate(amplitude);
        Ok(())
    }

    fn operator_amplitude(&mut self, index: usize) -> Result<&mut ControlSmoother, SynthError> {
        self.chain
            .operators_mut()
            .get_mut(index)
            .map(|op| op.amplitude_mut())
            .ok_or(SynthError::NoSuchOperator {
                index,
                count: OPERATOR_COUNT,
            })
    }

    /// Sets the clipper threshold. Takes effect on the next `start()`.
    pub fn set_clip_threshold(&mut self, threshold: f32) {
        self.clip_threshold = threshold.clamp(0.0, 1.0);
    }

    // --- Introspection ---

    /// Lifecycle state.
    pub fn state(&self) -> SynthState {
        self.state
    }

    /// Returns `true` while running.
    pub fn is_running(&self) -> bool {
        self.state == SynthState::Running
    }

    /// Current algorithm.
    pub fn algorithm(&self) -> &RoutingAlgorithm {
        &self.algorithm
    }

    /// The FM chain.
    pub fn chain(&self) -> &FmChain {
        &self.chain
    }

    /// The routing graph.
    pub fn graph(&self) -> &RoutingGraph<E> {
        &self.graph
    }

    /// Mutable routing graph, for hosts that need to drive the engine.
    pub fn graph_mut(&mut self) -> &mut RoutingGraph<E> {
        &mut self.graph
    }

    /// Smoothing settings.
    pub fn settings(&self) -> &SmoothingSettings {
        &self.settings
    }

    /// The smoothing task.
    pub fn smoothing_task(&self) -> &PeriodicTask {
        &self.smoothing
    }

    /// Current (smoothed) operator amplitudes.
    pub fn amplitudes(&self) -> [f32; OPERATOR_COUNT] {
        core::array::from_fn(|i| self.chain.operators()[i].amplitude().get())
    }

    /// Target operator amplitudes.
    pub fn target_amplitudes(&self) -> [f32; OPERATOR_COUNT] {
        core::array::from_fn(|i| self.chain.operators()[i].amplitude().target())
    }

    /// Current (smoothed) master volume, linear.
    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Target master volume, linear.
    pub fn target_volume(&self) -> f32 {
        self.volume.target()
    }

    /// Clipper threshold.
    pub fn clip_threshold(&self) -> f32 {
        self.clip_threshold
    }

    /// Engine destination node.
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Master gain node, while running.
    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    /// Clipper node, while running.
    pub fn clipper(&self) -> Option<NodeId> {
        self.clipper
    }
}

#[cfg(test)]
mod tests {
    use drone_core::{HeadlessEngine, TaskState};

    use super::*;

    fn synth() -> DroneSynth<HeadlessEngine> {
        DroneSynth::new(HeadlessEngine::new(), RoutingAlgorithm::default())
    }

    #[test]
    fn idle_synth_has_only_the_destination() {
        let s = synth();
        assert_eq!(s.state(), SynthState::Idle);
        assert_eq!(s.graph().node_count(), 1);
        assert_eq!(
            s.graph().node(s.destination()).unwrap().name(),
            "destination"
        );
        assert!(s.master().is_none());
    }

    #[test]
    fn start_builds_output_stage() {
        let mut s = synth();
        s.start().unwrap();
        let master = s.master().unwrap();
        let clipper = s.clipper().unwrap();

        assert!(s.graph().contains_edge(master, clipper));
        assert!(s.graph().contains_edge(clipper, s.destination()));
        assert_eq!(s.graph().param(master, GAIN), Some(DEFAULT_VOLUME));
        let handle = *s.graph().node(clipper).unwrap().handle();
        assert_eq!(s.graph().engine().curve(&handle).unwrap().len(), CLIP_CURVE_POINTS);
        assert_eq!(s.smoothing_task().state(), TaskState::Scheduled);
    }

    #[test]
    fn stop_cancels_smoothing_and_releases_nodes() {
        let mut s = synth();
        s.start().unwrap();
        s.stop().unwrap();

        assert_eq!(s.state(), SynthState::Idle);
        assert_eq!(s.smoothing_task().state(), TaskState::Cancelled);
        assert_eq!(s.graph().node_count(), 1);
        assert_eq!(s.graph().connection_count(), 0);
        assert_eq!(s.graph().engine().live_count(), 1);
        assert!(!s.tick().unwrap());
    }

    #[test]
    fn stop_while_idle_is_a_no_op() {
        let mut s = synth();
        s.stop().unwrap();
        assert_eq!(s.smoothing_task().state(), TaskState::Idle);
    }

    #[test]
    fn restart_replaces_every_node() {
        let mut s = synth();
        s.start().unwrap();
        let first_master = s.master().unwrap();
        let nodes = s.graph().node_count();

        s.start().unwrap();
        assert_ne!(s.master(), Some(first_master));
        assert!(!s.graph().contains(first_master));
        assert_eq!(s.graph().node_count(), nodes);
        assert_eq!(s.smoothing_task().generation(), 2);
    }

    #[test]
    fn volume_db_converts_to_linear() {
        let mut s = synth();
        s.set_volume_db(-6.0206, false);
        assert!((s.target_volume() - 0.5).abs() < 1e-3);
        assert_eq!(s.volume(), DEFAULT_VOLUME);

        s.set_volume_db(0.0, true);
        assert!((s.volume() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn target_amplitude_rejects_missing_operator() {
        let mut s = synth();
        s.set_target_amplitude(2, 0.9).unwrap();
        assert_eq!(s.target_amplitudes()[2], 0.9);
        assert!(matches!(
            s.set_target_amplitude(4, 0.5),
            Err(SynthError::NoSuchOperator { index: 4, count: 4 })
        ));
    }

    #[test]
    fn idle_algorithm_switch_only_stores() {
        let mut s = synth();
        let ring = RoutingAlgorithm::new([(0, 1), (1, 0)], [0]);
        assert!(s.set_algorithm(ring.clone()).is_none());
        assert_eq!(s.algorithm(), &ring);
        assert_eq!(s.graph().node_count(), 1);
    }
}
