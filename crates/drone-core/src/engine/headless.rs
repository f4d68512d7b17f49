//! State-tracking engine with no audio output.

use std::collections::{BTreeMap, BTreeSet};

use libm::exp;

use crate::graph::NodeKind;

use super::{
    AudioEngine, DELAY_TIME, DETUNE, EngineError, FREQUENCY, GAIN, Port, Primitive,
    PrimitiveHandle,
};

/// Handle into a [`HeadlessEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessHandle {
    index: u32,
    kind: NodeKind,
}

impl HeadlessHandle {
    /// Slot index inside the engine.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
}

impl PrimitiveHandle for HeadlessHandle {
    fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// A pending `set_target_at_time` ramp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    /// Value approached.
    pub target: f32,
    /// Engine time the approach begins.
    pub start_time: f64,
    /// Exponential time constant in seconds.
    pub time_constant: f64,
}

#[derive(Clone, Debug)]
struct ParamState {
    /// Value at the moment the ramp (if any) was scheduled.
    value: f32,
    ramp: Option<Ramp>,
}

impl ParamState {
    fn new(value: f32) -> Self {
        Self { value, ramp: None }
    }

    fn value_at(&self, time: f64) -> f32 {
        match self.ramp {
            Some(ramp) if time >= ramp.start_time && ramp.time_constant > 0.0 => {
                let decay = exp(-(time - ramp.start_time) / ramp.time_constant) as f32;
                ramp.target + (self.value - ramp.target) * decay
            }
            Some(ramp) if time >= ramp.start_time => ramp.target,
            _ => self.value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Playback {
    Idle,
    Started(f64),
    Stopped { started: f64, stopped: f64 },
}

#[derive(Debug)]
struct PrimitiveState {
    kind: NodeKind,
    params: BTreeMap<&'static str, ParamState>,
    outputs: Vec<(u32, Port)>,
    playback: Playback,
    curve: Vec<f32>,
}

/// An [`AudioEngine`] that records state instead of rendering audio.
///
/// Time only moves when [`advance`](Self::advance) is called, so scheduled
/// parameter ramps can be observed deterministically. Connections into
/// specific primitives can be made to fail with
/// [`reject_connections_to`](Self::reject_connections_to).
#[derive(Debug)]
pub struct HeadlessEngine {
    primitives: Vec<Option<PrimitiveState>>,
    destination: HeadlessHandle,
    time: f64,
    connect_calls: usize,
    rejected: BTreeSet<u32>,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    /// Creates an engine holding only its output sink.
    pub fn new() -> Self {
        let sink = PrimitiveState {
            kind: NodeKind::Other,
            params: BTreeMap::new(),
            outputs: Vec::new(),
            playback: Playback::Idle,
            curve: Vec::new(),
        };
        Self {
            primitives: vec![Some(sink)],
            destination: HeadlessHandle {
                index: 0,
                kind: NodeKind::Other,
            },
            time: 0.0,
            connect_calls: 0,
            rejected: BTreeSet::new(),
        }
    }

    /// Moves the engine clock forward.
    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds.max(0.0);
    }

    /// Number of primitive-level connect calls issued so far (including failures).
    pub fn connect_calls(&self) -> usize {
        self.connect_calls
    }

    /// Number of live primitives, including the destination.
    pub fn live_count(&self) -> usize {
        self.primitives.iter().flatten().count()
    }

    /// Returns `true` if the handle still refers to a live primitive.
    pub fn is_live(&self, handle: &HeadlessHandle) -> bool {
        self.state(handle).is_some()
    }

    /// Primitive-level outputs of `handle`.
    pub fn outputs(&self, handle: &HeadlessHandle) -> Vec<(HeadlessHandle, Port)> {
        let Some(state) = self.state(handle) else {
            return Vec::new();
        };
        state
            .outputs
            .iter()
            .filter_map(|(index, port)| {
                let kind = self.primitives.get(*index as usize)?.as_ref()?.kind;
                Some((
                    HeadlessHandle {
                        index: *index,
                        kind,
                    },
                    port.clone(),
                ))
            })
            .collect()
    }

    /// Returns `true` if the source was started and not yet stopped.
    pub fn is_playing(&self, handle: &HeadlessHandle) -> bool {
        self.state(handle)
            .is_some_and(|s| matches!(s.playback, Playback::Started(_)))
    }

    /// Returns `true` if the source was stopped.
    pub fn is_stopped(&self, handle: &HeadlessHandle) -> bool {
        self.state(handle)
            .is_some_and(|s| matches!(s.playback, Playback::Stopped { .. }))
    }

    /// Engine times a source was started and stopped at.
    pub fn playback_window(&self, handle: &HeadlessHandle) -> Option<(f64, Option<f64>)> {
        match self.state(handle)?.playback {
            Playback::Idle => None,
            Playback::Started(started) => Some((started, None)),
            Playback::Stopped { started, stopped } => Some((started, Some(stopped))),
        }
    }

    /// Pending ramp on a parameter.
    pub fn ramp(&self, handle: &HeadlessHandle, name: &str) -> Option<Ramp> {
        self.state(handle)?.params.get(name)?.ramp
    }

    /// Transfer curve of a wave-shaper.
    pub fn curve(&self, handle: &HeadlessHandle) -> Option<&[f32]> {
        self.state(handle)
            .filter(|s| s.kind == NodeKind::WaveShaper)
            .map(|s| s.curve.as_slice())
    }

    /// Makes every subsequent connect into `handle` fail.
    pub fn reject_connections_to(&mut self, handle: &HeadlessHandle) {
        self.rejected.insert(handle.index);
    }

    /// Clears all injected connection failures.
    pub fn accept_all_connections(&mut self) {
        self.rejected.clear();
    }

    fn state(&self, handle: &HeadlessHandle) -> Option<&PrimitiveState> {
        self.primitives.get(handle.index as usize)?.as_ref()
    }

    fn state_mut(&mut self, handle: &HeadlessHandle) -> Result<&mut PrimitiveState, EngineError> {
        self.primitives
            .get_mut(handle.index as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| EngineError::UnknownPrimitive(format!("{handle:?}")))
    }

    fn param_state_mut(
        &mut self,
        handle: &HeadlessHandle,
        name: &str,
    ) -> Result<&mut ParamState, EngineError> {
        let state = self.state_mut(handle)?;
        let kind = state.kind;
        state
            .params
            .get_mut(name)
            .ok_or_else(|| EngineError::NoSuchParam {
                kind,
                param: name.to_string(),
            })
    }
}

impl AudioEngine for HeadlessEngine {
    type Handle = HeadlessHandle;

    fn create(&mut self, primitive: Primitive) -> HeadlessHandle {
        let kind = primitive.kind();
        let mut params = BTreeMap::new();
        let mut curve = Vec::new();
        match primitive {
            Primitive::Oscillator { frequency, .. } => {
                params.insert(FREQUENCY, ParamState::new(frequency));
                params.insert(DETUNE, ParamState::new(0.0));
            }
            Primitive::Gain { gain } => {
                params.insert(GAIN, ParamState::new(gain));
            }
            Primitive::Delay { delay_time } => {
                params.insert(DELAY_TIME, ParamState::new(delay_time));
            }
            Primitive::WaveShaper { curve: shape } => curve = shape,
        }

        let index = self.primitives.len() as u32;
        self.primitives.push(Some(PrimitiveState {
            kind,
            params,
            outputs: Vec::new(),
            playback: Playback::Idle,
            curve,
        }));
        HeadlessHandle { index, kind }
    }

    fn destination(&self) -> HeadlessHandle {
        self.destination
    }

    fn connect(
        &mut self,
        source: &HeadlessHandle,
        destination: &HeadlessHandle,
        port: &Port,
    ) -> Result<(), EngineError> {
        self.connect_calls += 1;

        let target = self
            .state(destination)
            .ok_or_else(|| EngineError::UnknownPrimitive(format!("{destination:?}")))?;
        if let Port::Param(name) = port
            && !target.params.contains_key(name.as_str())
        {
            return Err(EngineError::NoSuchParam {
                kind: target.kind,
                param: name.clone(),
            });
        }
        if self.rejected.contains(&destination.index) {
            return Err(EngineError::Rejected(format!(
                "{} input refused",
                destination.kind
            )));
        }

        let is_sink = source.index == self.destination.index;
        let state = self.state_mut(source)?;
        if is_sink {
            return Err(EngineError::NoOutput(state.kind));
        }
        let entry = (destination.index, port.clone());
        if !state.outputs.contains(&entry) {
            state.outputs.push(entry);
        }
        Ok(())
    }

    fn disconnect(&mut self, source: &HeadlessHandle, destination: Option<(&HeadlessHandle, &Port)>) {
        let Ok(state) = self.state_mut(source) else {
            return;
        };
        match destination {
            Some((target, port)) => state
                .outputs
                .retain(|(index, p)| !(*index == target.index && p == port)),
            None => state.outputs.clear(),
        }
    }

    fn param(&self, handle: &HeadlessHandle, name: &str) -> Option<f32> {
        let param = self.state(handle)?.params.get(name)?;
        Some(param.value_at(self.time))
    }

    fn set_param(
        &mut self,
        handle: &HeadlessHandle,
        name: &str,
        value: f32,
    ) -> Result<(), EngineError> {
        let param = self.param_state_mut(handle, name)?;
        param.value = value;
        param.ramp = None;
        Ok(())
    }

    fn set_target_at_time(
        &mut self,
        handle: &HeadlessHandle,
        name: &str,
        target: f32,
        start_time: f64,
        time_constant: f64,
    ) -> Result<(), EngineError> {
        let now = self.time;
        let param = self.param_state_mut(handle, name)?;
        // One pending ramp per parameter: re-anchor at the current value.
        param.value = param.value_at(now);
        param.ramp = Some(Ramp {
            target,
            start_time: start_time.max(now),
            time_constant,
        });
        Ok(())
    }

    fn start(&mut self, handle: &HeadlessHandle, when: Option<f64>) -> Result<(), EngineError> {
        let at = when.unwrap_or(self.time).max(self.time);
        let state = self.state_mut(handle)?;
        if !state.kind.is_source() {
            return Err(EngineError::NotASource(state.kind));
        }
        match state.playback {
            Playback::Idle => {
                state.playback = Playback::Started(at);
                Ok(())
            }
            _ => Err(EngineError::AlreadyStarted),
        }
    }

    fn stop(&mut self, handle: &HeadlessHandle, when: Option<f64>) -> Result<(), EngineError> {
        let at = when.unwrap_or(self.time).max(self.time);
        let state = self.state_mut(handle)?;
        if !state.kind.is_source() {
            return Err(EngineError::NotASource(state.kind));
        }
        match state.playback {
            Playback::Started(started) => {
                state.playback = Playback::Stopped {
                    started,
                    stopped: at,
                };
                Ok(())
            }
            Playback::Idle => Err(EngineError::NotStarted),
            Playback::Stopped { .. } => Ok(()),
        }
    }

    fn release(&mut self, handle: &HeadlessHandle) {
        if handle.index == self.destination.index {
            return;
        }
        if let Some(slot) = self.primitives.get_mut(handle.index as usize) {
            *slot = None;
        }
        for state in self.primitives.iter_mut().flatten() {
            state.outputs.retain(|(index, _)| *index != handle.index);
        }
        self.rejected.remove(&handle.index);
    }

    fn current_time(&self) -> f64 {
        self.time
    }
}
