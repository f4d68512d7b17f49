//! Audio engine contract.
//!
//! The routing graph never touches audio samples. It drives an external engine
//! through the [`AudioEngine`] trait: create primitives, wire them together,
//! start and stop sources, and read or schedule parameter values. Primitives are
//! addressed by an engine-defined handle type that reports its [`NodeKind`].
//!
//! [`HeadlessEngine`] implements the contract without producing sound. It keeps
//! enough state (connections, parameter values, scheduled ramps, playback) to
//! run and test the graph and the synth without an audio host.

mod headless;

use core::fmt;

use thiserror::Error;

use crate::graph::NodeKind;

pub use headless::{HeadlessEngine, HeadlessHandle, Ramp};

/// Name of the oscillator frequency parameter.
pub const FREQUENCY: &str = "frequency";
/// Name of the oscillator detune parameter (cents).
pub const DETUNE: &str = "detune";
/// Name of the gain parameter.
pub const GAIN: &str = "gain";
/// Name of the delay time parameter (seconds).
pub const DELAY_TIME: &str = "delay_time";

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Pure sine.
    #[default]
    Sine,
    /// Triangle.
    Triangle,
    /// Sawtooth.
    Sawtooth,
    /// Square.
    Square,
}

/// Description of a primitive to create.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Oscillator at a fixed initial frequency.
    Oscillator {
        /// Waveform shape.
        waveform: Waveform,
        /// Initial frequency in Hz.
        frequency: f32,
    },
    /// Gain stage.
    Gain {
        /// Initial linear gain.
        gain: f32,
    },
    /// Delay line.
    Delay {
        /// Delay time in seconds. Zero means the engine's minimum (one block).
        delay_time: f32,
    },
    /// Wave-shaper with a transfer curve spanning input range [-1, 1].
    WaveShaper {
        /// Transfer curve samples.
        curve: Vec<f32>,
    },
}

impl Primitive {
    /// Sine oscillator at `frequency` Hz.
    pub fn sine(frequency: f32) -> Self {
        Self::Oscillator {
            waveform: Waveform::Sine,
            frequency,
        }
    }

    /// Gain stage at `gain`.
    pub fn gain(gain: f32) -> Self {
        Self::Gain { gain }
    }

    /// Minimum-length delay used to break feedback loops.
    pub fn unit_delay() -> Self {
        Self::Delay { delay_time: 0.0 }
    }

    /// Kind of node this primitive becomes.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Oscillator { .. } => NodeKind::Oscillator,
            Self::Gain { .. } => NodeKind::Gain,
            Self::Delay { .. } => NodeKind::Delay,
            Self::WaveShaper { .. } => NodeKind::WaveShaper,
        }
    }
}

/// Input addressed by a connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    /// The node's signal input.
    Input,
    /// A named control parameter of the node.
    Param(String),
}

impl Port {
    /// Parameter name, if this port is a parameter.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Input => None,
            Self::Param(name) => Some(name),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => Ok(()),
            Self::Param(name) => write!(f, ".{name}"),
        }
    }
}

/// Errors reported by an engine for a single primitive operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The handle does not refer to a live primitive.
    #[error("unknown primitive {0}")]
    UnknownPrimitive(String),
    /// The primitive has no signal output.
    #[error("{0} has no output")]
    NoOutput(NodeKind),
    /// The primitive has no parameter with this name.
    #[error("{kind} has no parameter '{param}'")]
    NoSuchParam {
        /// Kind of primitive that was addressed.
        kind: NodeKind,
        /// Requested parameter name.
        param: String,
    },
    /// Start/stop called on a primitive that is not a source.
    #[error("{0} is not a source")]
    NotASource(NodeKind),
    /// A source can only be started once.
    #[error("source already started")]
    AlreadyStarted,
    /// Stop called before start.
    #[error("source not started")]
    NotStarted,
    /// The engine refused the connection.
    #[error("connection rejected: {0}")]
    Rejected(String),
}

/// Handle to a primitive owned by an engine.
pub trait PrimitiveHandle: Clone + fmt::Debug {
    /// Kind of the primitive, fixed at creation.
    fn kind(&self) -> NodeKind;
}

/// Capability contract of an audio engine.
///
/// One engine instance is created by the host and moved into the
/// [`RoutingGraph`](crate::graph::RoutingGraph), which is then the only caller.
pub trait AudioEngine {
    /// Handle type identifying a primitive.
    type Handle: PrimitiveHandle;

    /// Creates a primitive and returns its handle.
    fn create(&mut self, primitive: Primitive) -> Self::Handle;

    /// The engine's final output sink.
    fn destination(&self) -> Self::Handle;

    /// Connects the output of `source` to `port` of `destination`.
    fn connect(
        &mut self,
        source: &Self::Handle,
        destination: &Self::Handle,
        port: &Port,
    ) -> Result<(), EngineError>;

    /// Disconnects `source` from one input, or from everything when `None`.
    fn disconnect(&mut self, source: &Self::Handle, destination: Option<(&Self::Handle, &Port)>);

    /// Current value of a numeric parameter, or `None` if it does not exist.
    fn param(&self, handle: &Self::Handle, name: &str) -> Option<f32>;

    /// Sets a parameter immediately, cancelling any scheduled ramp.
    fn set_param(&mut self, handle: &Self::Handle, name: &str, value: f32)
    -> Result<(), EngineError>;

    /// Schedules an exponential approach to `target` starting at `start_time`.
    fn set_target_at_time(
        &mut self,
        handle: &Self::Handle,
        name: &str,
        target: f32,
        start_time: f64,
        time_constant: f64,
    ) -> Result<(), EngineError>;

    /// Starts a source at `when` (engine time), or immediately.
    fn start(&mut self, handle: &Self::Handle, when: Option<f64>) -> Result<(), EngineError>;

    /// Stops a source at `when` (engine time), or immediately.
    fn stop(&mut self, handle: &Self::Handle, when: Option<f64>) -> Result<(), EngineError>;

    /// Frees a primitive. The handle must not be used afterwards.
    fn release(&mut self, handle: &Self::Handle);

    /// Engine clock in seconds.
    fn current_time(&self) -> f64;
}
