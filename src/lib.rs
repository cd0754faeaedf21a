#![no_std]

pub mod actuation;
pub mod engine;
pub mod error;
pub mod registry;
pub mod sequence;
pub mod sequencer;
pub mod session;

pub use actuation::{ActuationCall, ActuationChannel, ActuationReceiver, ActuationWorker};
pub use engine::{DEFAULT_MIN_WAIT, HapticEngine};
pub use error::EngineError;
pub use registry::{EffectEntry, EffectRegistry};
pub use sequence::{
    EffectSequence, MAX_EFFECT_NAME_LEN, MAX_SEQUENCE_LEN, SequenceKind, StepOutcome, step,
};
pub use sequencer::{Rearm, Sequencer, TimerCommand};
pub use session::{FireToken, PlaybackMode, VibrationMode};

pub use embassy_time::Duration;

/// Abstract actuator driver trait
///
/// Implement this trait to support different vibration hardware: a
/// GPIO-switched motor, a haptic IC behind a bus, anything that can
/// start and stop. The engine is generic over this trait and only calls
/// it from the actuation worker's task.
pub trait Actuator {
    /// Error reported by the underlying hardware access.
    type Error: core::fmt::Debug;

    /// Drive the actuator on.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Trigger the built-in effect with the given code.
    fn start_effect(&mut self, code: u32) -> Result<(), Self::Error>;

    /// Drive the actuator off.
    fn stop(&mut self) -> Result<(), Self::Error>;
}
