//! Playback controller.
//!
//! Owns the session state machine and the client-facing start/stop
//! surface. Hardware work is posted to the deferred actuation queue and
//! timing is delegated to the [`Sequencer`](crate::sequencer::Sequencer)
//! task through arm/disarm commands, so every method here returns
//! without blocking.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use log::{debug, error, trace};

use crate::actuation::{ActuationCall, ActuationChannel};
use crate::error::EngineError;
use crate::registry::EffectRegistry;
use crate::sequence::{self, clamp_wait};
use crate::sequencer::{Rearm, TimerCommand};
use crate::session::{
    ActiveSequence, FireToken, PlaybackMode, PlaybackSession, VibrationMode,
};

/// Default floor for timer waits.
///
/// Also serves as the lead-in wait of a fixed-duration playback.
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_millis(50);

/// Playback controller for a single haptic actuator.
///
/// `EFFECT_CAPACITY` is the registry's sequence capacity and
/// `QUEUE_SIZE` the depth of the deferred actuation queue. One engine
/// drives one session at a time; a second start while one is running
/// fails with [`EngineError::Busy`].
///
/// The engine itself never sleeps and never calls the hardware. It is
/// safe to share by reference between client tasks, the sequencer task
/// and interrupt context.
pub struct HapticEngine<'a, const EFFECT_CAPACITY: usize, const QUEUE_SIZE: usize> {
    registry: &'a EffectRegistry<EFFECT_CAPACITY>,
    calls: &'a ActuationChannel<QUEUE_SIZE>,
    session: Mutex<RefCell<PlaybackSession<'a>>>,
    timer: Signal<CriticalSectionRawMutex, TimerCommand>,
    min_wait: Duration,
}

impl<'a, const EFFECT_CAPACITY: usize, const QUEUE_SIZE: usize>
    HapticEngine<'a, EFFECT_CAPACITY, QUEUE_SIZE>
{
    /// Create an idle engine over a loaded registry and a call queue.
    pub const fn new(
        registry: &'a EffectRegistry<EFFECT_CAPACITY>,
        calls: &'a ActuationChannel<QUEUE_SIZE>,
    ) -> Self {
        Self {
            registry,
            calls,
            session: Mutex::new(RefCell::new(PlaybackSession::idle())),
            timer: Signal::new(),
            min_wait: DEFAULT_MIN_WAIT,
        }
    }

    /// Replace the minimum timer wait.
    #[must_use]
    pub fn with_min_wait(mut self, min_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self
    }

    /// Minimum timer wait currently in force.
    pub const fn min_wait(&self) -> Duration {
        self.min_wait
    }

    /// Start a fixed-duration vibration.
    ///
    /// Synthesizes a two-step waveform (lead-in wait, then `duration_ms`
    /// of actuation) and arms the timer for the lead-in.
    pub fn start_once(&self, duration_ms: u32) -> Result<(), EngineError> {
        if duration_ms == 0 {
            return Err(EngineError::InvalidArgument);
        }
        let lead_in = self.min_wait_ms();
        let token = critical_section::with(|cs| {
            let mut session = self.session.borrow(cs).borrow_mut();
            if session.mode != PlaybackMode::Idle {
                return Err(EngineError::Busy);
            }
            if self.calls.is_full() {
                return Err(EngineError::ResourceExhausted);
            }
            Ok(session.begin(
                PlaybackMode::Once,
                ActiveSequence::Once([lead_in, duration_ms]),
            ))
        })?;
        self.timer.signal(TimerCommand::Arm(Rearm {
            wait: self.min_wait,
            token,
        }));
        debug!("once playback armed: {duration_ms} ms");
        Ok(())
    }

    /// Start a named preset sequence.
    pub fn start_preset(&self, name: &str) -> Result<(), EngineError> {
        if !self.registry.supports_presets() {
            return Err(EngineError::NotSupported);
        }
        let sequence = self
            .registry
            .lookup(name)
            .ok_or(EngineError::NotSupported)?;
        let values = sequence.values();
        if values.len() < 2 {
            return Err(EngineError::NotSupported);
        }
        let first_wait = clamp_wait(values[0], self.min_wait);
        let kind = sequence.kind();
        let token = critical_section::with(|cs| {
            let mut session = self.session.borrow(cs).borrow_mut();
            if session.mode != PlaybackMode::Idle {
                return Err(EngineError::Busy);
            }
            if self.calls.is_full() {
                return Err(EngineError::ResourceExhausted);
            }
            Ok(session.begin(
                PlaybackMode::Preset,
                ActiveSequence::Preset { kind, values },
            ))
        })?;
        self.timer.signal(TimerCommand::Arm(Rearm {
            wait: first_wait,
            token,
        }));
        debug!("preset playback armed: {name}");
        Ok(())
    }

    /// Stop the session the caller believes is running.
    ///
    /// A mode mismatch, including an already idle engine, is a
    /// successful no-op: stop is always safe to issue.
    pub fn stop(&self, expected: VibrationMode) -> Result<(), EngineError> {
        let stopped = critical_section::with(|cs| {
            let mut session = self.session.borrow(cs).borrow_mut();
            if !session.mode.matches(expected) {
                return false;
            }
            session.clear();
            true
        });
        if stopped {
            self.timer.signal(TimerCommand::Disarm);
            self.post(ActuationCall::Stop);
            debug!("{} playback stopped", expected.as_str());
        }
        Ok(())
    }

    /// Current playback state.
    pub fn mode(&self) -> PlaybackMode {
        critical_section::with(|cs| self.session.borrow(cs).borrow().mode)
    }

    /// Handle one timer expiry.
    ///
    /// Called by the sequencer task (or a custom timing loop) when the
    /// armed wait elapses. Posts the firing's actuation call and returns
    /// the next arm request, or `None` when the firing was stale or the
    /// sequence is done.
    pub fn on_timer_fired(&self, token: FireToken) -> Option<Rearm> {
        critical_section::with(|cs| {
            let mut session = self.session.borrow(cs).borrow_mut();
            let session = &mut *session;
            if session.mode == PlaybackMode::Idle || session.token != token {
                trace!("discarding stale timer firing");
                return None;
            }
            let (kind, values) = session.active.as_ref()?.parts();
            let step = sequence::step(kind, values, session.index, self.min_wait);
            session.index = step.next_index;
            // Posting stays inside the section: a concurrent stop only
            // runs once it ends, so its terminal call lands after ours.
            self.post(step.call);
            match step.rearm {
                Some(wait) => Some(Rearm {
                    wait,
                    token: session.token,
                }),
                None => {
                    // The final waveform toggle is already the stop.
                    if step.call != ActuationCall::Stop {
                        self.post(ActuationCall::Stop);
                    }
                    session.clear();
                    debug!("playback finished");
                    None
                }
            }
        })
    }

    /// Wait for the next arm/disarm request.
    ///
    /// Consumed by the sequencer task; a newer request replaces an
    /// unseen older one.
    pub async fn next_timer_command(&self) -> TimerCommand {
        self.timer.wait().await
    }

    /// Take a pending arm/disarm request without waiting.
    pub fn try_take_timer_command(&self) -> Option<TimerCommand> {
        self.timer.try_take()
    }

    /// Post a call to the deferred queue without blocking.
    fn post(&self, call: ActuationCall) {
        if self.calls.try_send(call).is_err() {
            error!("actuation queue full, dropping {call:?}");
        }
    }

    fn min_wait_ms(&self) -> u32 {
        u32::try_from(self.min_wait.as_millis()).unwrap_or(u32::MAX)
    }
}
