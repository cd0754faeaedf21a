//! Effect sequences and the stepping rule that plays them.
//!
//! A sequence is a flat list of `u32` values whose meaning depends on its
//! kind. Stepping is a pure function of (kind, values, cursor); the
//! controller owns the cursor and the timer, this module only decides what
//! a single firing does.

use embassy_time::Duration;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::actuation::ActuationCall;

/// Maximum number of values a single effect sequence may hold.
pub const MAX_SEQUENCE_LEN: usize = 64;

/// Maximum length of an effect name, in bytes.
pub const MAX_EFFECT_NAME_LEN: usize = 48;

/// How the values of an effect sequence are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Every value is a wait in milliseconds. Each firing toggles the
    /// actuator: even cursor positions switch it on, odd ones switch it
    /// off.
    TimedWaveform,
    /// Wait/effect pairs. Even positions hold waits in milliseconds, odd
    /// positions hold opaque effect codes understood by the actuator IC.
    EffectCodeList,
}

/// Configuration tag for [`SequenceKind::TimedWaveform`].
pub const SEQUENCE_KIND_RAW_WAVEFORM: u32 = 0;
/// Configuration tag for [`SequenceKind::EffectCodeList`].
pub const SEQUENCE_KIND_RAW_CODES: u32 = 1;

impl SequenceKind {
    /// Decode a kind from its configuration tag.
    pub const fn from_raw(value: u32) -> Option<Self> {
        match value {
            SEQUENCE_KIND_RAW_WAVEFORM => Some(Self::TimedWaveform),
            SEQUENCE_KIND_RAW_CODES => Some(Self::EffectCodeList),
            _ => None,
        }
    }

    /// Configuration tag for this kind.
    pub const fn as_raw(self) -> u32 {
        match self {
            Self::TimedWaveform => SEQUENCE_KIND_RAW_WAVEFORM,
            Self::EffectCodeList => SEQUENCE_KIND_RAW_CODES,
        }
    }
}

/// A named, immutable effect sequence.
///
/// Built by the registry during configuration load; the controller only
/// ever borrows the value list while a preset session is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSequence {
    name: String<MAX_EFFECT_NAME_LEN>,
    kind: SequenceKind,
    values: Vec<u32, MAX_SEQUENCE_LEN>,
}

impl EffectSequence {
    pub(crate) fn from_parts(
        name: String<MAX_EFFECT_NAME_LEN>,
        kind: SequenceKind,
        values: Vec<u32, MAX_SEQUENCE_LEN>,
    ) -> Self {
        Self { name, kind, values }
    }

    /// Name clients use to start this sequence.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interpretation of the value list.
    pub const fn kind(&self) -> SequenceKind {
        self.kind
    }

    /// Raw value list.
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Sum of all waits in the sequence.
    ///
    /// For a waveform every value is a wait; for a code list only the
    /// even positions are. Configured waits below the engine's minimum
    /// are counted at their configured value here.
    pub fn total_duration(&self) -> Duration {
        let millis: u64 = match self.kind {
            SequenceKind::TimedWaveform => {
                self.values.iter().map(|&ms| u64::from(ms)).sum()
            }
            SequenceKind::EffectCodeList => self
                .values
                .iter()
                .step_by(2)
                .map(|&ms| u64::from(ms))
                .sum(),
        };
        Duration::from_millis(millis)
    }
}

/// Outcome of a single timer firing against an active sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Call to post to the deferred actuation queue.
    pub call: ActuationCall,
    /// Cursor after the firing.
    pub next_index: usize,
    /// Wait before the next firing; `None` when the sequence is done.
    pub rearm: Option<Duration>,
}

/// Advance a sequence by one timer firing.
///
/// `index` is the cursor the expired wait was armed for and must lie
/// inside `values`. A waveform consumes one value per firing: the firing
/// at an even cursor switches the actuator on, at an odd cursor off, and
/// the value at the new cursor (if any) is the next wait. Because the
/// last cursor of an even-length waveform is odd, the final firing is
/// itself the terminal stop.
///
/// A code list consumes a pair per firing: the code next to the expired
/// wait is triggered and the cursor lands on the following wait. When no
/// pair is left the run is over and the outcome carries the terminal
/// stop.
///
/// Every returned wait is clamped upward to `min_wait` so a zero in the
/// configuration cannot stall forward progress.
pub fn step(
    kind: SequenceKind,
    values: &[u32],
    index: usize,
    min_wait: Duration,
) -> StepOutcome {
    match kind {
        SequenceKind::TimedWaveform => {
            let call = if index.is_multiple_of(2) {
                ActuationCall::Start
            } else {
                ActuationCall::Stop
            };
            let next_index = index + 1;
            let rearm = values.get(next_index).map(|&ms| clamp_wait(ms, min_wait));
            StepOutcome {
                call,
                next_index,
                rearm,
            }
        }
        SequenceKind::EffectCodeList => match values.get(index + 1) {
            Some(&code) => {
                let next_index = index + 2;
                let rearm = values.get(next_index).map(|&ms| clamp_wait(ms, min_wait));
                StepOutcome {
                    call: ActuationCall::StartEffect(code),
                    next_index,
                    rearm,
                }
            }
            // A wait with no code after it: nothing left to trigger.
            None => StepOutcome {
                call: ActuationCall::Stop,
                next_index: values.len(),
                rearm: None,
            },
        },
    }
}

/// Clamp a configured wait up to the engine's rearm floor.
pub(crate) fn clamp_wait(ms: u32, min_wait: Duration) -> Duration {
    let wait = Duration::from_millis(u64::from(ms));
    if wait < min_wait { min_wait } else { wait }
}
