//! Playback session state shared between the client surface and the
//! timer path.

use crate::sequence::SequenceKind;

/// Transport tag for [`VibrationMode::Once`].
pub const VIBRATION_MODE_RAW_ONCE: u32 = 0;
/// Transport tag for [`VibrationMode::Preset`].
pub const VIBRATION_MODE_RAW_PRESET: u32 = 1;

/// Externally observable playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Nothing is playing.
    Idle,
    /// A synthesized fixed-duration vibration is running.
    Once,
    /// A named preset sequence is running.
    Preset,
}

impl PlaybackMode {
    /// Whether a stop naming `expected` applies to this state.
    pub(crate) const fn matches(self, expected: VibrationMode) -> bool {
        matches!(
            (self, expected),
            (Self::Once, VibrationMode::Once) | (Self::Preset, VibrationMode::Preset)
        )
    }
}

/// The running-session kind a client names when issuing a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VibrationMode {
    /// Fixed-duration playback started by duration.
    Once,
    /// Named preset playback started by effect name.
    Preset,
}

impl VibrationMode {
    /// Decode a mode from its transport tag.
    pub const fn from_raw(value: u32) -> Option<Self> {
        match value {
            VIBRATION_MODE_RAW_ONCE => Some(Self::Once),
            VIBRATION_MODE_RAW_PRESET => Some(Self::Preset),
            _ => None,
        }
    }

    /// Transport tag for this mode.
    pub const fn as_raw(self) -> u32 {
        match self {
            Self::Once => VIBRATION_MODE_RAW_ONCE,
            Self::Preset => VIBRATION_MODE_RAW_PRESET,
        }
    }

    /// Short human-readable name, for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Preset => "preset",
        }
    }
}

/// Generation stamp for armed timers.
///
/// Every session transition bumps the stamp. A firing that presents an
/// older stamp belongs to a session that has already ended and is
/// discarded without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireToken(u32);

impl FireToken {
    pub(crate) const fn initial() -> Self {
        Self(0)
    }

    #[must_use]
    pub(crate) const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Value list backing a running session.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ActiveSequence<'a> {
    /// Synthesized lead-in/duration pair for a fixed-duration run.
    Once([u32; 2]),
    /// Borrowed registry sequence for a preset run.
    Preset {
        kind: SequenceKind,
        values: &'a [u32],
    },
}

impl ActiveSequence<'_> {
    /// Kind and value list of the running sequence.
    pub(crate) fn parts(&self) -> (SequenceKind, &[u32]) {
        match self {
            Self::Once(values) => (SequenceKind::TimedWaveform, values.as_slice()),
            Self::Preset { kind, values } => (*kind, *values),
        }
    }
}

/// Mutable state of the single playback session.
///
/// Guarded by the engine's critical section. While `mode` is not idle
/// the active sequence is populated and `index` never exceeds its value
/// count.
#[derive(Debug)]
pub(crate) struct PlaybackSession<'a> {
    pub(crate) mode: PlaybackMode,
    pub(crate) active: Option<ActiveSequence<'a>>,
    pub(crate) index: usize,
    pub(crate) token: FireToken,
}

impl<'a> PlaybackSession<'a> {
    pub(crate) const fn idle() -> Self {
        Self {
            mode: PlaybackMode::Idle,
            active: None,
            index: 0,
            token: FireToken::initial(),
        }
    }

    /// Enter a running mode with a fresh token.
    pub(crate) fn begin(
        &mut self,
        mode: PlaybackMode,
        active: ActiveSequence<'a>,
    ) -> FireToken {
        self.mode = mode;
        self.active = Some(active);
        self.index = 0;
        self.token = self.token.next();
        self.token
    }

    /// Return to idle, invalidating any armed timer.
    pub(crate) fn clear(&mut self) {
        self.mode = PlaybackMode::Idle;
        self.active = None;
        self.index = 0;
        self.token = self.token.next();
    }
}
