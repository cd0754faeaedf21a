use thiserror::Error;

/// Errors returned from the client-facing playback surface.
///
/// Everything is reported synchronously to the caller of the start/stop
/// operations; nothing is retried internally, and a failed start never
/// leaves a partially armed session behind.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// A request parameter was rejected (zero duration, unknown mode tag).
    #[error("invalid argument")]
    InvalidArgument,
    /// A playback session is already running; it must be stopped first.
    #[error("playback already running")]
    Busy,
    /// Presets are unavailable, the name is unknown or the sequence is malformed.
    #[error("effect not supported")]
    NotSupported,
    /// The effect registry loaded no usable entries.
    #[error("no effects configured")]
    NotConfigured,
    /// The deferred actuation queue cannot accept a new playback.
    #[error("actuation queue exhausted")]
    ResourceExhausted,
}
