//! Timing task that turns armed waits into engine firings.

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};

use crate::engine::HapticEngine;
use crate::session::FireToken;

/// One armed wait: sleep for `wait`, then fire with `token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rearm {
    /// How long to sleep before the firing.
    pub wait: Duration,
    /// Stamp the firing must present to the engine.
    pub token: FireToken,
}

/// Request from the controller to the timing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Replace the armed wait with a new one.
    Arm(Rearm),
    /// Drop the armed wait.
    Disarm,
}

/// Driver of an engine's timer schedule.
///
/// Runs as its own task, one per engine. The task holds no state beyond
/// the currently armed wait; a start or stop on the engine replaces that
/// wait mid-sleep, so a session change never has to wait out an old
/// timer.
pub struct Sequencer<'e, 'a, const EFFECT_CAPACITY: usize, const QUEUE_SIZE: usize> {
    engine: &'e HapticEngine<'a, EFFECT_CAPACITY, QUEUE_SIZE>,
}

impl<'e, 'a, const EFFECT_CAPACITY: usize, const QUEUE_SIZE: usize>
    Sequencer<'e, 'a, EFFECT_CAPACITY, QUEUE_SIZE>
{
    /// Create the timing task over an engine.
    pub const fn new(engine: &'e HapticEngine<'a, EFFECT_CAPACITY, QUEUE_SIZE>) -> Self {
        Self { engine }
    }

    /// Drive the engine's timer schedule forever.
    pub async fn run(&self) -> ! {
        let mut armed: Option<Rearm> = None;
        loop {
            armed = match armed {
                None => apply(self.engine.next_timer_command().await),
                Some(rearm) => {
                    match select(
                        Timer::after(rearm.wait),
                        self.engine.next_timer_command(),
                    )
                    .await
                    {
                        Either::First(()) => self.engine.on_timer_fired(rearm.token),
                        Either::Second(command) => apply(command),
                    }
                }
            };
        }
    }
}

const fn apply(command: TimerCommand) -> Option<Rearm> {
    match command {
        TimerCommand::Arm(rearm) => Some(rearm),
        TimerCommand::Disarm => None,
    }
}
