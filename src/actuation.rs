//! Deferred actuation: the bounded call queue and its single worker.
//!
//! Timer-context code never touches the hardware driver. It posts
//! [`ActuationCall`]s into the queue and the worker replays them from its
//! own task, in order, one at a time.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use log::warn;

use crate::Actuator;

/// A single hardware request carried through the deferred queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationCall {
    /// Drive the actuator on.
    Start,
    /// Trigger the built-in effect with the given code.
    StartEffect(u32),
    /// Drive the actuator off.
    Stop,
}

/// Bounded queue feeding the actuation worker.
pub type ActuationChannel<const SIZE: usize> =
    Channel<CriticalSectionRawMutex, ActuationCall, SIZE>;

/// Receiving side of the actuation queue.
pub type ActuationReceiver<'a, const SIZE: usize> =
    Receiver<'a, CriticalSectionRawMutex, ActuationCall, SIZE>;

/// Single consumer that owns the injected hardware driver.
///
/// Exactly one worker drains a given queue, so calls reach the hardware
/// in posting order and never concurrently.
pub struct ActuationWorker<'a, D, const SIZE: usize> {
    calls: ActuationReceiver<'a, SIZE>,
    driver: D,
}

impl<'a, D: Actuator, const SIZE: usize> ActuationWorker<'a, D, SIZE> {
    /// Create the worker over the receiving side of `channel`.
    pub fn new(channel: &'a ActuationChannel<SIZE>, driver: D) -> Self {
        Self {
            calls: channel.receiver(),
            driver,
        }
    }

    /// Run one call against the driver.
    ///
    /// Driver failures are logged and swallowed: there is no hardware
    /// acknowledgment path, so playback keeps its own schedule.
    pub fn process(&mut self, call: ActuationCall) {
        let result = match call {
            ActuationCall::Start => self.driver.start(),
            ActuationCall::StartEffect(code) => self.driver.start_effect(code),
            ActuationCall::Stop => self.driver.stop(),
        };
        if let Err(e) = result {
            warn!("actuation call {call:?} failed: {e:?}");
        }
    }

    /// Consume and run queued calls forever.
    pub async fn run(&mut self) -> ! {
        loop {
            let call = self.calls.receive().await;
            self.process(call);
        }
    }
}
