//! Autoplay monitor: sample the watched values and drive the flag.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::memory::ProcessMemory;
use crate::scanner::WatchedAddresses;
use crate::supervisor::StopSignal;
use crate::version::DecisionRule;

/// Result of one monitor iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStep {
    Continue,
    /// The process died or another instance replaced it.
    ProcessLost,
    /// Stopped while waiting out a settle delay.
    Stopped,
}

/// Why the monitor loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    Stopped,
    ProcessLost,
}

/// Polls is-playing and time, and writes the decision to the flag.
pub struct Monitor<'a, M: ProcessMemory + ?Sized> {
    memory: &'a M,
    addresses: WatchedAddresses,
    rule: DecisionRule,
    was_playing: bool,
}

impl<'a, M: ProcessMemory + ?Sized> Monitor<'a, M> {
    pub fn new(memory: &'a M, addresses: WatchedAddresses, rule: DecisionRule) -> Self {
        Self {
            memory,
            addresses,
            rule,
            was_playing: false,
        }
    }

    /// One iteration: liveness and identity check, sample, decide, write.
    ///
    /// Read and write failures are logged and the iteration is skipped.
    pub fn step<F>(&mut self, same_process: F, stop: &StopSignal) -> MonitorStep
    where
        F: Fn() -> bool,
    {
        if !self.memory.is_alive() {
            info!("Game process {} exited", self.memory.pid());
            return MonitorStep::ProcessLost;
        }
        if !same_process() {
            info!("Game process {} was replaced", self.memory.pid());
            return MonitorStep::ProcessLost;
        }

        let sample = self
            .memory
            .read_u8(self.addresses.is_playing)
            .and_then(|is_playing| Ok((is_playing, self.memory.read_f64(self.addresses.time)?)));
        let (is_playing, time) = match sample {
            Ok(sample) => sample,
            Err(e) if e.is_terminal() => {
                warn!("Monitor read failed: {}", e);
                return MonitorStep::ProcessLost;
            }
            Err(e) => {
                debug!("No sample this cycle: {}", e);
                return MonitorStep::Continue;
            }
        };

        let playing = is_playing == 1;
        if playing
            && !self.was_playing
            && let Some(delay) = self.rule.settle_delay()
        {
            debug!("Play started, settling for {:?}", delay);
            if stop.wait(delay) {
                return MonitorStep::Stopped;
            }
        }
        self.was_playing = playing;

        let output = self.rule.evaluate(playing, time);
        if let Err(e) = self.memory.write_i32(self.addresses.flag, i32::from(output)) {
            debug!("Flag write failed: {}", e);
        }
        MonitorStep::Continue
    }

    /// Run until stopped or the process is lost, then reset the flag to `0` once.
    ///
    /// `keep_going` is checked between iterations and on every pacing tick.
    pub fn run<F, K>(
        mut self,
        stop: &StopSignal,
        ticks: u32,
        tick: Duration,
        same_process: F,
        keep_going: K,
    ) -> MonitorExit
    where
        F: Fn() -> bool,
        K: Fn() -> bool,
    {
        let exit = loop {
            if stop.is_triggered() || !keep_going() {
                break MonitorExit::Stopped;
            }
            match self.step(&same_process, stop) {
                MonitorStep::Continue => {}
                MonitorStep::ProcessLost => break MonitorExit::ProcessLost,
                MonitorStep::Stopped => break MonitorExit::Stopped,
            }
            if !stop.pace(ticks, tick, &keep_going) {
                break MonitorExit::Stopped;
            }
        };

        self.reset_flag();
        exit
    }

    fn reset_flag(&self) {
        match self.memory.write_i32(self.addresses.flag, 0) {
            Ok(()) => debug!("Autoplay flag at {:#x} reset", self.addresses.flag),
            Err(e) => warn!(
                "Failed to reset autoplay flag at {:#x}: {}",
                self.addresses.flag, e
            ),
        }
    }
}
