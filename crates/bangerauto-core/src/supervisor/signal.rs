use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Cooperative stop flag with interruptible waits.
///
/// One signal is created per session and handed to every thread working on
/// that session. Unlike `thread::sleep()`, [`StopSignal::wait`] returns as
/// soon as the signal is triggered.
#[derive(Debug)]
pub struct StopSignal {
    stopped: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl StopSignal {
    /// Create a new signal in the running state.
    pub fn new() -> Self {
        Self {
            stopped: AtomicBool::new(false),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    /// Trigger the signal, waking all waiting threads.
    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // Take the lock so a waiter between its check and its wait cannot miss the notify.
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Wait for the specified duration or until the signal is triggered.
    ///
    /// Returns `true` if the signal was triggered, `false` if the wait completed normally.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }

        let Ok(guard) = self.mutex.lock() else {
            // Mutex poisoned, treat as stopped
            return true;
        };
        match self
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_triggered())
        {
            Ok(_) => self.is_triggered(),
            Err(_) => true,
        }
    }

    /// Sleep `ticks` times for `tick`, checking `keep_going` before every tick.
    ///
    /// Returns `false` as soon as the signal fires or `keep_going` turns false.
    pub fn pace<F: Fn() -> bool>(&self, ticks: u32, tick: Duration, keep_going: F) -> bool {
        for _ in 0..ticks {
            if self.is_triggered() || !keep_going() {
                return false;
            }
            if self.wait(tick) {
                return false;
            }
        }
        !self.is_triggered() && keep_going()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
