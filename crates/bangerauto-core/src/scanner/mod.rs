//! Parallel signature scan over a foreign address space.
//!
//! The address space is split into one slice per worker. Each worker walks
//! the committed writable regions of its slice in bounded chunks and reports
//! once over a channel. The first reported match fills the result slots.

mod aggregate;
mod partition;
mod slice;
mod types;

pub use aggregate::{ResultSlots, SliceReport};
pub use partition::partition;
pub use slice::{SliceOutcome, scan_slice};
pub use types::{ScanResult, WatchedAddresses, WatchedSlot};

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::memory::{AddressRange, ProcessMemory};
use crate::settings::{ScanSettings, TimingSettings};
use crate::signature::SignatureMatcher;
use crate::supervisor::{JoinOutcome, StopSignal, Worker};
use crate::version::VersionConfig;

const DRAIN_TICK: Duration = Duration::from_millis(10);

/// Result of a full scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(WatchedAddresses),
    NotFound,
    /// The session stop signal fired before the scan completed.
    Cancelled,
}

/// Multi-threaded scanner for a version's signature.
#[derive(Debug, Clone)]
pub struct ParallelScanner {
    workers: usize,
    chunk_size: usize,
    quit_timeout: Duration,
    terminate_timeout: Duration,
}

impl ParallelScanner {
    pub fn new(scan: &ScanSettings, timing: &TimingSettings) -> Self {
        Self {
            workers: scan.workers.max(1),
            chunk_size: scan.chunk_size,
            quit_timeout: timing.quit_timeout(),
            terminate_timeout: timing.terminate_timeout(),
        }
    }

    /// Scan `bounds` of `memory` for `config`'s pattern.
    ///
    /// Blocks until every worker has reported, or until `stop` fires and the
    /// workers have been given the quit and terminate windows to wind down.
    pub fn scan<M>(
        &self,
        memory: Arc<M>,
        config: &VersionConfig,
        bounds: AddressRange,
        stop: &Arc<StopSignal>,
    ) -> ScanOutcome
    where
        M: ProcessMemory + ?Sized + 'static,
    {
        let started = Instant::now();
        let slices = partition(bounds, self.workers);
        info!(
            "Scanning {:#x}..{:#x} with {} workers for '{}'",
            bounds.start,
            bounds.end,
            slices.len(),
            config.display_name
        );

        let slots = ResultSlots::new(config, slices.len());
        let (tx, rx) = mpsc::channel::<SliceReport>();
        let mut workers = Vec::with_capacity(slices.len());

        for (index, slice) in slices.into_iter().enumerate() {
            let tx = tx.clone();
            let memory = Arc::clone(&memory);
            let stop = Arc::clone(stop);
            let matcher = SignatureMatcher::new(config.pattern.clone());
            let chunk_size = self.chunk_size;

            let spawned = Worker::spawn(format!("scan-{}", index), move || {
                let outcome = scan_slice(memory.as_ref(), slice, &matcher, chunk_size, &stop);
                debug!("Slice {} ({:#x}..{:#x}): {:?}", index, slice.start, slice.end, outcome);
                let report = match outcome {
                    SliceOutcome::Found(address) => SliceReport::found(index, address),
                    SliceOutcome::Exhausted | SliceOutcome::Cancelled => {
                        SliceReport::not_found(index)
                    }
                };
                // Receiver gone means the scan was abandoned.
                let _ = tx.send(report);
            });

            match spawned {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    warn!("Failed to spawn scan worker {}: {}", index, e);
                    slots.record(SliceReport::not_found(index));
                }
            }
        }
        drop(tx);

        let timed_out = self.drain(&rx, &slots, stop);
        self.reap(workers, timed_out);

        if stop.is_triggered() {
            info!("Scan cancelled after {:?}", started.elapsed());
            return ScanOutcome::Cancelled;
        }

        match slots.addresses() {
            Some(addresses) => {
                info!(
                    "Signature found at {:#x} in {:?} (is_playing {:#x}, time {:#x})",
                    addresses.flag,
                    started.elapsed(),
                    addresses.is_playing,
                    addresses.time
                );
                ScanOutcome::Found(addresses)
            }
            None => {
                info!("Signature not found ({:?})", started.elapsed());
                ScanOutcome::NotFound
            }
        }
    }

    /// Collect reports until every slice has finished. Returns `true` if the
    /// workers were given up on after a stop.
    fn drain(
        &self,
        rx: &mpsc::Receiver<SliceReport>,
        slots: &ResultSlots,
        stop: &StopSignal,
    ) -> bool {
        let mut give_up_at: Option<Instant> = None;

        while !slots.is_complete() {
            match rx.recv_timeout(DRAIN_TICK) {
                Ok(report) => {
                    if slots.record(report) {
                        debug!("Slice {} reported the first match", report.slice);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if stop.is_triggered() {
                        let deadline = *give_up_at.get_or_insert_with(|| {
                            Instant::now() + self.quit_timeout + self.terminate_timeout
                        });
                        if Instant::now() >= deadline {
                            error!(
                                "Scan workers still running {:?} after stop ({} reported)",
                                self.quit_timeout + self.terminate_timeout,
                                slots.completed()
                            );
                            return true;
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Scan workers exited without reporting");
                    return false;
                }
            }
        }

        false
    }

    fn reap(&self, workers: Vec<Worker<()>>, timed_out: bool) {
        let (quit, terminate) = if timed_out {
            (Duration::ZERO, Duration::ZERO)
        } else {
            (self.quit_timeout, self.terminate_timeout)
        };

        for worker in workers {
            let name = worker.name().to_string();
            match worker.join_within(quit, terminate).0 {
                JoinOutcome::Joined => {}
                JoinOutcome::Panicked => warn!("Scan worker '{}' panicked", name),
                JoinOutcome::Abandoned => warn!("Scan worker '{}' abandoned", name),
            }
        }
    }
}
