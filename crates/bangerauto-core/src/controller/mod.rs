//! Autoplay controller.
//!
//! Drives the `Idle -> Scanning -> Autoplay` state machine:
//! - Resolves the game build from its module fingerprint
//! - Runs the parallel scan for that build's signature
//! - Monitors the watched values and writes the autoplay flag
//! - Tracks the process identity so stale addresses are never reused
//!
//! ## Example
//!
//! ```ignore
//! use bangerauto_core::controller::AutoplayController;
//! use bangerauto_core::memory::WindowsProcessProvider;
//! use bangerauto_core::settings::Settings;
//! use bangerauto_core::version::JsonVersionFile;
//!
//! let settings = Settings::default();
//! let source = JsonVersionFile::new(&settings.versions_path);
//! let controller = AutoplayController::new(WindowsProcessProvider::new(), settings, Box::new(source));
//!
//! let events = controller.subscribe();
//! controller.toggle();
//! ```

mod monitor;
mod session;
mod state;

pub use monitor::{Monitor, MonitorExit, MonitorStep};
pub use session::ScanSession;
pub use state::{
    ConfigStatus, ControllerState, Input, Status, StatusEvent, StatusSnapshot, Step, Transition,
    UpdateGate, transition,
};

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use crate::constants::VERSION_NOT_DETECTED;
use crate::error::{Error, Result};
use crate::memory::{ProcessMemory, ProcessProvider};
use crate::scanner::{ParallelScanner, ScanOutcome, WatchedAddresses};
use crate::settings::Settings;
use crate::supervisor::{JoinOutcome, StopSignal, Worker};
use crate::version::{VersionSource, VersionTable};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Scan,
    Resume,
}

/// State shared between the command side and the session thread.
struct Shared {
    state: ControllerState,
    gate: UpdateGate,
    status: Status,
    version: String,
    config: ConfigStatus,
    session: Option<ScanSession>,
    /// Bumped on every start and stop; updates from older sessions are dropped.
    generation: u64,
    published: Option<StatusSnapshot>,
}

impl Shared {
    fn new(gate: UpdateGate) -> Self {
        Self {
            state: ControllerState::Idle,
            gate,
            status: Status::NotStarted,
            version: VERSION_NOT_DETECTED.to_string(),
            config: ConfigStatus::NotLoaded,
            session: None,
            generation: 0,
            published: None,
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            status: self.status,
            version: self.version.clone(),
            config: self.config,
        }
    }
}

struct Inner<P: ProcessProvider> {
    provider: P,
    settings: Settings,
    scanner: ParallelScanner,
    source: Box<dyn VersionSource>,
    versions: RwLock<VersionTable>,
    shared: Mutex<Shared>,
    subscribers: Mutex<Vec<Sender<StatusEvent>>>,
}

struct ActiveSession {
    generation: u64,
    stop: Arc<StopSignal>,
    worker: Worker<()>,
}

/// Owns the session thread and serializes user commands.
pub struct AutoplayController<P: ProcessProvider> {
    inner: Arc<Inner<P>>,
    /// Also serves as the command lock.
    active: Mutex<Option<ActiveSession>>,
}

impl<P: ProcessProvider> AutoplayController<P> {
    /// Create a controller and load the version table once.
    pub fn new(provider: P, settings: Settings, source: Box<dyn VersionSource>) -> Self {
        let scanner = ParallelScanner::new(&settings.scan, &settings.timing);
        let gate = UpdateGate::new(settings.require_update_check);
        let inner = Arc::new(Inner {
            provider,
            settings,
            scanner,
            source,
            versions: RwLock::new(VersionTable::new()),
            shared: Mutex::new(Shared::new(gate)),
            subscribers: Mutex::new(Vec::new()),
        });

        if let Err(e) = inner.load_versions() {
            warn!("Starting without a version table: {}", e);
        }

        Self {
            inner,
            active: Mutex::new(None),
        }
    }

    /// Start from `Idle`, or stop a running scan or autoplay session.
    pub fn toggle(&self) {
        self.handle(Input::Toggle);
    }

    /// Stop any running session. A no-op in `Idle`.
    pub fn stop(&self) {
        self.handle(Input::Stop);
    }

    /// Report that the host finished the requested update check.
    pub fn update_finished(&self) {
        self.handle(Input::UpdateFinished);
    }

    /// Re-read the version table. On failure the previous table stays active.
    pub fn reload_versions(&self) -> Result<usize> {
        self.inner.load_versions()
    }

    pub fn status(&self) -> StatusSnapshot {
        lock(&self.inner.shared).snapshot()
    }

    pub fn state(&self) -> ControllerState {
        lock(&self.inner.shared).state
    }

    /// Addresses of the current session, if still valid.
    pub fn watched_addresses(&self) -> Option<WatchedAddresses> {
        lock(&self.inner.shared)
            .session
            .as_ref()
            .filter(|session| session.valid)
            .map(|session| session.addresses)
    }

    /// Receive every status change and update-check request from now on.
    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.inner.subscribers).push(tx);
        rx
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    fn handle(&self, input: Input) {
        let mut active = lock(&self.active);
        let (state, gate) = {
            let shared = lock(&self.inner.shared);
            (shared.state, shared.gate)
        };

        let step = transition(state, gate, input, || self.inner.resumable());
        lock(&self.inner.shared).gate = step.gate;
        debug!("{:?} in {} -> {:?}", input, state, step.action);

        match step.action {
            Transition::RequestUpdateCheck => {
                info!("Update check requested before starting");
                self.inner.broadcast(StatusEvent::UpdateCheckRequested);
            }
            Transition::StartScan => self.start(&mut active, Phase::Scan),
            Transition::ResumeAutoplay => self.start(&mut active, Phase::Resume),
            Transition::Stop => self.stop_active(&mut active),
            Transition::Ignore => {}
        }
    }

    fn start(&self, active: &mut Option<ActiveSession>, phase: Phase) {
        if let Some(previous) = active.take() {
            self.reap(previous);
        }
        if let Err(e) = self.inner.load_versions() {
            warn!("Keeping previously loaded versions: {}", e);
        }

        let generation = self.inner.update(|shared| {
            shared.generation += 1;
            match phase {
                Phase::Scan => {
                    if shared.session.take().is_some() {
                        info!("Discarding addresses from a previous game process");
                    }
                    shared.state = ControllerState::Scanning;
                }
                Phase::Resume => shared.state = ControllerState::Autoplay,
            }
            shared.generation
        });

        let stop = Arc::new(StopSignal::new());
        let inner = Arc::clone(&self.inner);
        let signal = Arc::clone(&stop);
        let spawned = Worker::spawn(format!("session-{}", generation), move || {
            inner.run_session(generation, &signal, phase)
        });

        match spawned {
            Ok(worker) => {
                info!("Session {} started ({:?})", generation, phase);
                *active = Some(ActiveSession {
                    generation,
                    stop,
                    worker,
                });
            }
            Err(e) => {
                error!("Failed to start session thread: {}", e);
                self.inner.update_current(generation, |shared| {
                    shared.state = ControllerState::Idle;
                    shared.status = Status::Idle;
                });
            }
        }
    }

    fn stop_active(&self, active: &mut Option<ActiveSession>) {
        self.inner.update(|shared| {
            shared.generation += 1;
            shared.state = ControllerState::Idle;
            if shared.status != Status::ProcessClosed {
                shared.status = Status::Idle;
            }
        });
        if let Some(previous) = active.take() {
            self.reap(previous);
        }
        info!("Stopped");
    }

    fn reap(&self, session: ActiveSession) {
        session.stop.trigger();
        let timing = &self.inner.settings.timing;
        let (outcome, _) = session
            .worker
            .join_within(timing.quit_timeout(), timing.terminate_timeout());
        match outcome {
            JoinOutcome::Joined => debug!("Session {} joined", session.generation),
            JoinOutcome::Panicked => error!("Session {} panicked", session.generation),
            JoinOutcome::Abandoned => error!(
                "Session {} abandoned; the autoplay flag may not have been reset",
                session.generation
            ),
        }
    }
}

impl<P: ProcessProvider> Drop for AutoplayController<P> {
    fn drop(&mut self) {
        self.stop();
        if let Some(finished) = lock(&self.active).take() {
            self.reap(finished);
        }
    }
}

impl<P: ProcessProvider> Inner<P> {
    fn load_versions(&self) -> Result<usize> {
        match self.source.load() {
            Ok(table) => {
                let count = table.len();
                *self.versions.write().unwrap_or_else(PoisonError::into_inner) = table;
                self.update(|shared| shared.config = ConfigStatus::Loaded);
                Ok(count)
            }
            Err(e) => {
                let status = if e.is_not_found() {
                    ConfigStatus::FileNotFound
                } else {
                    ConfigStatus::LoadFailed
                };
                warn!("Failed to load versions from {}: {}", self.source.describe(), e);
                self.update(|shared| shared.config = status);
                Err(e)
            }
        }
    }

    /// Stored addresses are valid and the same process is still running.
    fn resumable(&self) -> bool {
        let current = self.provider.find_process(&self.settings.process_name);
        lock(&self.shared)
            .session
            .as_ref()
            .is_some_and(|session| session.resumable_for(current))
    }

    fn broadcast(&self, event: StatusEvent) {
        lock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Apply `f` and publish the snapshot if it changed.
    fn update<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Shared) -> R,
    {
        let mut shared = lock(&self.shared);
        let result = f(&mut shared);
        let snapshot = shared.snapshot();
        if shared.published.as_ref() != Some(&snapshot) {
            shared.published = Some(snapshot.clone());
            // Broadcast under the lock so subscribers see changes in order.
            self.broadcast(StatusEvent::Changed(snapshot));
        }
        result
    }

    /// Like [`Inner::update`], but only while `generation` is the live session.
    fn update_current<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut Shared),
    {
        self.update(|shared| {
            if shared.generation != generation {
                debug!("Ignoring update from superseded session {}", generation);
                return false;
            }
            f(shared);
            true
        })
    }

    fn is_current(&self, generation: u64, state: ControllerState) -> bool {
        let shared = lock(&self.shared);
        shared.generation == generation && shared.state == state
    }

    fn run_session(&self, generation: u64, stop: &Arc<StopSignal>, phase: Phase) {
        let resolved = match phase {
            Phase::Scan => self.scan_phase(generation, stop),
            Phase::Resume => self.resume_phase(),
        };

        match resolved {
            Ok(Some((handle, session))) => self.monitor_phase(generation, stop, &handle, &session),
            Ok(None) => debug!("Session {} ended before autoplay", generation),
            Err(e) => self.fail(generation, &e),
        }
    }

    fn scan_phase(
        &self,
        generation: u64,
        stop: &Arc<StopSignal>,
    ) -> Result<Option<(Arc<P::Handle>, ScanSession)>> {
        let name = &self.settings.process_name;
        let pid = self
            .provider
            .find_process(name)
            .ok_or_else(|| Error::ProcessNotFound(name.clone()))?;
        let handle = Arc::new(self.provider.open(pid)?);
        info!("Opened game process {} (pid {})", name, pid);

        self.update_current(generation, |shared| {
            shared.status = Status::DetectingVersion;
        });
        let fingerprint = self.provider.module_fingerprint(pid)?;
        debug!("Module fingerprint: {}", fingerprint);

        let config = self
            .versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(&fingerprint)
            .ok_or_else(|| Error::UnsupportedVersion(fingerprint.clone()))?;
        info!("Detected game version {}", config.display_name);

        self.update_current(generation, |shared| {
            shared.version = config.display_name.clone();
            shared.status = Status::Scanning;
        });
        if stop.is_triggered() {
            return Ok(None);
        }

        let bounds = self.provider.address_space_bounds();
        let addresses = match self
            .scanner
            .scan(Arc::clone(&handle), &config, bounds, stop)
        {
            ScanOutcome::Cancelled => return Ok(None),
            ScanOutcome::NotFound => None,
            ScanOutcome::Found(addresses) => Some(addresses),
        };

        if !handle.is_alive() || self.provider.find_process(name) != Some(pid) {
            return Err(Error::ProcessLost(pid));
        }
        let addresses = addresses.ok_or(Error::PatternNotFound)?;

        let session = ScanSession::new(pid, addresses, config);
        let accepted = self.update_current(generation, |shared| {
            shared.session = Some(session.clone());
            shared.state = ControllerState::Autoplay;
        });
        Ok(accepted.then_some((handle, session)))
    }

    fn resume_phase(&self) -> Result<Option<(Arc<P::Handle>, ScanSession)>> {
        let session = lock(&self.shared)
            .session
            .clone()
            .filter(|session| session.valid)
            .ok_or_else(|| Error::ProcessNotFound(self.settings.process_name.clone()))?;
        let handle = Arc::new(self.provider.open(session.pid)?);
        info!("Resuming autoplay for pid {}", session.pid);
        Ok(Some((handle, session)))
    }

    fn monitor_phase(
        &self,
        generation: u64,
        stop: &StopSignal,
        handle: &P::Handle,
        session: &ScanSession,
    ) {
        if !self.update_current(generation, |shared| shared.status = Status::AutoplayActive) {
            return;
        }
        info!(
            "Autoplay active (flag {:#x}, is_playing {:#x}, time {:#x})",
            session.addresses.flag, session.addresses.is_playing, session.addresses.time
        );

        let name = &self.settings.process_name;
        let timing = &self.settings.timing;
        let exit = Monitor::new(handle, session.addresses, session.version.decision_rule()).run(
            stop,
            timing.poll_ticks,
            timing.poll_tick(),
            || self.provider.find_process(name) == Some(session.pid),
            || self.is_current(generation, ControllerState::Autoplay),
        );

        match exit {
            MonitorExit::Stopped => debug!("Autoplay monitor {} stopped", generation),
            MonitorExit::ProcessLost => self.fail(generation, &Error::ProcessLost(session.pid)),
        }
    }

    /// End the session in `Idle` with the status matching `error`.
    fn fail(&self, generation: u64, error: &Error) {
        let status = match error {
            Error::ProcessNotFound(_) | Error::ProcessOpenFailed { .. } => Status::ProcessNotFound,
            Error::FingerprintUnavailable { .. } | Error::UnsupportedVersion(_) => {
                Status::UnsupportedVersion
            }
            Error::PatternNotFound => Status::AddressesNotFound,
            Error::ProcessLost(_) => Status::ProcessClosed,
            _ => Status::Idle,
        };
        match error {
            Error::FingerprintUnavailable { .. } => warn!("{}", error),
            Error::UnsupportedVersion(_) | Error::PatternNotFound => info!("{}", error),
            _ => info!("Session {} ended: {}", generation, error),
        }

        self.update_current(generation, |shared| {
            shared.state = ControllerState::Idle;
            shared.status = status;
            if matches!(status, Status::ProcessNotFound | Status::ProcessClosed) {
                shared.version = VERSION_NOT_DETECTED.to_string();
            }
            if status == Status::ProcessClosed
                && let Some(session) = shared.session.as_mut()
            {
                session.invalidate();
            }
        });
    }
}
