use std::sync::Arc;

use crate::scanner::WatchedAddresses;
use crate::version::VersionConfig;

/// Addresses resolved for one instance of the game process.
///
/// Never reused for a different pid: a session is invalidated as soon as the
/// process it was resolved in dies or is replaced.
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub pid: u32,
    pub addresses: WatchedAddresses,
    pub valid: bool,
    pub version: Arc<VersionConfig>,
}

impl ScanSession {
    pub fn new(pid: u32, addresses: WatchedAddresses, version: Arc<VersionConfig>) -> Self {
        Self {
            pid,
            addresses,
            valid: true,
            version,
        }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Whether autoplay can resume without a rescan for the process now running.
    pub fn resumable_for(&self, current_pid: Option<u32>) -> bool {
        self.valid && current_pid == Some(self.pid)
    }
}
