//! Runtime settings for the scanner and the autoplay controller.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{self, scan, timing};

/// Settings for the parallel region scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Number of address-space slices, each scanned on its own thread
    pub workers: usize,
    /// Bounded read size per chunk in bytes
    pub chunk_size: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            workers: scan::WORKER_COUNT,
            chunk_size: scan::CHUNK_SIZE,
        }
    }
}

/// Pacing and teardown timeouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub poll_ticks: u32,
    pub poll_tick_ms: u64,
    pub quit_timeout_ms: u64,
    pub terminate_timeout_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            poll_ticks: timing::POLL_TICKS,
            poll_tick_ms: timing::POLL_TICK_MS,
            quit_timeout_ms: timing::QUIT_TIMEOUT_MS,
            terminate_timeout_ms: timing::TERMINATE_TIMEOUT_MS,
        }
    }
}

impl TimingSettings {
    pub fn poll_tick(&self) -> Duration {
        Duration::from_millis(self.poll_tick_ms)
    }

    pub fn quit_timeout(&self) -> Duration {
        Duration::from_millis(self.quit_timeout_ms)
    }

    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Executable name of the target process
    pub process_name: String,
    /// Path of the version configuration file
    pub versions_path: PathBuf,
    /// Gate the first toggle behind an update check
    pub require_update_check: bool,
    pub scan: ScanSettings,
    pub timing: TimingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            process_name: constants::GAME_PROCESS_NAME.to_string(),
            versions_path: PathBuf::from(constants::VERSIONS_FILE),
            require_update_check: false,
            scan: ScanSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}

impl Settings {
    /// Create a new settings builder
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }
}

/// Builder for Settings
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    process_name: Option<String>,
    versions_path: Option<PathBuf>,
    require_update_check: Option<bool>,
    scan: Option<ScanSettings>,
    timing: Option<TimingSettings>,
}

impl SettingsBuilder {
    pub fn process_name<S: Into<String>>(mut self, name: S) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn versions_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.versions_path = Some(path.into());
        self
    }

    pub fn require_update_check(mut self, enabled: bool) -> Self {
        self.require_update_check = Some(enabled);
        self
    }

    pub fn scan(mut self, scan: ScanSettings) -> Self {
        self.scan = Some(scan);
        self
    }

    pub fn timing(mut self, timing: TimingSettings) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn build(self) -> Settings {
        let default = Settings::default();
        Settings {
            process_name: self.process_name.unwrap_or(default.process_name),
            versions_path: self.versions_path.unwrap_or(default.versions_path),
            require_update_check: self
                .require_update_check
                .unwrap_or(default.require_update_check),
            scan: self.scan.unwrap_or(default.scan),
            timing: self.timing.unwrap_or(default.timing),
        }
    }
}
