//! # bangerauto-core
//!
//! Core library for the bangerauto autoplay toggler.
//!
//! This crate provides:
//! - Wildcard signature search (Boyer-Moore-Horspool)
//! - Parallel, region-aware scanning of a foreign address space
//! - Version resolution from module fingerprints and `versions.json`
//! - The autoplay controller state machine and monitor loop
//! - Windows process memory access behind the `ProcessProvider` traits

pub mod constants;
pub mod controller;
pub mod error;
pub mod memory;
pub mod prelude;
pub mod scanner;
pub mod settings;
pub mod signature;
pub mod supervisor;
pub mod version;

pub use controller::{
    AutoplayController, ConfigStatus, ControllerState, Status, StatusEvent, StatusSnapshot,
};
pub use error::{Error, Result};
pub use memory::{
    AddressRange, MemoryRegion, ProcessMemory, ProcessProvider, Protection, fingerprint_file,
};
#[cfg(target_os = "windows")]
pub use memory::{WindowsProcess, WindowsProcessProvider};
pub use scanner::{ParallelScanner, ScanOutcome, WatchedAddresses, WatchedSlot};
pub use settings::{ScanSettings, Settings, SettingsBuilder, TimingSettings};
pub use signature::{Pattern, SignatureMatcher};
pub use supervisor::{JoinOutcome, StopSignal, Worker};
pub use version::{DecisionRule, JsonVersionFile, VersionConfig, VersionSource, VersionTable};
