//! Prelude module for convenient imports
//!
//! ```ignore
//! use bangerauto_core::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Controller: `AutoplayController`, `StatusEvent`, `StatusSnapshot`
//! - Configuration: `Settings`, `JsonVersionFile`, `VersionSource`
//! - Process access: `ProcessProvider`, `ProcessMemory`
//! - Error handling: `Error`, `Result`

// Controller types
pub use crate::controller::{AutoplayController, ControllerState, Status, StatusEvent, StatusSnapshot};

// Error handling
pub use crate::error::{Error, Result};

// Process access traits
pub use crate::memory::{ProcessMemory, ProcessProvider};
#[cfg(target_os = "windows")]
pub use crate::memory::WindowsProcessProvider;

// Configuration
pub use crate::settings::Settings;
pub use crate::version::{JsonVersionFile, VersionSource};
