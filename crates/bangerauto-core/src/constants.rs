//! Default values shared by the scanner, the controller and the settings file.

/// Executable name of the target game process
pub const GAME_PROCESS_NAME: &str = "beatbanger.exe";

/// Version configuration file name
pub const VERSIONS_FILE: &str = "versions.json";

/// Label shown while no game version has been resolved
pub const VERSION_NOT_DETECTED: &str = "Not Detected";

/// Memory scanning constants
pub mod scan {
    /// Bounded read size per chunk (8MB)
    pub const CHUNK_SIZE: usize = 8 * 1024 * 1024;

    /// Number of address-space slices scanned in parallel
    pub const WORKER_COUNT: usize = 4;
}

/// Version configuration limits
pub mod version {
    /// Largest accepted |offset| between the flag and a watched value (1MB)
    pub const MAX_REASONABLE_OFFSET: i32 = 1024 * 1024;
}

/// Timing constants for the autoplay loop and thread teardown
pub mod timing {
    /// Sleep ticks between two autoplay iterations
    pub const POLL_TICKS: u32 = 50;

    /// Length of one sleep tick (ms)
    pub const POLL_TICK_MS: u64 = 1;

    /// Cooperative shutdown window for worker threads (ms)
    pub const QUIT_TIMEOUT_MS: u64 = 2000;

    /// Extra window before a worker thread is abandoned (ms)
    pub const TERMINATE_TIMEOUT_MS: u64 = 1000;
}
