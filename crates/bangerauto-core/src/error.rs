use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process {pid}: {message}")]
    ProcessOpenFailed { pid: u32, message: String },

    #[error("Module fingerprint unavailable for process {pid}: {message}")]
    FingerprintUnavailable { pid: u32, message: String },

    #[error("Unsupported game version (fingerprint {0})")]
    UnsupportedVersion(String),

    #[error("Signature not found in any memory region")]
    PatternNotFound,

    #[error("Process {0} was lost")]
    ProcessLost(u32),

    #[error("Memory access failed at address {address:#x}: {message}")]
    MemoryAccess { address: u64, message: String },

    #[error("Invalid signature pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid version config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Errors that end the current session rather than being skipped in place.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Error::MemoryAccess { .. })
    }
}
