mod fingerprint;
mod process;
mod region;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(test)]
pub mod mock;

pub use fingerprint::{fingerprint_bytes, fingerprint_file};
pub use process::{ProcessMemory, ProcessProvider};
pub use region::{AddressRange, MemoryRegion, Protection};
#[cfg(target_os = "windows")]
pub use windows::{WindowsProcess, WindowsProcessProvider};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockProcess, MockProvider};
