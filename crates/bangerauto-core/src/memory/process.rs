//! OS process-introspection capability.
//!
//! The scanner and controller only talk to a target process through these
//! traits. Addresses are plain `u64` values in the target's address space;
//! nothing here assumes they stay valid once the process goes away.

use crate::error::{Error, Result};

use super::region::{AddressRange, MemoryRegion};

/// Locates and opens target processes.
pub trait ProcessProvider: Send + Sync + 'static {
    type Handle: ProcessMemory + 'static;

    /// Process id of the first process whose executable name matches (case-insensitive).
    fn find_process(&self, name: &str) -> Option<u32>;

    /// Open a process with read, write and query access.
    fn open(&self, pid: u32) -> Result<Self::Handle>;

    /// Content hash of the process's main module file (lower-case hex).
    fn module_fingerprint(&self, pid: u32) -> Result<String>;

    /// User-mode address range valid for any process on this system.
    fn address_space_bounds(&self) -> AddressRange;
}

/// An open handle to a foreign process.
pub trait ProcessMemory: Send + Sync {
    fn pid(&self) -> u32;

    fn is_alive(&self) -> bool;

    /// Region containing `address`, or `None` past the end of the address space.
    fn query_region(&self, address: u64) -> Option<MemoryRegion>;

    /// Read into `buffer`, returning the number of bytes copied.
    fn read_bytes(&self, address: u64, buffer: &mut [u8]) -> Result<usize>;

    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()>;

    fn read_exact(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        let read = self.read_bytes(address, buffer)?;
        if read != buffer.len() {
            return Err(Error::MemoryAccess {
                address,
                message: format!("short read ({} of {} bytes)", read, buffer.len()),
            });
        }
        Ok(())
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(address, &mut buf)?;
        Ok(buf[0])
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(address, &mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_f64(&self, address: u64) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(address, &mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn write_i32(&self, address: u64, value: i32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }
}
