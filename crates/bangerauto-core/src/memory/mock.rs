//! In-memory stand-ins for the OS process capability, used by tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

use super::process::{ProcessMemory, ProcessProvider};
use super::region::{AddressRange, MemoryRegion, Protection};

#[derive(Debug, Clone)]
struct MockRegion {
    base: u64,
    data: Vec<u8>,
    committed: bool,
    protection: Protection,
}

impl MockRegion {
    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }
}

/// Fake process memory: a sorted list of regions plus liveness.
#[derive(Debug)]
pub struct MockProcess {
    pid: u32,
    alive: AtomicBool,
    regions: Mutex<Vec<MockRegion>>,
    failing_reads: Vec<AddressRange>,
    writes: Mutex<Vec<(u64, Vec<u8>)>>,
}

impl MockProcess {
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn poke(&self, address: u64, bytes: &[u8]) {
        let mut regions = self.regions.lock().unwrap();
        let region = regions
            .iter_mut()
            .find(|r| address >= r.base && address + bytes.len() as u64 <= r.end())
            .expect("poke outside mock regions");
        let start = (address - region.base) as usize;
        region.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn peek_i32(&self, address: u64) -> i32 {
        let mut buf = [0u8; 4];
        self.read_exact(address, &mut buf).unwrap();
        i32::from_le_bytes(buf)
    }

    /// All successful writes, in order.
    pub fn writes(&self) -> Vec<(u64, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_to(&self, address: u64) -> Vec<i32> {
        self.writes()
            .into_iter()
            .filter(|(a, bytes)| *a == address && bytes.len() == 4)
            .map(|(_, bytes)| i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect()
    }
}

impl ProcessMemory for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn query_region(&self, address: u64) -> Option<MemoryRegion> {
        let regions = self.regions.lock().unwrap();
        if let Some(region) = regions.iter().find(|r| address >= r.base && address < r.end()) {
            return Some(MemoryRegion {
                base: region.base,
                size: region.data.len() as u64,
                committed: region.committed,
                protection: region.protection,
            });
        }

        // Unmapped gap up to the next region, like a MEM_FREE entry.
        regions
            .iter()
            .filter(|r| r.base > address)
            .map(|r| r.base)
            .min()
            .map(|next| MemoryRegion {
                base: address,
                size: next - address,
                committed: false,
                protection: Protection::NO_ACCESS,
            })
    }

    fn read_bytes(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        let fail = |message: &str| Error::MemoryAccess {
            address,
            message: message.to_string(),
        };

        let end = address + buffer.len() as u64;
        if self
            .failing_reads
            .iter()
            .any(|r| r.intersect(&AddressRange::new(address, end)).is_some())
        {
            return Err(fail("injected read failure"));
        }

        let regions = self.regions.lock().unwrap();
        let region = regions
            .iter()
            .find(|r| address >= r.base && address < r.end())
            .ok_or_else(|| fail("unmapped"))?;
        if !region.committed || region.protection.no_access {
            return Err(fail("no access"));
        }

        let start = (address - region.base) as usize;
        let count = buffer.len().min(region.data.len() - start);
        buffer[..count].copy_from_slice(&region.data[start..start + count]);
        Ok(count)
    }

    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        {
            let mut regions = self.regions.lock().unwrap();
            let region = regions
                .iter_mut()
                .find(|r| address >= r.base && address + bytes.len() as u64 <= r.end())
                .ok_or_else(|| Error::MemoryAccess {
                    address,
                    message: "unmapped".to_string(),
                })?;
            let start = (address - region.base) as usize;
            region.data[start..start + bytes.len()].copy_from_slice(bytes);
        }
        self.writes.lock().unwrap().push((address, bytes.to_vec()));
        Ok(())
    }
}

impl ProcessMemory for Arc<MockProcess> {
    fn pid(&self) -> u32 {
        (**self).pid()
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }

    fn query_region(&self, address: u64) -> Option<MemoryRegion> {
        (**self).query_region(address)
    }

    fn read_bytes(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        (**self).read_bytes(address, buffer)
    }

    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(address, bytes)
    }
}

/// Builder for [`MockProcess`].
#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    pid: u32,
    regions: Vec<MockRegion>,
    failing_reads: Vec<AddressRange>,
}

impl MockMemoryBuilder {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            ..Default::default()
        }
    }

    pub fn region(mut self, base: u64, data: Vec<u8>, protection: Protection) -> Self {
        self.regions.push(MockRegion {
            base,
            data,
            committed: true,
            protection,
        });
        self
    }

    pub fn reserved(mut self, base: u64, size: usize) -> Self {
        self.regions.push(MockRegion {
            base,
            data: vec![0; size],
            committed: false,
            protection: Protection::NO_ACCESS,
        });
        self
    }

    pub fn fail_reads(mut self, range: AddressRange) -> Self {
        self.failing_reads.push(range);
        self
    }

    pub fn build(mut self) -> Arc<MockProcess> {
        self.regions.sort_by_key(|r| r.base);
        Arc::new(MockProcess {
            pid: self.pid,
            alive: AtomicBool::new(true),
            regions: Mutex::new(self.regions),
            failing_reads: self.failing_reads,
            writes: Mutex::new(Vec::new()),
        })
    }
}

/// Provider that hands out one shared [`MockProcess`].
#[derive(Debug)]
pub struct MockProvider {
    process: Arc<MockProcess>,
    visible_pid: AtomicU32,
    fingerprint: Mutex<Option<String>>,
    bounds: AddressRange,
}

impl MockProvider {
    pub fn new(process: Arc<MockProcess>, fingerprint: &str, bounds: AddressRange) -> Self {
        let pid = process.pid;
        Self {
            process,
            visible_pid: AtomicU32::new(pid),
            fingerprint: Mutex::new(Some(fingerprint.to_string())),
            bounds,
        }
    }

    pub fn process(&self) -> &Arc<MockProcess> {
        &self.process
    }

    /// Pid reported by `find_process`; `0` means no process is running.
    pub fn set_visible_pid(&self, pid: u32) {
        self.visible_pid.store(pid, Ordering::SeqCst);
    }

    pub fn set_fingerprint(&self, fingerprint: Option<&str>) {
        *self.fingerprint.lock().unwrap() = fingerprint.map(str::to_string);
    }
}

impl ProcessProvider for MockProvider {
    type Handle = Arc<MockProcess>;

    fn find_process(&self, _name: &str) -> Option<u32> {
        match self.visible_pid.load(Ordering::SeqCst) {
            0 => None,
            pid => Some(pid),
        }
    }

    fn open(&self, pid: u32) -> Result<Arc<MockProcess>> {
        if pid != self.process.pid || !self.process.is_alive() {
            return Err(Error::ProcessOpenFailed {
                pid,
                message: "no such mock process".to_string(),
            });
        }
        Ok(Arc::clone(&self.process))
    }

    fn module_fingerprint(&self, pid: u32) -> Result<String> {
        self.fingerprint
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::FingerprintUnavailable {
                pid,
                message: "module unreadable".to_string(),
            })
    }

    fn address_space_bounds(&self) -> AddressRange {
        self.bounds
    }
}
