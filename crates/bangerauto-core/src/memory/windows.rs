//! Win32 backend for [`ProcessProvider`] / [`ProcessMemory`].

use std::ffi::c_void;
use std::mem;

use tracing::{debug, warn};
use windows::Win32::Foundation::{CloseHandle, HANDLE, HMODULE, STILL_ACTIVE};
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_EXECUTE, PAGE_EXECUTE_READ,
    PAGE_EXECUTE_READWRITE, PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOACCESS, PAGE_READONLY,
    PAGE_READWRITE, PAGE_WRITECOPY, VirtualQueryEx,
};
use windows::Win32::System::ProcessStatus::GetModuleFileNameExW;
use windows::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
    PROCESS_VM_READ, PROCESS_VM_WRITE,
};

use crate::error::{Error, Result};

use super::fingerprint::fingerprint_file;
use super::process::{ProcessMemory, ProcessProvider};
use super::region::{AddressRange, MemoryRegion, Protection};

const MAX_PATH_CHARS: usize = 260;

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsProcessProvider;

impl WindowsProcessProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessProvider for WindowsProcessProvider {
    type Handle = WindowsProcess;

    fn find_process(&self, name: &str) -> Option<u32> {
        // SAFETY: snapshot handle is closed below on every path.
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }.ok()?;

        let mut entry = PROCESSENTRY32W {
            dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        // SAFETY: entry.dwSize is initialised as the API requires.
        let mut ok = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
        while ok {
            if utf16_to_string(&entry.szExeFile).eq_ignore_ascii_case(name) {
                found = Some(entry.th32ProcessID);
                break;
            }
            // SAFETY: same snapshot and entry as above.
            ok = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
        }

        // SAFETY: snapshot was returned by CreateToolhelp32Snapshot.
        unsafe {
            let _ = CloseHandle(snapshot);
        }
        found
    }

    fn open(&self, pid: u32) -> Result<WindowsProcess> {
        let access =
            PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION;
        // SAFETY: OpenProcess has no memory-safety preconditions.
        let handle = unsafe { OpenProcess(access, false, pid) }.map_err(|e| {
            Error::ProcessOpenFailed {
                pid,
                message: e.to_string(),
            }
        })?;
        debug!("Opened process {} (handle {:?})", pid, handle);
        Ok(WindowsProcess { handle, pid })
    }

    fn module_fingerprint(&self, pid: u32) -> Result<String> {
        let unavailable = |message: String| Error::FingerprintUnavailable { pid, message };

        // SAFETY: OpenProcess has no memory-safety preconditions.
        let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid) }
            .map_err(|e| unavailable(e.to_string()))?;

        let mut path = [0u16; MAX_PATH_CHARS];
        // SAFETY: a null module handle selects the main executable.
        let len = unsafe { GetModuleFileNameExW(handle, HMODULE::default(), &mut path) } as usize;
        // SAFETY: handle came from OpenProcess above.
        unsafe {
            let _ = CloseHandle(handle);
        }

        if len == 0 {
            return Err(unavailable("GetModuleFileNameExW failed".to_string()));
        }

        let module_path = String::from_utf16_lossy(&path[..len]);
        debug!("Main module of process {}: {}", pid, module_path);
        fingerprint_file(&module_path).map_err(|e| unavailable(e.to_string()))
    }

    fn address_space_bounds(&self) -> AddressRange {
        let mut info = SYSTEM_INFO::default();
        // SAFETY: GetSystemInfo only writes into the provided struct.
        unsafe { GetSystemInfo(&mut info) };
        AddressRange::new(
            info.lpMinimumApplicationAddress as u64,
            info.lpMaximumApplicationAddress as u64,
        )
    }
}

/// Open process handle; closed on drop.
#[derive(Debug)]
pub struct WindowsProcess {
    handle: HANDLE,
    pid: u32,
}

// SAFETY: a process HANDLE may be used from any thread; the Win32 memory
// APIs used here do not rely on thread affinity.
unsafe impl Send for WindowsProcess {}
// SAFETY: see above; all methods take `&self` and the handle is never mutated.
unsafe impl Sync for WindowsProcess {}

impl ProcessMemory for WindowsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        let mut code = 0u32;
        // SAFETY: handle is open for the lifetime of self.
        match unsafe { GetExitCodeProcess(self.handle, &mut code) } {
            Ok(()) => code == STILL_ACTIVE.0 as u32,
            Err(e) => {
                warn!("Failed to get exit code of process {}: {}", self.pid, e);
                false
            }
        }
    }

    fn query_region(&self, address: u64) -> Option<MemoryRegion> {
        let mut info = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: info is a valid out-buffer of the size passed.
        let written = unsafe {
            VirtualQueryEx(
                self.handle,
                Some(address as *const c_void),
                &mut info,
                mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 {
            return None;
        }

        Some(MemoryRegion {
            base: info.BaseAddress as u64,
            size: info.RegionSize as u64,
            committed: info.State == MEM_COMMIT,
            protection: protection_from_flags(info.Protect.0),
        })
    }

    fn read_bytes(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        let mut read = 0usize;
        // SAFETY: buffer is valid for buffer.len() bytes of writes.
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buffer.as_mut_ptr().cast(),
                buffer.len(),
                Some(&mut read),
            )
        }
        .map_err(|e| Error::MemoryAccess {
            address,
            message: e.to_string(),
        })?;
        Ok(read)
    }

    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        let mut written = 0usize;
        // SAFETY: bytes is valid for bytes.len() bytes of reads.
        unsafe {
            WriteProcessMemory(
                self.handle,
                address as *const c_void,
                bytes.as_ptr().cast(),
                bytes.len(),
                Some(&mut written),
            )
        }
        .map_err(|e| Error::MemoryAccess {
            address,
            message: e.to_string(),
        })?;

        if written != bytes.len() {
            return Err(Error::MemoryAccess {
                address,
                message: format!("short write ({} of {} bytes)", written, bytes.len()),
            });
        }
        Ok(())
    }
}

impl Drop for WindowsProcess {
    fn drop(&mut self) {
        // SAFETY: handle came from OpenProcess and is closed exactly once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

fn protection_from_flags(flags: u32) -> Protection {
    let writable_mask = PAGE_READWRITE.0
        | PAGE_WRITECOPY.0
        | PAGE_EXECUTE_READWRITE.0
        | PAGE_EXECUTE_WRITECOPY.0;
    let readable_mask = writable_mask | PAGE_READONLY.0 | PAGE_EXECUTE_READ.0;
    let executable_mask = PAGE_EXECUTE.0
        | PAGE_EXECUTE_READ.0
        | PAGE_EXECUTE_READWRITE.0
        | PAGE_EXECUTE_WRITECOPY.0;

    Protection {
        readable: flags & readable_mask != 0,
        writable: flags & writable_mask != 0,
        executable: flags & executable_mask != 0,
        guard: flags & PAGE_GUARD.0 != 0,
        no_access: flags & PAGE_NOACCESS.0 != 0,
    }
}

fn utf16_to_string(words: &[u16]) -> String {
    let end = words.iter().position(|c| *c == 0).unwrap_or(words.len());
    String::from_utf16_lossy(&words[..end])
}
