use strum::{Display, EnumCount, FromRepr};

use crate::version::VersionConfig;

/// Role of a watched address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, EnumCount)]
#[repr(usize)]
pub enum WatchedSlot {
    Flag = 0,
    IsPlaying = 1,
    Time = 2,
}

impl WatchedSlot {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One worker's answer for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResult {
    pub slot: WatchedSlot,
    pub address: u64,
    pub found: bool,
}

impl ScanResult {
    pub fn found(slot: WatchedSlot, address: u64) -> Self {
        Self {
            slot,
            address,
            found: true,
        }
    }

    pub fn not_found(slot: WatchedSlot) -> Self {
        Self {
            slot,
            address: 0,
            found: false,
        }
    }
}

/// Addresses sampled or written every monitor iteration.
///
/// Plain numbers in the target's address space, not pointers; they are only
/// meaningful for the process instance they were resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchedAddresses {
    pub flag: u64,
    pub is_playing: u64,
    pub time: u64,
}

impl WatchedAddresses {
    /// Derive the is-playing and time addresses by subtracting the configured offsets.
    pub fn derive(flag: u64, config: &VersionConfig) -> Self {
        Self::from_offsets(flag, config.is_playing_offset, config.time_offset)
    }

    pub fn from_offsets(flag: u64, is_playing_offset: i32, time_offset: i32) -> Self {
        Self {
            flag,
            is_playing: flag.wrapping_sub_signed(is_playing_offset as i64),
            time: flag.wrapping_sub_signed(time_offset as i64),
        }
    }

    pub fn get(&self, slot: WatchedSlot) -> u64 {
        match slot {
            WatchedSlot::Flag => self.flag,
            WatchedSlot::IsPlaying => self.is_playing,
            WatchedSlot::Time => self.time,
        }
    }
}
