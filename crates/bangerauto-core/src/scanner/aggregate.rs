use std::sync::Mutex;

use strum::EnumCount;
use tracing::debug;

use crate::version::VersionConfig;

use super::types::{ScanResult, WatchedAddresses, WatchedSlot};

/// Completion report from one scan slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceReport {
    pub slice: usize,
    pub result: ScanResult,
}

impl SliceReport {
    pub fn found(slice: usize, address: u64) -> Self {
        Self {
            slice,
            result: ScanResult::found(WatchedSlot::Flag, address),
        }
    }

    pub fn not_found(slice: usize) -> Self {
        Self {
            slice,
            result: ScanResult::not_found(WatchedSlot::Flag),
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    addresses: [Option<u64>; WatchedSlot::COUNT],
    completed: usize,
}

/// Shared result slots filled by the scan workers.
///
/// Recording a report and counting the slice as finished happen under one
/// lock. The first found address for a slot is kept; later ones are dropped.
#[derive(Debug)]
pub struct ResultSlots {
    slots: Mutex<Slots>,
    expected: usize,
    is_playing_offset: i32,
    time_offset: i32,
}

impl ResultSlots {
    pub fn new(config: &VersionConfig, expected: usize) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            expected,
            is_playing_offset: config.is_playing_offset,
            time_offset: config.time_offset,
        }
    }

    /// Record a slice's completion. Returns `true` if it filled an empty slot.
    pub fn record(&self, report: SliceReport) -> bool {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.completed += 1;

        let ScanResult {
            slot,
            address,
            found,
        } = report.result;
        if !found || slots.addresses[slot.index()].is_some() {
            if found {
                debug!(
                    "Slice {} match at {:#x} ignored, slot {} already filled",
                    report.slice, address, slot
                );
            }
            return false;
        }

        slots.addresses[slot.index()] = Some(address);
        if slot == WatchedSlot::Flag {
            let derived =
                WatchedAddresses::from_offsets(address, self.is_playing_offset, self.time_offset);
            for slot in [WatchedSlot::IsPlaying, WatchedSlot::Time] {
                slots.addresses[slot.index()].get_or_insert(derived.get(slot));
            }
        }
        true
    }

    /// Every spawned slice has reported.
    pub fn is_complete(&self) -> bool {
        self.completed() >= self.expected
    }

    pub fn completed(&self) -> usize {
        match self.slots.lock() {
            Ok(guard) => guard.completed,
            Err(poisoned) => poisoned.into_inner().completed,
        }
    }

    pub fn has_match(&self) -> bool {
        self.addresses().is_some()
    }

    /// The three watched addresses, once all slots are filled.
    pub fn addresses(&self) -> Option<WatchedAddresses> {
        let slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let [flag, is_playing, time] = slots.addresses;
        Some(WatchedAddresses {
            flag: flag?,
            is_playing: is_playing?,
            time: time?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::sample_config;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_third_slice_match_derives_triple() {
        let config = sample_config("aa");
        let slots = ResultSlots::new(&config, 3);

        assert!(!slots.record(SliceReport::not_found(0)));
        assert!(!slots.record(SliceReport::not_found(1)));
        assert!(slots.addresses().is_none());
        assert!(slots.record(SliceReport::found(2, 0x1000)));

        assert!(slots.is_complete());
        assert_eq!(
            slots.addresses(),
            Some(WatchedAddresses {
                flag: 0x1000,
                is_playing: 0x0FF0,
                time: 0x0FE0,
            })
        );
    }

    #[test]
    fn test_first_match_wins() {
        let config = sample_config("aa");
        let slots = ResultSlots::new(&config, 4);

        assert!(slots.record(SliceReport::found(3, 0x9000)));
        assert!(!slots.record(SliceReport::found(0, 0x2000)));
        assert_eq!(slots.addresses().unwrap().flag, 0x9000);
        assert_eq!(slots.completed(), 2);
        assert!(!slots.is_complete());
    }

    #[test]
    fn test_concurrent_records_keep_exactly_one() {
        let config = sample_config("aa");
        let slots = Arc::new(ResultSlots::new(&config, 8));

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let slots = Arc::clone(&slots);
                thread::spawn(move || slots.record(SliceReport::found(i as usize, 0x1000 * (i + 1))))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(slots.is_complete());
        let flag = slots.addresses().unwrap().flag;
        assert!(flag % 0x1000 == 0 && (0x1000..=0x8000).contains(&flag));
    }

    #[test]
    fn test_no_match_after_all_slices() {
        let config = sample_config("aa");
        let slots = ResultSlots::new(&config, 2);
        slots.record(SliceReport::not_found(0));
        slots.record(SliceReport::not_found(1));
        assert!(slots.is_complete());
        assert!(!slots.has_match());
    }
}
