/// Half-open address interval `[start, end)` in a foreign address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

impl AddressRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, address: u64) -> bool {
        (self.start..self.end).contains(&address)
    }

    /// Overlap of two ranges, `None` when they are disjoint.
    pub fn intersect(&self, other: &AddressRange) -> Option<AddressRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(AddressRange { start, end })
    }
}

/// Page protection of a region, reduced to what the scanner cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Protection {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    pub guard: bool,
    pub no_access: bool,
}

impl Protection {
    pub const READ_WRITE: Protection = Protection {
        readable: true,
        writable: true,
        executable: false,
        guard: false,
        no_access: false,
    };

    pub const READ_ONLY: Protection = Protection {
        readable: true,
        writable: false,
        executable: false,
        guard: false,
        no_access: false,
    };

    pub const NO_ACCESS: Protection = Protection {
        readable: false,
        writable: false,
        executable: false,
        guard: false,
        no_access: true,
    };
}

/// One entry of a process's virtual memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: u64,
    pub size: u64,
    pub committed: bool,
    pub protection: Protection,
}

impl MemoryRegion {
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn range(&self) -> AddressRange {
        AddressRange::new(self.base, self.end())
    }

    /// Committed, writable and neither guarded nor inaccessible.
    ///
    /// The autoplay flag is overwritten later, so only writable memory can hold it.
    pub fn is_scannable(&self) -> bool {
        self.committed
            && self.protection.writable
            && !self.protection.guard
            && !self.protection.no_access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(committed: bool, protection: Protection) -> MemoryRegion {
        MemoryRegion {
            base: 0x1000,
            size: 0x1000,
            committed,
            protection,
        }
    }

    #[test]
    fn test_scannable_requires_commit_and_write() {
        assert!(region(true, Protection::READ_WRITE).is_scannable());
        assert!(!region(false, Protection::READ_WRITE).is_scannable());
        assert!(!region(true, Protection::READ_ONLY).is_scannable());
        assert!(!region(true, Protection::NO_ACCESS).is_scannable());
    }

    #[test]
    fn test_guard_pages_are_skipped() {
        let guarded = Protection {
            guard: true,
            ..Protection::READ_WRITE
        };
        assert!(!region(true, guarded).is_scannable());
    }

    #[test]
    fn test_range_intersection() {
        let a = AddressRange::new(0x1000, 0x3000);
        let b = AddressRange::new(0x2000, 0x4000);
        assert_eq!(a.intersect(&b), Some(AddressRange::new(0x2000, 0x3000)));
        assert_eq!(a.intersect(&AddressRange::new(0x3000, 0x5000)), None);
        assert!(a.contains(0x1000));
        assert!(!a.contains(0x3000));
        assert_eq!(a.len(), 0x2000);
    }
}
