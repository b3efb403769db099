//! Wildcard-aware Boyer-Moore-Horspool search.

use super::Pattern;

/// Searches byte buffers for a single [`Pattern`].
///
/// The bad-byte table is built once at construction. A wildcard at pattern
/// position `i` caps every table entry at `len - 1 - i`, so a shift can
/// never jump over an alignment where the wildcard would have matched.
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    pattern: Pattern,
    skip: [usize; 256],
}

impl SignatureMatcher {
    pub fn new(pattern: Pattern) -> Self {
        let skip = build_skip_table(pattern.bytes());
        Self { pattern, skip }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    /// Offset of the first (lowest) match in `buffer`.
    pub fn search(&self, buffer: &[u8]) -> Option<usize> {
        self.search_from(buffer, 0)
    }

    /// Every match offset in `buffer`, lowest first. Matches may overlap.
    pub fn find_all(&self, buffer: &[u8]) -> Vec<usize> {
        let mut results = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.search_from(buffer, start) {
            results.push(pos);
            start = pos + 1;
        }
        results
    }

    fn search_from(&self, buffer: &[u8], start: usize) -> Option<usize> {
        let pattern = self.pattern.bytes();
        let len = pattern.len();
        if len == 0 || buffer.len() < len {
            return None;
        }

        let last = len - 1;
        let mut pos = start;
        while pos <= buffer.len() - len {
            let mut i = last;
            loop {
                if let Some(expected) = pattern[i]
                    && buffer[pos + i] != expected
                {
                    pos += self.skip[buffer[pos + last] as usize];
                    break;
                }
                if i == 0 {
                    return Some(pos);
                }
                i -= 1;
            }
        }

        None
    }
}

fn build_skip_table(pattern: &[Option<u8>]) -> [usize; 256] {
    let len = pattern.len();
    let mut table = [len.max(1); 256];
    if len < 2 {
        return table;
    }

    for (i, byte) in pattern[..len - 1].iter().enumerate() {
        let distance = len - 1 - i;
        match byte {
            Some(value) => {
                let entry = &mut table[*value as usize];
                *entry = (*entry).min(distance);
            }
            None => {
                for entry in table.iter_mut() {
                    *entry = (*entry).min(distance);
                }
            }
        }
    }

    table
}
