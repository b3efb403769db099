use tracing::{debug, trace};

use crate::memory::{AddressRange, ProcessMemory};
use crate::signature::SignatureMatcher;
use crate::supervisor::StopSignal;

/// How a single slice walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    Found(u64),
    Exhausted,
    Cancelled,
}

/// Walk the regions of `slice` and search every writable committed one.
///
/// Regions are clipped to the slice. Reads are bounded by `chunk_size` and
/// consecutive chunks overlap by `pattern_len - 1` bytes, so a match that
/// straddles a chunk boundary is still found. Unreadable chunks are skipped.
/// The stop signal is checked before every region and every chunk.
pub fn scan_slice<M: ProcessMemory + ?Sized>(
    memory: &M,
    slice: AddressRange,
    matcher: &SignatureMatcher,
    chunk_size: usize,
    stop: &StopSignal,
) -> SliceOutcome {
    let chunk_size = chunk_size.max(matcher.pattern_len());
    let mut buffer = vec![0u8; chunk_size];
    let mut address = slice.start;

    while address < slice.end {
        if stop.is_triggered() {
            return SliceOutcome::Cancelled;
        }

        let Some(region) = memory.query_region(address) else {
            break;
        };
        if region.size == 0 {
            break;
        }

        if region.is_scannable() {
            if let Some(span) = region.range().intersect(&slice) {
                match scan_span(memory, span, matcher, &mut buffer, stop) {
                    SliceOutcome::Exhausted => {}
                    outcome => return outcome,
                }
            }
        } else {
            trace!("Skipping region {:#x}+{:#x}", region.base, region.size);
        }

        let next = region.end();
        if next <= address {
            break;
        }
        address = next;
    }

    SliceOutcome::Exhausted
}

fn scan_span<M: ProcessMemory + ?Sized>(
    memory: &M,
    span: AddressRange,
    matcher: &SignatureMatcher,
    buffer: &mut [u8],
    stop: &StopSignal,
) -> SliceOutcome {
    let overlap = matcher.pattern_len().saturating_sub(1);
    let mut offset = span.start;

    while offset < span.end {
        if stop.is_triggered() {
            return SliceOutcome::Cancelled;
        }

        let len = (span.end - offset).min(buffer.len() as u64) as usize;
        match memory.read_bytes(offset, &mut buffer[..len]) {
            Ok(read) => {
                if let Some(position) = matcher.search(&buffer[..read]) {
                    return SliceOutcome::Found(offset + position as u64);
                }
            }
            Err(e) => debug!("Skipping unreadable chunk at {:#x}: {}", offset, e),
        }

        if offset + len as u64 >= span.end {
            break;
        }
        // len == buffer.len() > overlap here
        offset += (len - overlap) as u64;
    }

    SliceOutcome::Exhausted
}
