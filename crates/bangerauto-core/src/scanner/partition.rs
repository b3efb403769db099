use crate::memory::AddressRange;

/// Split `range` into `workers` contiguous slices of equal size.
///
/// The last slice absorbs the remainder, so the slices cover `range` exactly
/// once with no gaps or overlaps. A worker count of zero is treated as one.
pub fn partition(range: AddressRange, workers: usize) -> Vec<AddressRange> {
    let workers = workers.max(1) as u64;
    let step = range.len() / workers;

    (0..workers)
        .map(|i| {
            let start = range.start + i * step;
            let end = if i == workers - 1 {
                range.end.max(start)
            } else {
                start + step
            };
            AddressRange::new(start, end)
        })
        .collect()
}
