use std::ops::Range;

/// Split `[0, total)` into `workers` contiguous ranges.
///
/// Every range but the trailing ones holds `ceil(total / workers)` units; the
/// last non-empty range may be shorter and any ranges past `total` are empty.
/// Together they cover `[0, total)` exactly once. Zero workers yield no ranges.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }
    let size = total.div_ceil(workers);
    (0..workers)
        .map(|i| {
            let start = (i * size).min(total);
            let end = (start + size).min(total);
            start..end
        })
        .collect()
}
