//! Evenly spaced frame index selection.
//!
//! [`sample_indices`] maps a video's frame count and a desired number of
//! images to the ordered list of frame numbers the extraction loop should
//! keep. It is a pure function: the same inputs always produce the same
//! indices.
//!
//! # Example
//!
//! ```
//! use frameset::sample_indices;
//!
//! assert_eq!(sample_indices(100, 5), vec![0, 25, 50, 74, 99]);
//! assert_eq!(sample_indices(6, 3), vec![0, 2, 5]);
//! assert_eq!(sample_indices(3, 10), vec![0, 1, 2]);
//! ```

/// Select `target` evenly spaced frame numbers out of `total_frames`.
///
/// - Returns an empty list when either argument is zero.
/// - Returns every frame (`0..total_frames`) when `target >= total_frames`.
/// - Returns `[0]` when `target == 1`.
/// - Otherwise spaces the indices `(total_frames - 1) / (target - 1)` apart,
///   rounding to the nearest frame with ties going to the even frame, so
///   the first and last frames are always included.
///
/// The result is sorted ascending and always has length
/// `min(target, total_frames)`. Should rounding ever collapse two positions
/// into one, the largest index is repeated to keep the length.
pub fn sample_indices(total_frames: u64, target: u64) -> Vec<u64> {
    if total_frames == 0 || target == 0 {
        return Vec::new();
    }
    if target >= total_frames {
        return (0..total_frames).collect();
    }
    if target == 1 {
        return vec![0];
    }

    let last = total_frames - 1;
    let step = last as f64 / (target - 1) as f64;

    let mut indices: Vec<u64> = (0..target)
        .map(|i| ((i as f64 * step).round_ties_even() as u64).min(last))
        .collect();
    indices.sort_unstable();
    indices.dedup();

    let target = target as usize;
    while indices.len() < target {
        let largest = indices.last().copied().unwrap_or(0);
        indices.push(largest);
    }
    indices.truncate(target);
    indices
}
