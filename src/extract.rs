//! Single-pass extraction of sampled frames.
//!
//! [`extract_frames`] reads a [`FrameSource`] front to back exactly once
//! and saves every frame whose number appears in the (ascending) index
//! list, scaled by the source to the dataset dimensions. Save failures are logged and
//! skipped; they never abort the pass.

use image::RgbImage;

use crate::{error::FramesetError, persist::SequentialWriter, source::FrameSource};

/// Result of an extraction pass.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Frames decoded from the source.
    pub frames_read: u64,
    /// Images saved by this pass.
    pub saved: u64,
    /// Saves that failed.
    pub save_failures: u64,
    /// Selected frames that decoded but could not be converted.
    pub conversion_failures: u64,
    /// The saved images as they decode from disk, in save order, when
    /// retention was requested.
    pub retained: Vec<RgbImage>,
}

/// Save the frames of `source` listed in `indices`.
///
/// `indices` must be sorted ascending; a repeated index saves the same
/// frame again. Each selected frame is converted at exactly `width` ×
/// `height` and written through `writer`. When `retain` is set, every
/// successfully saved image is also kept in
/// [`ExtractionOutcome::retained`], with any lossy encoding applied, so it
/// matches what reading the file back would give. `on_saved` is called with the frame
/// number after every successful save.
///
/// Reading stops once every index has been visited or the stream ends,
/// whichever comes first.
///
/// # Errors
///
/// Only errors from [`FrameSource::advance`] are returned; per-frame
/// conversion and save failures are counted instead.
pub fn extract_frames<S, F>(
    source: &mut S,
    indices: &[u64],
    (width, height): (u32, u32),
    writer: &mut SequentialWriter,
    retain: bool,
    mut on_saved: F,
) -> Result<ExtractionOutcome, FramesetError>
where
    S: FrameSource + ?Sized,
    F: FnMut(u64),
{
    debug_assert!(indices.windows(2).all(|pair| pair[0] <= pair[1]));

    let mut outcome = ExtractionOutcome::default();
    let mut cursor = 0;
    let mut frame_number = 0u64;

    while cursor < indices.len() {
        if !source.advance()? {
            log::debug!(
                "Stream ended after {} frames with {} sampled frames unvisited",
                outcome.frames_read,
                indices.len() - cursor
            );
            break;
        }
        outcome.frames_read += 1;

        if indices[cursor] == frame_number {
            let repeats = indices[cursor..]
                .iter()
                .take_while(|&&index| index == frame_number)
                .count();
            cursor += repeats;

            match source.current_frame(Some((width, height))) {
                Ok(frame) => {
                    for _ in 0..repeats {
                        let result = if retain {
                            writer.write_and_reload(&frame).map(|(path, stored)| {
                                outcome.retained.push(stored);
                                path
                            })
                        } else {
                            writer.write(&frame)
                        };
                        match result {
                            Ok(path) => {
                                log::debug!("Frame {frame_number} -> {}", path.display());
                                outcome.saved += 1;
                                on_saved(frame_number);
                            }
                            Err(error) => {
                                outcome.save_failures += 1;
                                log::warn!("Skipping frame {frame_number}: {error}");
                            }
                        }
                    }
                }
                Err(error) => {
                    outcome.conversion_failures += repeats as u64;
                    log::warn!("Skipping frame {frame_number}: {error}");
                }
            }
        }

        frame_number += 1;
    }

    log::info!(
        "Extraction pass: read {} frames, saved {} of {} sampled",
        outcome.frames_read,
        outcome.saved,
        indices.len()
    );
    Ok(outcome)
}
