//! Error types for the `frameset` crate.
//!
//! [`FramesetError`] is the single error type returned by every fallible
//! operation. Only a few variants are fatal to a dataset run (opening the
//! video, invalid options, exhausted persistence retries); the rest are
//! surfaced per item and aggregated into the final
//! [`DatasetReport`](crate::DatasetReport).

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `frameset` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramesetError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An image could not be written to disk.
    #[error("Failed to save image to {path}: {reason}")]
    SaveFailed {
        /// Destination that was being written.
        path: PathBuf,
        /// Underlying encoder or filesystem error.
        reason: String,
    },

    /// Augmentation kept failing to persist images.
    #[error("Giving up after {failures} consecutive failed saves during augmentation")]
    PersistenceExhausted {
        /// Number of consecutive failures that triggered the abort.
        failures: u32,
    },

    /// The requested output image format is not supported.
    #[error("Unsupported image format: {0} (expected jpg, png, bmp or webp)")]
    UnsupportedFormat(String),

    /// A dataset option is out of range.
    #[error("Invalid option {name}: {reason}")]
    InvalidOption {
        /// Option name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FramesetError {
    fn from(error: FfmpegError) -> Self {
        FramesetError::FfmpegError(error.to_string())
    }
}
