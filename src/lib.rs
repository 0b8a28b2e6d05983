//! # frameset
//!
//! Build fixed-size image datasets from videos.
//!
//! `frameset` picks an evenly spaced set of frames from a video, scales
//! each to an exact resolution and saves them as `<prefix>_0.jpg`,
//! `<prefix>_1.jpg`, …. When the video has fewer frames than requested,
//! the shortfall is filled with lightly augmented copies of the extracted
//! frames (mirroring, contrast/brightness jitter, small rotations, noise),
//! driven by a seeded random number generator so every run is
//! reproducible. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use frameset::{DatasetBuilder, DatasetOptions, ImageFormat};
//!
//! let options = DatasetOptions::new("cat")
//!     .with_size(224, 224)
//!     .with_target(5000)
//!     .with_format(ImageFormat::Jpg)
//!     .with_output_root("dataset_frames");
//!
//! let report = DatasetBuilder::new(options).run("cat.mp4")?;
//! println!(
//!     "{} extracted + {} augmented = {} images",
//!     report.extracted, report.augmented, report.saved
//! );
//! # Ok::<(), frameset::FramesetError>(())
//! ```
//!
//! ## Building blocks
//!
//! - [`sample_indices`]: deterministic, evenly spaced frame selection
//! - [`VideoSource`] / [`FrameSource`]: sequential decoding, scaled to size
//! - [`extract_frames`]: the single decode pass that saves sampled frames
//! - [`augment`]: seeded augmentation and shortfall top-up
//! - [`save_image`] / [`SequentialWriter`]: encoding and gap-free naming
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod augment;
pub mod configuration;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod metadata;
pub mod persist;
pub mod pipeline;
pub mod progress;
pub mod sampler;
pub mod source;

pub use augment::{AffineJitter, AugmentParams, AugmentationOutcome};
pub use configuration::{DatasetOptions, PoolMode};
pub use error::FramesetError;
pub use extract::{ExtractionOutcome, extract_frames};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use persist::{
    ImageFormat, OutputLayout, SequentialWriter, decode_image, encode_image, load_image,
    save_image,
};
pub use pipeline::{DatasetBuilder, DatasetReport};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use sampler::sample_indices;
pub use source::{FrameSource, VideoSource};
