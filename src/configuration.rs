//! Dataset run configuration.
//!
//! [`DatasetOptions`] is a builder carrying every setting of a dataset run:
//! output size and count, encoding, where files go, whether shortfalls are
//! augmented, the random seed, and an optional progress callback.
//!
//! # Example
//!
//! ```
//! use frameset::{DatasetOptions, ImageFormat, PoolMode};
//!
//! let options = DatasetOptions::new("cat")
//!     .with_size(128, 96)
//!     .with_target(1000)
//!     .with_format(ImageFormat::Png)
//!     .with_output_root("out")
//!     .with_pool_mode(PoolMode::ReloadFromDisk);
//! assert!(options.validate().is_ok());
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::FramesetError,
    persist::{ImageFormat, OutputLayout},
    progress::{NoOpProgress, ProgressCallback},
};

/// Default output width and height.
pub const DEFAULT_SIZE: (u32, u32) = (224, 224);
/// Default number of images per dataset.
pub const DEFAULT_TARGET: u64 = 5000;
/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 95;
/// Default output root directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "dataset_frames";
/// Default random seed.
pub const DEFAULT_SEED: u64 = 123;
/// Default bound on consecutive failed saves during augmentation.
pub const DEFAULT_MAX_CONSECUTIVE_SAVE_FAILURES: u32 = 32;

/// Where augmentation takes its source images from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolMode {
    /// Keep every extracted image in memory during extraction. The default.
    #[default]
    InMemory,
    /// Keep nothing in memory; re-read the saved images from disk before
    /// augmenting.
    ReloadFromDisk,
}

/// Settings for a dataset run.
#[derive(Clone)]
pub struct DatasetOptions {
    pub(crate) prefix: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) target: u64,
    pub(crate) format: ImageFormat,
    pub(crate) quality: u8,
    pub(crate) output_root: PathBuf,
    pub(crate) augment: bool,
    pub(crate) seed: u64,
    pub(crate) pool_mode: PoolMode,
    pub(crate) max_consecutive_save_failures: u32,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for DatasetOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DatasetOptions")
            .field("prefix", &self.prefix)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("target", &self.target)
            .field("format", &self.format)
            .field("quality", &self.quality)
            .field("output_root", &self.output_root)
            .field("augment", &self.augment)
            .field("seed", &self.seed)
            .field("pool_mode", &self.pool_mode)
            .field(
                "max_consecutive_save_failures",
                &self.max_consecutive_save_failures,
            )
            .finish_non_exhaustive()
    }
}

impl DatasetOptions {
    /// Options for a dataset whose files are named `<prefix>_<n>.<ext>`.
    ///
    /// Defaults: 224×224, 5000 images, JPEG at quality 95, output root
    /// `dataset_frames`, augmentation on, seed 123, in-memory pool.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            target: DEFAULT_TARGET,
            format: ImageFormat::default(),
            quality: DEFAULT_QUALITY,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            augment: true,
            seed: DEFAULT_SEED,
            pool_mode: PoolMode::default(),
            max_consecutive_save_failures: DEFAULT_MAX_CONSECUTIVE_SAVE_FAILURES,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the exact output dimensions. Frames are stretched to fit.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set how many images the dataset should contain.
    #[must_use]
    pub fn with_target(mut self, target: u64) -> Self {
        self.target = target;
        self
    }

    /// Set the output encoding.
    #[must_use]
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the encoder quality (1–100, JPEG only).
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the directory under which `<prefix>/` is created.
    #[must_use]
    pub fn with_output_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.output_root = root.as_ref().to_path_buf();
        self
    }

    /// Enable or disable augmentation of shortfalls.
    #[must_use]
    pub fn with_augmentation(mut self, enabled: bool) -> Self {
        self.augment = enabled;
        self
    }

    /// Set the random seed used for augmentation.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Choose where augmentation source images come from.
    #[must_use]
    pub fn with_pool_mode(mut self, mode: PoolMode) -> Self {
        self.pool_mode = mode;
        self
    }

    /// Abort augmentation after this many saves in a row have failed.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_max_consecutive_save_failures(mut self, limit: u32) -> Self {
        self.max_consecutive_save_failures = limit.max(1);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// File name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Output `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Requested number of images.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Random seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether a non-default quality was set for a format that ignores it
    /// (every format except JPEG; WebP is always written lossless).
    pub fn quality_ignored(&self) -> bool {
        !self.format.uses_quality() && self.quality != DEFAULT_QUALITY
    }

    /// File layout derived from the output root, prefix and format.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_root, &self.prefix, self.format)
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`FramesetError::InvalidOption`] naming the first offending
    /// setting.
    pub fn validate(&self) -> Result<(), FramesetError> {
        let invalid = |name: &'static str, reason: &str| {
            Err(FramesetError::InvalidOption {
                name,
                reason: reason.to_string(),
            })
        };

        if self.prefix.is_empty() {
            return invalid("prefix", "must not be empty");
        }
        if self.prefix.contains(['/', '\\']) {
            return invalid("prefix", "must not contain path separators");
        }
        if self.width == 0 || self.height == 0 {
            return invalid("size", "width and height must be greater than zero");
        }
        if self.target == 0 {
            return invalid("target", "must be greater than zero");
        }
        if !(1..=100).contains(&self.quality) {
            return invalid("quality", "must be between 1 and 100");
        }
        Ok(())
    }
}
