//! End-to-end dataset construction.
//!
//! [`DatasetBuilder`] ties the pieces together:
//!
//! 1. open the video and determine its frame count,
//! 2. pick evenly spaced frame numbers with [`sample_indices`],
//! 3. save those frames in one sequential decode pass,
//! 4. if fewer images than requested were saved, synthesize the rest by
//!    augmenting the saved ones,
//! 5. report what happened in a [`DatasetReport`].
//!
//! Only failing to open the video (or invalid options) is fatal. Everything
//! else degrades to "save as many as possible and report the count".
//!
//! # Example
//!
//! ```no_run
//! use frameset::{DatasetBuilder, DatasetOptions};
//!
//! let options = DatasetOptions::new("cat").with_target(500);
//! let report = DatasetBuilder::new(options).run("cat.mp4")?;
//! println!("{} images in {}", report.saved, report.output_directory.display());
//! if report.shortfall() > 0 {
//!     eprintln!("short by {}", report.shortfall());
//! }
//! # Ok::<(), frameset::FramesetError>(())
//! ```

use std::{fs, path::{Path, PathBuf}};

use image::RgbImage;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    augment::{AugmentParams, top_up},
    configuration::{DatasetOptions, PoolMode},
    error::FramesetError,
    extract::extract_frames,
    persist::{OutputLayout, SequentialWriter, load_image},
    progress::{OperationType, ProgressTracker},
    sampler::sample_indices,
    source::{FrameSource, VideoSource},
};

/// Summary of a dataset run.
#[derive(Debug, Clone)]
pub struct DatasetReport {
    /// Requested number of images.
    pub target: u64,
    /// Frame count of the video.
    pub total_frames: u64,
    /// Number of frame indices selected for extraction.
    pub sampled: u64,
    /// Images saved by the extraction pass.
    pub extracted: u64,
    /// Whether the augmentation stage was entered.
    pub augmentation_attempted: bool,
    /// Images synthesized by augmentation.
    pub augmented: u64,
    /// Total images on disk: `extracted + augmented`.
    pub saved: u64,
    /// Saves that failed across both stages.
    pub save_failures: u64,
    /// Selected frames that could not be converted to an image.
    pub conversion_failures: u64,
    /// Directory holding the images.
    pub output_directory: PathBuf,
    /// Parameters of every augmented image, in file order.
    pub augment_params: Vec<AugmentParams>,
}

impl DatasetReport {
    /// How many images short of the target the run ended.
    pub fn shortfall(&self) -> u64 {
        self.target.saturating_sub(self.saved)
    }

    /// Whether the target was reached.
    pub fn is_complete(&self) -> bool {
        self.shortfall() == 0
    }
}

/// Builds one dataset from one video.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    options: DatasetOptions,
}

impl DatasetBuilder {
    /// Create a builder for the given options.
    pub fn new(options: DatasetOptions) -> Self {
        Self { options }
    }

    /// The options this builder runs with.
    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    /// Build the dataset from the video at `path`.
    ///
    /// Augmentation randomness comes from a [`StdRng`] seeded with
    /// [`DatasetOptions::with_seed`], so repeated runs produce identical
    /// output. The video is closed on every return path.
    ///
    /// # Errors
    ///
    /// - [`FramesetError::InvalidOption`] for unusable options.
    /// - [`FramesetError::FileOpen`] / [`FramesetError::NoVideoStream`] if
    ///   the video cannot be opened.
    /// - [`FramesetError::IoError`] if the output directory cannot be
    ///   created.
    /// - [`FramesetError::PersistenceExhausted`] if augmentation keeps
    ///   failing to save.
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<DatasetReport, FramesetError> {
        self.options.validate()?;
        let mut source = VideoSource::open(path)?;
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let result = self.run_with(&mut source, &mut rng);
        source.close();
        result
    }

    /// Build the dataset from any [`FrameSource`] with a caller-supplied
    /// random number generator.
    ///
    /// # Errors
    ///
    /// As for [`run`](DatasetBuilder::run), minus the open errors.
    pub fn run_with<S, R>(&self, source: &mut S, rng: &mut R) -> Result<DatasetReport, FramesetError>
    where
        S: FrameSource + ?Sized,
        R: Rng + ?Sized,
    {
        let options = &self.options;
        options.validate()?;
        if options.quality_ignored() {
            log::warn!(
                "Quality {} has no effect on {} output, which is lossless",
                options.quality,
                options.format
            );
        }

        let layout = options.layout();
        fs::create_dir_all(layout.directory())?;

        let total_frames = source.total_frames()?;
        let to_extract = total_frames.min(options.target);
        let indices = sample_indices(total_frames, to_extract);
        log::info!(
            "Sampling {} of {} frames (target {})",
            indices.len(),
            total_frames,
            options.target
        );

        let retain = options.augment && options.pool_mode == PoolMode::InMemory;
        let mut writer = SequentialWriter::new(layout.clone(), options.quality);
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::FrameExtraction,
            Some(indices.len() as u64),
        );
        let extraction = extract_frames(
            source,
            &indices,
            options.size(),
            &mut writer,
            retain,
            |frame_number| tracker.advance(Some(frame_number)),
        )?;
        let extracted = writer.saved();

        let mut report = DatasetReport {
            target: options.target,
            total_frames,
            sampled: indices.len() as u64,
            extracted,
            augmentation_attempted: false,
            augmented: 0,
            saved: extracted,
            save_failures: 0,
            conversion_failures: extraction.conversion_failures,
            output_directory: layout.directory().to_path_buf(),
            augment_params: Vec::new(),
        };

        if options.augment && extracted < options.target {
            if extracted == 0 {
                log::warn!("No frames were extracted; nothing to augment");
            } else {
                report.augmentation_attempted = true;
                let pool = match options.pool_mode {
                    PoolMode::InMemory => extraction.retained,
                    PoolMode::ReloadFromDisk => reload_pool(&layout, extracted),
                };

                if pool.is_empty() {
                    log::warn!("No saved image could be read back; skipping augmentation");
                } else {
                    let needed = options.target - extracted;
                    log::info!(
                        "Augmenting {needed} images from a pool of {}",
                        pool.len()
                    );
                    let mut tracker = ProgressTracker::new(
                        options.progress.clone(),
                        OperationType::Augmentation,
                        Some(needed),
                    );
                    let outcome = top_up(
                        &pool,
                        needed,
                        options.size(),
                        rng,
                        options.max_consecutive_save_failures,
                        |image| {
                            writer.write(image)?;
                            tracker.advance(None);
                            Ok(())
                        },
                    )?;
                    report.augmented = outcome.generated;
                    report.augment_params = outcome.params;
                }
            }
        }

        report.saved = writer.saved();
        report.save_failures = writer.failures();

        if report.shortfall() > 0 {
            log::warn!(
                "Dataset short of target: {} of {} images",
                report.saved,
                report.target
            );
        }
        Ok(report)
    }
}

/// Read back `<prefix>_0` … `<prefix>_(count - 1)`, skipping unreadable
/// files.
fn reload_pool(layout: &OutputLayout, count: u64) -> Vec<RgbImage> {
    (0..count)
        .filter_map(|index| {
            let path = layout.path_for(index);
            load_image(&path)
                .inspect_err(|error| log::warn!("Ignoring {}: {error}", path.display()))
                .ok()
        })
        .collect()
}
