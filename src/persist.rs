//! Writing dataset images to disk.
//!
//! [`ImageFormat`] selects the encoder, [`OutputLayout`] decides where the
//! `n`-th image of a dataset lives, and [`save_image`] encodes a single
//! image, creating parent directories on demand.
//!
//! # Example
//!
//! ```no_run
//! use frameset::{ImageFormat, OutputLayout, save_image};
//! use image::RgbImage;
//!
//! let layout = OutputLayout::new("dataset_frames", "cat", ImageFormat::Jpg);
//! let image = RgbImage::new(224, 224);
//! save_image(&image, &layout.path_for(0), ImageFormat::Jpg, 95)?;
//! # Ok::<(), frameset::FramesetError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use image::{
    ExtendedColorType, ImageEncoder, RgbImage,
    codecs::{bmp::BmpEncoder, jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder},
};

use crate::error::FramesetError;

/// Output encoding for dataset images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// JPEG, honours the quality setting. The default.
    #[default]
    Jpg,
    /// Lossless PNG.
    Png,
    /// Uncompressed BMP.
    Bmp,
    /// Lossless WebP.
    Webp,
}

impl ImageFormat {
    /// File extension used for this format (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Webp => "webp",
        }
    }

    /// Whether the quality setting affects this encoder.
    pub fn uses_quality(self) -> bool {
        matches!(self, ImageFormat::Jpg)
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = FramesetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            "png" => Ok(ImageFormat::Png),
            "bmp" => Ok(ImageFormat::Bmp),
            "webp" => Ok(ImageFormat::Webp),
            _ => Err(FramesetError::UnsupportedFormat(value.to_string())),
        }
    }
}

/// Naming scheme for a dataset: `<root>/<prefix>/<prefix>_<n>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    directory: PathBuf,
    prefix: String,
    format: ImageFormat,
}

impl OutputLayout {
    /// Lay out images for `prefix` under `root`.
    pub fn new<P: AsRef<Path>>(root: P, prefix: &str, format: ImageFormat) -> Self {
        Self {
            directory: root.as_ref().join(prefix),
            prefix: prefix.to_string(),
            format,
        }
    }

    /// Directory that holds every image of the dataset.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Encoding used for every image.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Path of the image with sequence number `index`.
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.directory
            .join(format!("{}_{index}.{}", self.prefix, self.format.extension()))
    }
}

/// Encode `image` in memory.
///
/// `quality` (1–100) is passed to the JPEG encoder and ignored by the
/// lossless formats.
///
/// # Errors
///
/// Returns [`FramesetError::ImageError`] if the encoder rejects the image.
pub fn encode_image(
    image: &RgbImage,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, FramesetError> {
    let (width, height) = image.dimensions();
    let pixels = image.as_raw();
    let mut bytes = Vec::new();

    match format {
        ImageFormat::Jpg => JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
            .write_image(pixels, width, height, ExtendedColorType::Rgb8)?,
        ImageFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(pixels, width, height, ExtendedColorType::Rgb8)?
        }
        ImageFormat::Bmp => {
            BmpEncoder::new(&mut bytes).write_image(pixels, width, height, ExtendedColorType::Rgb8)?
        }
        ImageFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
            pixels,
            width,
            height,
            ExtendedColorType::Rgb8,
        )?,
    }
    Ok(bytes)
}

/// Decode bytes produced by [`encode_image`] back to RGB8.
///
/// # Errors
///
/// Returns [`FramesetError::ImageError`] if the bytes cannot be decoded.
pub fn decode_image(bytes: &[u8], format: ImageFormat) -> Result<RgbImage, FramesetError> {
    let codec = match format {
        ImageFormat::Jpg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Bmp => image::ImageFormat::Bmp,
        ImageFormat::Webp => image::ImageFormat::WebP,
    };
    Ok(image::load_from_memory_with_format(bytes, codec)?.into_rgb8())
}

/// Write already encoded bytes to `path`, creating parent directories.
fn write_bytes(bytes: &[u8], path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()
}

/// Encode `image` to `path`.
///
/// Parent directories are created first. `quality` (1–100) is passed to the
/// JPEG encoder and ignored by the lossless formats.
///
/// # Errors
///
/// Returns [`FramesetError::SaveFailed`] describing the destination and the
/// underlying filesystem or encoder failure.
pub fn save_image(
    image: &RgbImage,
    path: &Path,
    format: ImageFormat,
    quality: u8,
) -> Result<(), FramesetError> {
    let bytes = encode_image(image, format, quality).map_err(|error| save_failed(path, error))?;
    write_bytes(&bytes, path).map_err(|error| save_failed(path, error))?;

    let (width, height) = image.dimensions();
    log::debug!("Saved {}x{} {} image to {}", width, height, format, path.display());
    Ok(())
}

fn save_failed(path: &Path, reason: impl Display) -> FramesetError {
    FramesetError::SaveFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Decode an image previously written by [`save_image`] as RGB8.
pub fn load_image(path: &Path) -> Result<RgbImage, FramesetError> {
    Ok(image::open(path)?.into_rgb8())
}

/// Writes images under consecutive sequence numbers of an [`OutputLayout`].
///
/// The sequence number only advances on a successful save, so the files on
/// disk are always `<prefix>_0` … `<prefix>_(saved - 1)` without gaps.
#[derive(Debug, Clone)]
pub struct SequentialWriter {
    layout: OutputLayout,
    quality: u8,
    saved: u64,
    failures: u64,
}

impl SequentialWriter {
    /// Start writing at sequence number 0.
    pub fn new(layout: OutputLayout, quality: u8) -> Self {
        Self {
            layout,
            quality,
            saved: 0,
            failures: 0,
        }
    }

    /// Save `image` under the next sequence number and return its path.
    ///
    /// # Errors
    ///
    /// Propagates the [`save_image`] failure; the failure is also counted in
    /// [`failures`](SequentialWriter::failures).
    pub fn write(&mut self, image: &RgbImage) -> Result<PathBuf, FramesetError> {
        let path = self.layout.path_for(self.saved);
        let result = save_image(image, &path, self.layout.format(), self.quality);
        self.record(result).map(|()| path)
    }

    /// Like [`write`](SequentialWriter::write), but also return the image
    /// exactly as a reader of the saved file will see it.
    ///
    /// For JPEG that is the decoded encoder output, not `image` itself.
    ///
    /// # Errors
    ///
    /// As for [`write`](SequentialWriter::write).
    pub fn write_and_reload(
        &mut self,
        image: &RgbImage,
    ) -> Result<(PathBuf, RgbImage), FramesetError> {
        let path = self.layout.path_for(self.saved);
        let format = self.layout.format();

        let result = encode_image(image, format, self.quality)
            .and_then(|bytes| {
                // Lossless encodings decode to the same pixels.
                let stored = if format.uses_quality() {
                    decode_image(&bytes, format)?
                } else {
                    image.clone()
                };
                Ok((bytes, stored))
            })
            .map_err(|error| save_failed(&path, error))
            .and_then(|(bytes, stored)| {
                write_bytes(&bytes, &path).map_err(|error| save_failed(&path, error))?;
                Ok(stored)
            });

        self.record(result).map(|stored| (path, stored))
    }

    fn record<T>(&mut self, result: Result<T, FramesetError>) -> Result<T, FramesetError> {
        match result {
            Ok(value) => {
                self.saved += 1;
                Ok(value)
            }
            Err(error) => {
                self.failures += 1;
                Err(error)
            }
        }
    }

    /// Number of images saved so far.
    pub fn saved(&self) -> u64 {
        self.saved
    }

    /// Number of saves that failed so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Layout the writer saves into.
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }
}
