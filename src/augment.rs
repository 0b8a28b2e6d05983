//! Seeded, light-weight image augmentation.
//!
//! When a video has fewer frames than the requested dataset size, the
//! remaining images are synthesized from frames that were already
//! extracted. Each synthesized image is a randomly chosen pool image with
//! the following transforms applied in this order:
//!
//! 1. horizontal mirror (p = 0.5);
//! 2. contrast × U[0.9, 1.1] plus brightness U[-12, 12], clipped;
//! 3. (p = 0.5) rotation U[-3°, 3°] about the centre plus a translation of
//!    up to 1% of each dimension, with reflected borders;
//! 4. (p = 0.5) additive Gaussian noise, σ = 4.
//!
//! All randomness comes from the caller's [`Rng`], so a seeded generator
//! reproduces the exact same images and [`AugmentParams`] sequence.

use image::{
    RgbImage,
    imageops::{self, FilterType},
};
use rand::Rng;

use crate::error::FramesetError;

/// Range of the multiplicative contrast factor.
pub const CONTRAST_RANGE: (f32, f32) = (0.9, 1.1);
/// Range of the additive brightness offset.
pub const BRIGHTNESS_RANGE: (f32, f32) = (-12.0, 12.0);
/// Maximum absolute rotation, in degrees.
pub const MAX_ROTATION_DEGREES: f32 = 3.0;
/// Maximum translation as a fraction of the image width/height.
pub const MAX_TRANSLATION_FRACTION: f32 = 0.01;
/// Standard deviation of the additive Gaussian noise.
pub const NOISE_STANDARD_DEVIATION: f32 = 4.0;

/// Small rotation plus translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineJitter {
    /// Counter-clockwise rotation about the image centre, in degrees.
    pub angle_degrees: f32,
    /// Horizontal shift in pixels.
    pub translate_x: f32,
    /// Vertical shift in pixels.
    pub translate_y: f32,
}

/// The random choices made for one synthesized image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentParams {
    /// Index of the pool image the augmentation started from.
    pub source_index: usize,
    /// Mirror horizontally.
    pub mirror: bool,
    /// Contrast factor.
    pub contrast: f32,
    /// Brightness offset.
    pub brightness: f32,
    /// Rotation/translation, if drawn.
    pub affine: Option<AffineJitter>,
    /// Whether Gaussian noise is added.
    pub noise: bool,
}

impl AugmentParams {
    /// Draw a parameter set for an image of `width` × `height` taken from
    /// pool slot `source_index`.
    pub fn sample<R: Rng + ?Sized>(
        rng: &mut R,
        source_index: usize,
        width: u32,
        height: u32,
    ) -> Self {
        let mirror = rng.gen_bool(0.5);
        let contrast = rng.gen_range(CONTRAST_RANGE.0..=CONTRAST_RANGE.1);
        let brightness = rng.gen_range(BRIGHTNESS_RANGE.0..=BRIGHTNESS_RANGE.1);

        let affine = if rng.gen_bool(0.5) {
            let max_x = MAX_TRANSLATION_FRACTION * width as f32;
            let max_y = MAX_TRANSLATION_FRACTION * height as f32;
            Some(AffineJitter {
                angle_degrees: rng.gen_range(-MAX_ROTATION_DEGREES..=MAX_ROTATION_DEGREES),
                translate_x: rng.gen_range(-max_x..=max_x),
                translate_y: rng.gen_range(-max_y..=max_y),
            })
        } else {
            None
        };

        let noise = rng.gen_bool(0.5);

        Self {
            source_index,
            mirror,
            contrast,
            brightness,
            affine,
            noise,
        }
    }
}

/// Apply `params` to `image`.
///
/// `rng` is only consumed when [`AugmentParams::noise`] is set.
pub fn apply<R: Rng + ?Sized>(image: &RgbImage, params: &AugmentParams, rng: &mut R) -> RgbImage {
    let mut output = if params.mirror {
        imageops::flip_horizontal(image)
    } else {
        image.clone()
    };

    adjust_contrast_brightness(&mut output, params.contrast, params.brightness);

    if let Some(affine) = &params.affine {
        output = warp_affine(&output, affine);
    }

    if params.noise {
        add_gaussian_noise(&mut output, NOISE_STANDARD_DEVIATION, rng);
    }

    output
}

/// What an augmentation run produced.
#[derive(Debug, Clone, Default)]
pub struct AugmentationOutcome {
    /// Images that were synthesized and saved.
    pub generated: u64,
    /// Saves that failed and were retried with a fresh draw.
    pub save_failures: u64,
    /// Parameters of every saved image, in save order.
    pub params: Vec<AugmentParams>,
}

/// Synthesize `needed` images from `pool` and hand each to `persist`.
///
/// Pool images normally already have the output size; any that do not
/// are resized to exactly `width` × `height` before being persisted. Failed saves are counted and the loop draws again, until
/// `needed` saves succeeded. An empty pool yields an empty outcome.
///
/// # Errors
///
/// Returns [`FramesetError::PersistenceExhausted`] once
/// `max_consecutive_failures` saves in a row have failed.
pub fn top_up<R, F>(
    pool: &[RgbImage],
    needed: u64,
    (width, height): (u32, u32),
    rng: &mut R,
    max_consecutive_failures: u32,
    mut persist: F,
) -> Result<AugmentationOutcome, FramesetError>
where
    R: Rng + ?Sized,
    F: FnMut(&RgbImage) -> Result<(), FramesetError>,
{
    let mut outcome = AugmentationOutcome::default();
    if pool.is_empty() {
        return Ok(outcome);
    }

    let mut consecutive_failures = 0u32;
    while outcome.generated < needed {
        let source_index = rng.gen_range(0..pool.len());
        let source = &pool[source_index];
        let params = AugmentParams::sample(rng, source_index, source.width(), source.height());
        let augmented = apply(source, &params, rng);
        let augmented = if augmented.dimensions() == (width, height) {
            augmented
        } else {
            imageops::resize(&augmented, width, height, FilterType::Triangle)
        };

        match persist(&augmented) {
            Ok(()) => {
                outcome.generated += 1;
                outcome.params.push(params);
                consecutive_failures = 0;
            }
            Err(error) => {
                outcome.save_failures += 1;
                consecutive_failures += 1;
                log::warn!("Augmented image not saved: {error}");
                if consecutive_failures >= max_consecutive_failures {
                    return Err(FramesetError::PersistenceExhausted {
                        failures: consecutive_failures,
                    });
                }
            }
        }
    }

    Ok(outcome)
}

fn adjust_contrast_brightness(image: &mut RgbImage, contrast: f32, brightness: f32) {
    for value in image.iter_mut() {
        *value = (*value as f32 * contrast + brightness).round().clamp(0.0, 255.0) as u8;
    }
}

/// Rotate about the centre and shift, sampling bilinearly with
/// reflect-101 borders (`dcb|abcd|cba`).
fn warp_affine(image: &RgbImage, affine: &AffineJitter) -> RgbImage {
    let (width, height) = image.dimensions();
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let (sin, cos) = affine.angle_degrees.to_radians().sin_cos();

    RgbImage::from_fn(width, height, |x, y| {
        // Inverse of: dst = R * (src - c) + c + t
        let dx = x as f32 - center_x - affine.translate_x;
        let dy = y as f32 - center_y - affine.translate_y;
        let source_x = cos * dx - sin * dy + center_x;
        let source_y = sin * dx + cos * dy + center_y;
        sample_bilinear(image, source_x, source_y)
    })
}

fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> image::Rgb<u8> {
    let (width, height) = (image.width() as i64, image.height() as i64);
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let left = reflect_101(x0, width);
    let right = reflect_101(x0 + 1, width);
    let top = reflect_101(y0, height);
    let bottom = reflect_101(y0 + 1, height);

    let top_left = image.get_pixel(left, top).0;
    let top_right = image.get_pixel(right, top).0;
    let bottom_left = image.get_pixel(left, bottom).0;
    let bottom_right = image.get_pixel(right, bottom).0;

    let mut pixel = [0u8; 3];
    for channel in 0..3 {
        let upper = top_left[channel] as f32 * (1.0 - fx) + top_right[channel] as f32 * fx;
        let lower = bottom_left[channel] as f32 * (1.0 - fx) + bottom_right[channel] as f32 * fx;
        pixel[channel] = (upper * (1.0 - fy) + lower * fy).round().clamp(0.0, 255.0) as u8;
    }
    image::Rgb(pixel)
}

/// Map `index` into `0..length` by mirroring without repeating the edge.
fn reflect_101(index: i64, length: i64) -> u32 {
    if length <= 1 {
        return 0;
    }
    let period = 2 * (length - 1);
    let folded = index.rem_euclid(period);
    let reflected = if folded < length {
        folded
    } else {
        period - folded
    };
    reflected as u32
}

fn add_gaussian_noise<R: Rng + ?Sized>(image: &mut RgbImage, standard_deviation: f32, rng: &mut R) {
    let mut spare: Option<f32> = None;
    for value in image.iter_mut() {
        let sample = match spare.take() {
            Some(sample) => sample,
            None => {
                let (first, second) = standard_normal_pair(rng);
                spare = Some(second);
                first
            }
        };
        let noisy = *value as f32 + sample * standard_deviation;
        *value = noisy.clamp(0.0, 255.0) as u8;
    }
}

/// Box–Muller transform: two independent N(0, 1) samples.
fn standard_normal_pair<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    // 1 - U[0, 1) lies in (0, 1], keeping ln() finite.
    let u1 = 1.0 - rng.r#gen::<f64>();
    let u2 = rng.r#gen::<f64>();
    let radius = (-2.0 * u1.ln()).sqrt();
    let theta = std::f64::consts::TAU * u2;
    ((radius * theta.cos()) as f32, (radius * theta.sin()) as f32)
}
