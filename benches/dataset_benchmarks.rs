//! Benchmarks for sampling, augmentation, encoding and full dataset runs.
//!
//! Run with: cargo bench
//!
//! The full-run benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use frameset::{
    AugmentParams, DatasetBuilder, DatasetOptions, FfmpegLogLevel, ImageFormat, augment,
    encode_image, sample_indices,
};
use image::{Rgb, RgbImage};
use rand::{SeedableRng, rngs::StdRng};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn test_frame() -> RgbImage {
    RgbImage::from_fn(224, 224, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    })
}

fn benchmark_sampling(criterion: &mut Criterion) {
    criterion.bench_function("sample 5000 of 1M frame indices", |bencher| {
        bencher.iter(|| sample_indices(black_box(1_000_000), black_box(5000)));
    });
}

fn benchmark_encoding(criterion: &mut Criterion) {
    let frame = test_frame();

    criterion.bench_function("encode 224x224 jpeg q95", |bencher| {
        bencher.iter(|| encode_image(black_box(&frame), ImageFormat::Jpg, 95).unwrap());
    });

    criterion.bench_function("encode 224x224 png", |bencher| {
        bencher.iter(|| encode_image(black_box(&frame), ImageFormat::Png, 95).unwrap());
    });
}

fn benchmark_augmentation(criterion: &mut Criterion) {
    let frame = test_frame();
    let mut rng = StdRng::seed_from_u64(123);

    criterion.bench_function("augment 224x224 (random params)", |bencher| {
        bencher.iter(|| {
            let params = AugmentParams::sample(&mut rng, 0, frame.width(), frame.height());
            augment::apply(black_box(&frame), &params, &mut rng)
        });
    });
}

fn benchmark_full_run(criterion: &mut Criterion) {
    frameset::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let temporary_directory = tempfile::tempdir().unwrap();
    let options = DatasetOptions::new("bench")
        .with_size(64, 64)
        .with_target(100)
        .with_output_root(temporary_directory.path());
    let builder = DatasetBuilder::new(options);

    criterion.bench_function("dataset run (50 frames + 50 augmented)", |bencher| {
        bencher.iter(|| builder.run(SAMPLE_VIDEO).unwrap());
    });
}

criterion::criterion_group!(
    benches,
    benchmark_sampling,
    benchmark_encoding,
    benchmark_augmentation,
    benchmark_full_run,
);
criterion::criterion_main!(benches);
