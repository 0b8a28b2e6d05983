//! FFmpeg-backed source and full-pipeline tests.
//!
//! Fixture-based tests require `tests/fixtures/generate_fixtures.sh` and
//! are skipped when the fixtures are absent.

use std::path::Path;

use frameset::{DatasetBuilder, DatasetOptions, FrameSource, FramesetError, VideoSource, load_image};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_avi_path() -> &'static str {
    "tests/fixtures/sample_video.avi"
}

fn sample_raw_stream_path() -> &'static str {
    "tests/fixtures/sample_video.h264"
}

#[test]
fn open_nonexistent_file() {
    let result = VideoSource::open("this_file_does_not_exist.mp4");
    let error = result.unwrap_err();
    assert!(matches!(error, FramesetError::FileOpen { .. }));
    assert!(
        error.to_string().contains("Failed to open video file"),
        "Error message should mention file open failure: {error}",
    );
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let result = VideoSource::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid video file");
}

#[test]
fn builder_reports_missing_video() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = DatasetOptions::new("missing").with_output_root(temporary_directory.path());

    let result = DatasetBuilder::new(options).run("this_file_does_not_exist.mp4");

    assert!(matches!(result, Err(FramesetError::FileOpen { .. })));
    assert!(!temporary_directory.path().join("missing").exists());
}

#[test]
fn metadata_and_frame_count() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let metadata = source.metadata().clone();
    assert_eq!((metadata.width, metadata.height), (64, 48));
    assert!((metadata.frames_per_second - 25.0).abs() < 0.01);
    assert_eq!(source.total_frames().unwrap(), 50);
}

#[test]
fn reads_every_frame_once() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let mut count = 0;
    while let Some(frame) = source.read_next(None).expect("Decode error") {
        assert_eq!(frame.dimensions(), (64, 48));
        count += 1;
    }
    assert_eq!(count, 50);
    assert!(source.read_next(None).unwrap().is_none());

    source.close();
    source.close();
    assert!(!source.advance().unwrap());
}

#[test]
fn total_frames_leaves_read_position_at_start() {
    let path = sample_avi_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let total = source.total_frames().unwrap();
    assert!(total > 0);

    let mut count = 0u64;
    while source.advance().expect("Decode error") {
        count += 1;
    }
    assert_eq!(count, total);
}

#[test]
fn frame_count_by_decoding_rewinds_to_first_frame() {
    let path = sample_raw_stream_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    assert_eq!(source.metadata().known_frame_count(), None);
    assert_eq!(source.total_frames().unwrap(), 50);
    // Cached after the first scan.
    assert_eq!(source.total_frames().unwrap(), 50);

    let first = source
        .read_next(None)
        .expect("Decode error")
        .expect("Stream should restart at frame 0");
    let mut fresh = VideoSource::open(path).expect("Failed to open fixture");
    let expected = fresh.read_next(None).unwrap().unwrap();
    assert_eq!(first, expected);

    let mut remaining = 1u64;
    while source.advance().expect("Decode error") {
        remaining += 1;
    }
    assert_eq!(remaining, 50);
}

#[test]
fn frames_are_scaled_to_the_requested_size() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let stretched = source.read_next(Some((100, 10))).unwrap().unwrap();
    assert_eq!(stretched.dimensions(), (100, 10));
    let shrunk = source.read_next(Some((16, 16))).unwrap().unwrap();
    assert_eq!(shrunk.dimensions(), (16, 16));
    let native = source.read_next(None).unwrap().unwrap();
    assert_eq!(native.dimensions(), (64, 48));
}

#[test]
fn dataset_from_long_enough_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = DatasetOptions::new("testsrc")
        .with_size(32, 20)
        .with_target(10)
        .with_output_root(temporary_directory.path());

    let report = DatasetBuilder::new(options).run(path).expect("Run failed");

    assert_eq!(report.extracted, 10);
    assert_eq!(report.augmented, 0);
    for index in 0..10 {
        let image = load_image(&report.output_directory.join(format!("testsrc_{index}.jpg")))
            .expect("Failed to decode output");
        assert_eq!(image.dimensions(), (32, 20));
    }
    assert!(!report.output_directory.join("testsrc_10.jpg").exists());
}

#[test]
fn dataset_from_short_video_is_augmented() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = DatasetOptions::new("testsrc")
        .with_size(16, 16)
        .with_target(80)
        .with_output_root(temporary_directory.path());

    let report = DatasetBuilder::new(options).run(path).expect("Run failed");

    assert_eq!(report.extracted, 50);
    assert_eq!(report.augmented, 30);
    assert!(report.is_complete());
    assert!(report.output_directory.join("testsrc_79.jpg").is_file());
}

#[test]
fn repeated_runs_with_one_seed_match() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let first_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let second_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let run = |root: &Path| {
        let options = DatasetOptions::new("seeded")
            .with_size(16, 16)
            .with_target(60)
            .with_seed(9)
            .with_output_root(root);
        DatasetBuilder::new(options).run(path).expect("Run failed")
    };
    let first = run(first_directory.path());
    let second = run(second_directory.path());

    assert_eq!(first.augment_params, second.augment_params);
    for index in 0..60 {
        let name = format!("seeded_{index}.jpg");
        assert_eq!(
            std::fs::read(first.output_directory.join(&name)).unwrap(),
            std::fs::read(second.output_directory.join(&name)).unwrap(),
            "{name} differs"
        );
    }
}
