//! DatasetOptions builder tests.

use frameset::{DatasetOptions, FramesetError, ImageFormat, PoolMode};

#[test]
fn options_defaults() {
    let options = DatasetOptions::new("cat");
    assert_eq!(options.prefix(), "cat");
    assert_eq!(options.size(), (224, 224));
    assert_eq!(options.target(), 5000);
    assert_eq!(options.seed(), 123);

    let debug = format!("{options:?}");
    assert!(debug.contains("DatasetOptions"));
    assert!(debug.contains("quality: 95"));
    assert!(debug.contains("augment: true"));
    assert!(debug.contains("pool_mode: InMemory"));
    assert!(debug.contains("format: Jpg"));
    assert!(options.validate().is_ok());
}

#[test]
fn options_layout_follows_root_and_prefix() {
    let options = DatasetOptions::new("dog")
        .with_output_root("out")
        .with_format(ImageFormat::Webp);
    let layout = options.layout();
    assert_eq!(layout.directory(), std::path::Path::new("out/dog"));
    assert_eq!(layout.path_for(3), std::path::Path::new("out/dog/dog_3.webp"));
}

#[test]
fn options_setters_are_recorded() {
    let options = DatasetOptions::new("x")
        .with_size(64, 32)
        .with_target(7)
        .with_seed(99)
        .with_augmentation(false)
        .with_pool_mode(PoolMode::ReloadFromDisk)
        .with_quality(50);
    assert_eq!(options.size(), (64, 32));
    assert_eq!(options.target(), 7);
    assert_eq!(options.seed(), 99);

    let debug = format!("{options:?}");
    assert!(debug.contains("augment: false"));
    assert!(debug.contains("pool_mode: ReloadFromDisk"));
    assert!(debug.contains("quality: 50"));
}

#[test]
fn max_save_failures_clamps_zero() {
    let options = DatasetOptions::new("x").with_max_consecutive_save_failures(0);
    let debug = format!("{options:?}");
    // Clamped to 1.
    assert!(debug.contains("max_consecutive_save_failures: 1"));
}

#[test]
fn validation_names_the_offending_option() {
    let cases = [
        (DatasetOptions::new(""), "prefix"),
        (DatasetOptions::new("a\\b"), "prefix"),
        (DatasetOptions::new("x").with_size(10, 0), "size"),
        (DatasetOptions::new("x").with_target(0), "target"),
        (DatasetOptions::new("x").with_quality(101), "quality"),
    ];
    for (options, expected) in cases {
        match options.validate() {
            Err(FramesetError::InvalidOption { name, .. }) => assert_eq!(name, expected),
            other => panic!("expected InvalidOption({expected}), got {other:?}"),
        }
    }
}

#[test]
fn quality_only_matters_for_jpeg() {
    assert!(!DatasetOptions::new("x").quality_ignored());
    assert!(!DatasetOptions::new("x").with_quality(60).quality_ignored());
    assert!(
        !DatasetOptions::new("x")
            .with_format(ImageFormat::Webp)
            .quality_ignored()
    );
    assert!(
        DatasetOptions::new("x")
            .with_format(ImageFormat::Webp)
            .with_quality(60)
            .quality_ignored()
    );
    assert!(
        DatasetOptions::new("x")
            .with_format(ImageFormat::Png)
            .with_quality(10)
            .quality_ignored()
    );
}
