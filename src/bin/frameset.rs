use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use colored::Colorize;
use frameset::{
    DatasetBuilder, DatasetOptions, DatasetReport, FfmpegLogLevel, ImageFormat, OperationType,
    PoolMode, ProgressCallback, ProgressInfo,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  frameset cat.mp4 cat\n  frameset --width 128 --height 128 --target 1000 --format png -o data cat.mp4 cat\n  frameset --no-augment --progress --verbose cat.mp4 cat";

#[derive(Debug, Parser)]
#[command(
    name = "frameset",
    version,
    about = "Extract N evenly spaced frames from a video, resized to exactly WxH, topping up short videos with augmented copies",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video path.
    video: PathBuf,

    /// File name prefix: images are written as <prefix>_0.<ext>, <prefix>_1.<ext>, ...
    prefix: String,

    /// Output width in pixels.
    #[arg(long, default_value_t = 224)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 224)]
    height: u32,

    /// Number of images to produce.
    #[arg(long, default_value_t = 5000)]
    target: u64,

    /// Output format: jpg | png | bmp | webp.
    #[arg(long, default_value = "jpg")]
    format: String,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 95)]
    quality: u8,

    /// Output root directory; images go to <output>/<prefix>/.
    #[arg(short, long, default_value = "dataset_frames")]
    output: PathBuf,

    /// Do not fill a shortfall with augmented images.
    #[arg(long)]
    no_augment: bool,

    /// Seed for the augmentation random number generator.
    #[arg(long, default_value_t = 123)]
    seed: u64,

    /// Re-read saved images from disk for augmentation instead of keeping them in memory.
    #[arg(long)]
    low_memory: bool,

    /// Abort augmentation after this many saves in a row fail.
    #[arg(long, default_value_t = 32)]
    max_save_failures: u32,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Print the final report as JSON instead of status lines.
    #[arg(long)]
    json: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, default_value = "error")]
    ffmpeg_log_level: String,
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = match info.operation {
            OperationType::FrameExtraction => "extracting",
            OperationType::Augmentation => "augmenting",
            _ => "working",
        };
        if let Some(total) = info.total {
            if self.bar.length() != Some(total) || self.bar.message() != stage {
                self.bar.reset();
                self.bar.set_length(total);
                self.bar.set_message(stage);
            }
        }
        self.bar.set_position(info.current);
    }
}

fn parse_format(value: &str) -> Result<ImageFormat, Box<dyn std::error::Error>> {
    Ok(value.parse::<ImageFormat>()?)
}

fn parse_log_level(value: &str) -> Result<FfmpegLogLevel, Box<dyn std::error::Error>> {
    Ok(value.parse::<FfmpegLogLevel>()?)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn print_report(cli: &Cli, report: &DatasetReport) {
    if report.augmentation_attempted {
        println!(
            "{} {}",
            "info:".cyan().bold(),
            format!("Augmented images generated: {}", report.augmented).cyan()
        );
    }

    let video_name = cli
        .video
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.video.display().to_string());
    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "{video_name}: {} image(s) saved to {}",
            report.saved,
            report.output_directory.display()
        )
        .green()
    );

    if report.save_failures > 0 {
        println!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{} image(s) could not be saved", report.save_failures).yellow()
        );
    }

    if report.shortfall() > 0 {
        println!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "video did not reach {}; total={} (including augmented images, if any)",
                report.target, report.saved
            )
            .yellow()
        );
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    frameset::set_ffmpeg_log_level(parse_log_level(&cli.ffmpeg_log_level)?);

    if !cli.video.exists() {
        return Err(format!("video does not exist: {}", cli.video.display()).into());
    }

    let mut options = DatasetOptions::new(cli.prefix.as_str())
        .with_size(cli.width, cli.height)
        .with_target(cli.target)
        .with_format(parse_format(&cli.format)?)
        .with_quality(cli.quality)
        .with_output_root(&cli.output)
        .with_augmentation(!cli.no_augment)
        .with_seed(cli.seed)
        .with_max_consecutive_save_failures(cli.max_save_failures)
        .with_pool_mode(if cli.low_memory {
            PoolMode::ReloadFromDisk
        } else {
            PoolMode::InMemory
        });

    if options.quality_ignored() && !cli.json {
        println!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("--quality is ignored for {} output (lossless)", cli.format).yellow()
        );
    }

    let progress = if cli.progress {
        let progress = Arc::new(TerminalProgress::new()?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let report = DatasetBuilder::new(options).run(&cli.video)?;

    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }

    if cli.json {
        let payload = json!({
            "video": cli.video.display().to_string(),
            "output_directory": report.output_directory.display().to_string(),
            "target": report.target,
            "total_frames": report.total_frames,
            "extracted": report.extracted,
            "augmented": report.augmented,
            "saved": report.saved,
            "shortfall": report.shortfall(),
            "save_failures": report.save_failures,
            "conversion_failures": report.conversion_failures,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_report(&cli, &report);
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, parse_format, parse_log_level};

    #[test]
    fn parse_format_aliases() {
        assert!(parse_format("jpg").is_ok());
        assert!(parse_format("JPEG").is_ok());
        assert!(parse_format("png").is_ok());
        assert!(parse_format("bmp").is_ok());
        assert!(parse_format("webp").is_ok());
        assert!(parse_format("tiff").is_err());
    }

    #[test]
    fn parse_log_level_names() {
        assert!(parse_log_level("quiet").is_ok());
        assert!(parse_log_level("Warn").is_ok());
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["frameset", "clip.mp4", "cat"]).unwrap();
        assert_eq!(cli.width, 224);
        assert_eq!(cli.height, 224);
        assert_eq!(cli.target, 5000);
        assert_eq!(cli.format, "jpg");
        assert_eq!(cli.quality, 95);
        assert_eq!(cli.output.to_str(), Some("dataset_frames"));
        assert!(!cli.no_augment);
        assert_eq!(cli.seed, 123);
        assert_eq!(cli.prefix, "cat");
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::try_parse_from([
            "frameset",
            "--width",
            "64",
            "--height",
            "32",
            "--target",
            "10",
            "--format",
            "png",
            "-o",
            "out",
            "--no-augment",
            "clip.mp4",
            "dog",
        ])
        .unwrap();
        assert_eq!((cli.width, cli.height, cli.target), (64, 32, 10));
        assert_eq!(cli.output.to_str(), Some("out"));
        assert!(cli.no_augment);
        assert_eq!(cli.video.to_str(), Some("clip.mp4"));
    }
}
