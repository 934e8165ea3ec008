use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use cutrate::{
    BatchOptions, BatchReport, BinClosure, DEFAULT_MAX_DURATION_SECONDS, DEFAULT_MAX_FEATURES,
    DetectorKind, FeatureOptions, FfmpegLogLevel, FfmpegShotDetector, MetadataStore,
    MetadataTable, ProgressCallback, ProgressInfo, ShotDetectionOptions, VideoFile, VideoLibrary,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  cutrate shots data/raw_videos/abc123.mp4 --json\n  cutrate segment --progress --verbose\n  cutrate features --max-features 50\n  cutrate dedup data/video_metadata.csv\n  cutrate completions zsh > _cutrate";

const DEFAULT_METADATA_PATH: &str = "data/video_metadata.csv";
const DEFAULT_VIDEOS_DIR: &str = "data/raw_videos";
const DEFAULT_SHOTS_PATH: &str = "data/video_shots.csv";
const DEFAULT_FEATURES_PATH: &str = "data/video_features.csv";

#[derive(Debug, Parser)]
#[command(
    name = "cutrate",
    version,
    about = "Segment short-form videos into shots and build virality feature tables",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar for batch stages.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect shots in a single video.
    #[command(
        about = "Detect shots in one video",
        after_help = "Examples:\n  cutrate shots input.mp4\n  cutrate shots input.mp4 --detector content --threshold 30 --json"
    )]
    Shots {
        /// Input video path.
        input: PathBuf,
        /// Detector: adaptive | content | scdet.
        #[arg(long, default_value = "adaptive")]
        detector: String,
        /// Detector-specific threshold.
        #[arg(long)]
        threshold: Option<f64>,
        /// Output boundaries and statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Append shot summaries for every unsegmented video.
    #[command(
        about = "Segment all videos into shots (resumable)",
        after_help = "Examples:\n  cutrate segment\n  cutrate segment --max-duration 300 --detector scdet --progress"
    )]
    Segment {
        /// Metadata table.
        #[arg(long, default_value = DEFAULT_METADATA_PATH)]
        metadata: PathBuf,
        /// Directory of downloaded `<id>.mp4` files.
        #[arg(long, default_value = DEFAULT_VIDEOS_DIR)]
        videos: PathBuf,
        /// Shot table to append to.
        #[arg(long, default_value = DEFAULT_SHOTS_PATH)]
        out: PathBuf,
        /// Skip videos longer than this many seconds.
        #[arg(long, default_value_t = DEFAULT_MAX_DURATION_SECONDS)]
        max_duration: f64,
        /// Detector: adaptive | content | scdet.
        #[arg(long, default_value = "adaptive")]
        detector: String,
        /// Detector-specific threshold.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Append feature rows for every segmented video.
    #[command(
        about = "Build the feature table (resumable)",
        after_help = "Examples:\n  cutrate features\n  cutrate features --max-features 100 --bins left"
    )]
    Features {
        /// Metadata table.
        #[arg(long, default_value = DEFAULT_METADATA_PATH)]
        metadata: PathBuf,
        /// Shot table produced by `segment`.
        #[arg(long, default_value = DEFAULT_SHOTS_PATH)]
        shots: PathBuf,
        /// Feature table to append to.
        #[arg(long, default_value = DEFAULT_FEATURES_PATH)]
        out: PathBuf,
        /// TF-IDF components per text field.
        #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
        max_features: usize,
        /// Skip videos longer than this many seconds.
        #[arg(long, default_value_t = DEFAULT_MAX_DURATION_SECONDS)]
        max_duration: f64,
        /// Virality bin closure: right | left.
        #[arg(long, default_value = "right")]
        bins: String,
    },

    /// Keep the first row of every id in a CSV table.
    #[command(about = "Deduplicate a table by id")]
    Dedup {
        /// Table to deduplicate.
        input: PathBuf,
        /// Write here instead of replacing the input.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check the video directory against the metadata table.
    #[command(
        about = "Verify downloaded videos",
        after_help = "Examples:\n  cutrate verify\n  cutrate verify --remove-duplicates"
    )]
    Verify {
        /// Metadata table.
        #[arg(long, default_value = DEFAULT_METADATA_PATH)]
        metadata: PathBuf,
        /// Directory of downloaded videos.
        #[arg(long, default_value = DEFAULT_VIDEOS_DIR)]
        videos: PathBuf,
        /// Delete all but one file per duplicated id.
        #[arg(long)]
        remove_duplicates: bool,
    },

    /// Append yt-dlp info JSON to the metadata table.
    #[command(
        about = "Import yt-dlp metadata",
        after_help = "Examples:\n  yt-dlp --dump-json URL > info.jsonl && cutrate import-metadata info.jsonl\n  cutrate import-metadata downloads/"
    )]
    ImportMetadata {
        /// JSON-lines file or directory of `*.info.json` files.
        input: PathBuf,
        /// Metadata table to append to.
        #[arg(long, default_value = DEFAULT_METADATA_PATH)]
        metadata: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_detector(value: &str) -> Result<DetectorKind, Box<dyn std::error::Error>> {
    value
        .parse::<DetectorKind>()
        .map_err(|_| format!("unsupported --detector: {value}").into())
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    value.parse().ok()
}

fn parse_bin_closure(value: &str) -> Option<BinClosure> {
    value.parse().ok()
}

fn detection_options(
    detector: &str,
    threshold: Option<f64>,
) -> Result<ShotDetectionOptions, Box<dyn std::error::Error>> {
    let mut options = ShotDetectionOptions::new().detector(parse_detector(detector)?);
    if let Some(threshold) = threshold {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(format!("invalid --threshold: {threshold}").into());
        }
        options = options.threshold(threshold);
    }
    Ok(options)
}

fn init_logging(global: &GlobalOptions) {
    let default_level = if global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global);

    match &global.log_level {
        Some(level) => {
            let parsed =
                parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
            cutrate::set_ffmpeg_log_level(parsed);
        }
        None => cutrate::set_ffmpeg_log_level(FfmpegLogLevel::Error),
    }

    Ok(())
}

fn batch_options(global: &GlobalOptions, max_duration: f64) -> Result<BatchOptions, Box<dyn std::error::Error>> {
    if !max_duration.is_finite() || max_duration <= 0.0 {
        return Err(format!("invalid --max-duration: {max_duration}").into());
    }

    let mut options = BatchOptions::new().with_max_duration(max_duration);
    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }
    Ok(options)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {elapsed_precise} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        match &info.current_id {
            Some(id) => self.bar.set_message(id.clone()),
            None => self.bar.finish_with_message("done"),
        }
    }
}

fn print_report(stage: &str, report: &BatchReport) {
    println!(
        "{} {}",
        "success:".green().bold(),
        format!("{stage}: {report}").green()
    );
    for id in &report.missing_inputs {
        eprintln!("{} {}", "warning:".yellow().bold(), format!("{id}: missing input").yellow());
    }
    for (id, reason) in &report.failures {
        eprintln!("{} {}", "warning:".yellow().bold(), format!("{id}: {reason}").yellow());
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Shots {
            input,
            detector,
            threshold,
            json,
        } => {
            let options = detection_options(&detector, threshold)?;
            let mut video = VideoFile::open(&input)?;
            let detection = video.detect_shots(&options)?;
            let boundaries = detection.boundaries();
            let summary = detection.summary();

            if json {
                let payload = json!({
                    "total_frames": detection.total_frames,
                    "frames_per_second": detection.frames_per_second,
                    "duration_seconds": detection.duration.as_secs_f64(),
                    "cuts": detection.cuts,
                    "shots": boundaries.iter().map(|boundary| json!({
                        "start_seconds": boundary.start,
                        "end_seconds": boundary.end,
                        "duration_seconds": boundary.duration(),
                    })).collect::<Vec<_>>(),
                    "num_shots": summary.num_shots,
                    "average_shot_duration": summary.average_shot_duration,
                    "shot_duration_variance": summary.shot_duration_variance,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for boundary in &boundaries {
                    println!(
                        "shot {:.3}s -> {:.3}s ({:.4}s)",
                        boundary.start,
                        boundary.end,
                        boundary.duration()
                    );
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "{} shot(s), average {:.4}s, variance {:.4}",
                        summary.num_shots,
                        summary.average_shot_duration,
                        summary.shot_duration_variance
                    )
                    .green()
                );
            }
        }
        Commands::Segment {
            metadata,
            videos,
            out,
            max_duration,
            detector,
            threshold,
        } => {
            let options = batch_options(&cli.global, max_duration)?;
            let mut shot_detector = FfmpegShotDetector::new(detection_options(&detector, threshold)?);
            ensure_parent_dir(&out)?;
            let report = cutrate::segment_videos(&metadata, &videos, &out, &mut shot_detector, &options)?;
            print_report("segment", &report);
        }
        Commands::Features {
            metadata,
            shots,
            out,
            max_features,
            max_duration,
            bins,
        } => {
            let closure =
                parse_bin_closure(&bins).ok_or(format!("unsupported --bins: {bins}"))?;
            let features = FeatureOptions::new()
                .max_features(max_features)
                .bin_closure(closure);
            let options = batch_options(&cli.global, max_duration)?;
            ensure_parent_dir(&out)?;
            let report = cutrate::build_features(&metadata, &shots, &out, &features, &options)?;
            print_report("features", &report);
        }
        Commands::Dedup { input, out } => {
            let report = cutrate::dedup_csv(&input, out.as_deref())?;
            let target = out.as_deref().unwrap_or(&input);
            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Kept {} row(s), dropped {} duplicate(s) -> {}",
                    report.kept,
                    report.dropped,
                    target.display()
                )
                .green()
            );
        }
        Commands::Verify {
            metadata,
            videos,
            remove_duplicates,
        } => {
            let table = MetadataTable::read(&metadata)?;
            let mut library = VideoLibrary::scan(&videos)?;
            let report = library.verify(table.records.iter().map(|record| record.id.as_str()));
            print!("{report}");
            if report.is_consistent() {
                println!();
            }

            if remove_duplicates {
                let removed = library.remove_duplicates()?;
                for path in &removed {
                    if cli.global.verbose {
                        eprintln!("removed {}", path.display());
                    }
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Removed {} duplicate file(s)", removed.len()).green()
                );
            }
        }
        Commands::ImportMetadata { input, metadata } => {
            ensure_parent_dir(&metadata)?;
            let mut store = MetadataStore::open(&metadata)?;
            let report = cutrate::import_metadata(&input, &mut store)?;
            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Imported {} record(s) ({} duplicate, {} invalid) into {}",
                    report.appended,
                    report.duplicates,
                    report.invalid,
                    metadata.display()
                )
                .green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "cutrate", &mut std::io::stdout());
        }
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
    use super::{Cli, detection_options, parse_bin_closure, parse_detector, parse_log_level};
    use clap::CommandFactory;
    use cutrate::{BinClosure, DetectorKind, FfmpegLogLevel};

    #[test]
    fn parse_detector_aliases() {
        assert_eq!(parse_detector("adaptive").unwrap(), DetectorKind::Adaptive);
        assert_eq!(parse_detector("CONTENT").unwrap(), DetectorKind::Content);
        assert_eq!(parse_detector("scdet").unwrap(), DetectorKind::Scdet);
        assert_eq!(parse_detector("ffmpeg").unwrap(), DetectorKind::Scdet);
        assert!(parse_detector("histogram").is_err());
    }

    #[test]
    fn parse_log_level_aliases() {
        assert_eq!(parse_log_level("warn"), Some(FfmpegLogLevel::Warning));
        assert_eq!(parse_log_level("quiet"), Some(FfmpegLogLevel::Quiet));
        assert!(parse_log_level("loud").is_none());
    }

    #[test]
    fn parse_bin_closure_sides() {
        assert_eq!(parse_bin_closure("right"), Some(BinClosure::Right));
        assert_eq!(parse_bin_closure("Left"), Some(BinClosure::Left));
        assert!(parse_bin_closure("both").is_none());
    }

    #[test]
    fn detection_options_rejects_negative_threshold() {
        assert!(detection_options("content", Some(-1.0)).is_err());
        let options = detection_options("content", Some(30.0)).unwrap();
        assert_eq!(options.threshold, Some(30.0));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
