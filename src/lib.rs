//! # cutrate
//!
//! Shot segmentation and feature tables for short-form video virality
//! research.
//!
//! `cutrate` turns a scraped metadata table and a directory of downloaded
//! videos into two analysis tables: per-video shot statistics (how fast the
//! edit cuts) and a feature table combining those statistics with
//! engagement counts, TF-IDF text vectors and a virality bucket. Decoding is
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Detect Shots in One Video
//!
//! ```no_run
//! use cutrate::{ShotDetectionOptions, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let summary = video.detect_shots(&ShotDetectionOptions::default())?.summary();
//! println!("{} shots, {:.2}s on average", summary.num_shots, summary.average_shot_duration);
//! # Ok::<(), cutrate::CutrateError>(())
//! ```
//!
//! ### Run the Resumable Stages
//!
//! ```no_run
//! use cutrate::{
//!     BatchOptions, FeatureOptions, FfmpegShotDetector, ShotDetectionOptions, build_features,
//!     segment_videos,
//! };
//!
//! let options = BatchOptions::new().with_max_duration(180.0);
//! let mut detector = FfmpegShotDetector::new(ShotDetectionOptions::default());
//!
//! segment_videos(
//!     "data/video_metadata.csv",
//!     "data/raw_videos",
//!     "data/video_shots.csv",
//!     &mut detector,
//!     &options,
//! )?;
//! build_features(
//!     "data/video_metadata.csv",
//!     "data/video_shots.csv",
//!     "data/video_features.csv",
//!     &FeatureOptions::default(),
//!     &options,
//! )?;
//! # Ok::<(), cutrate::CutrateError>(())
//! ```
//!
//! ## Features
//!
//! - **Shot detection**: adaptive and fixed-threshold HSV content detectors,
//!   or FFmpeg's `scdet` filter
//! - **Shot statistics**: shot count, per-shot durations, mean and sample
//!   variance
//! - **Resumable batches**: append-only CSV outputs keyed by video id;
//!   re-running a stage only processes what is missing
//! - **Text features**: smoothed TF-IDF over titles and descriptions
//! - **Virality buckets**: five ordinal view-count classes
//! - **Housekeeping**: id deduplication, yt-dlp metadata import, video
//!   library verification
//! - **Progress & cancellation**: callbacks and `CancellationToken` for long
//!   batches
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod batch;
pub mod config;
mod conversion;
pub mod dedup;
pub mod detector;
pub mod error;
pub mod features;
pub mod ffmpeg;
pub mod import;
pub mod library;
pub mod metadata;
pub mod progress;
pub mod records;
pub mod scene;
pub mod shots;
pub mod table;
pub mod tfidf;
pub mod video_file;
pub mod virality;

pub use batch::{BatchReport, segment_videos};
pub use config::{
    BatchOptions, DEFAULT_MAX_DURATION_SECONDS, DEFAULT_MAX_FEATURES, FeatureOptions,
};
pub use dedup::{DedupReport, dedup_csv};
pub use detector::{AdaptiveDetector, ContentDetector, CutDetector, HsvFrame, content_value};
pub use error::CutrateError;
pub use features::{TextModels, build_features, read_shot_table};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use import::{ImportReport, import_metadata};
pub use library::{VerificationReport, VideoLibrary};
pub use metadata::VideoMetadata;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use records::{FeatureRow, MetadataRecord, ShotSummaryRow, TableRow};
pub use scene::{
    DetectorKind, FfmpegShotDetector, ShotDetection, ShotDetectionOptions, ShotDetector,
};
pub use shots::{ShotBoundary, ShotSummary};
pub use table::{MetadataStore, MetadataTable, OutputTable};
pub use tfidf::{TfidfModel, TfidfVectorizer};
pub use video_file::VideoFile;
pub use virality::{BinClosure, ViralityBucket};
