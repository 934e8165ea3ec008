//! Resumable shot segmentation.
//!
//! [`segment_videos`] walks the metadata table and appends one
//! [`ShotSummaryRow`] per video to the shot table. A row's presence in the
//! output is the only completion marker, so an interrupted run is resumed
//! by running it again. Per-video failures are logged, collected in the
//! returned [`BatchReport`] and never abort the batch.
//!
//! # Example
//!
//! ```no_run
//! use cutrate::{BatchOptions, FfmpegShotDetector, ShotDetectionOptions, segment_videos};
//!
//! let mut detector = FfmpegShotDetector::new(ShotDetectionOptions::default());
//! let report = segment_videos(
//!     "data/video_metadata.csv",
//!     "data/raw_videos",
//!     "data/video_shots.csv",
//!     &mut detector,
//!     &BatchOptions::default(),
//! )?;
//! println!("{report}");
//! # Ok::<(), cutrate::CutrateError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use crate::{
    config::BatchOptions,
    error::CutrateError,
    library::video_path,
    progress::{OperationType, ProgressTracker},
    records::{MetadataRecord, ShotSummaryRow},
    scene::ShotDetector,
    table::{MetadataTable, OutputTable},
};

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Rows appended during this run.
    pub processed: usize,
    /// Inputs already present in the output.
    pub skipped_existing: usize,
    /// Inputs longer than the duration ceiling.
    pub skipped_too_long: usize,
    /// Ids whose prerequisite input (video file or shot row) was missing.
    pub missing_inputs: Vec<String>,
    /// `(id, reason)` for inputs that failed.
    pub failures: Vec<(String, String)>,
}

impl BatchReport {
    /// Total inputs examined.
    pub fn total(&self) -> usize {
        self.processed
            + self.skipped_existing
            + self.skipped_too_long
            + self.missing_inputs.len()
            + self.failures.len()
    }

    /// Returns `true` if nothing was missing or failed.
    pub fn is_clean(&self) -> bool {
        self.missing_inputs.is_empty() && self.failures.is_empty()
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} appended, {} already present, {} over duration limit, {} missing input, {} failed",
            self.processed,
            self.skipped_existing,
            self.skipped_too_long,
            self.missing_inputs.len(),
            self.failures.len(),
        )
    }
}

/// Decision for one input row before any expensive work is done.
pub(crate) enum Admission {
    Proceed,
    AlreadyPresent,
    TooLong,
}

pub(crate) fn admit(record: &MetadataRecord, output: &OutputTable, options: &BatchOptions) -> Admission {
    if output.contains(&record.id) {
        Admission::AlreadyPresent
    } else if record.duration > options.max_duration {
        Admission::TooLong
    } else {
        Admission::Proceed
    }
}

/// Detect shots for every eligible video and append the summaries.
///
/// A video is eligible when its id is absent from `output_path`, its
/// metadata duration is within [`BatchOptions::max_duration`] and
/// `<videos_dir>/<id>.mp4` exists.
///
/// # Errors
///
/// Returns an error only when the input table cannot be read, the output
/// cannot be written, or the batch is cancelled. Rows appended before the
/// error stay in the output.
pub fn segment_videos<D: ShotDetector + ?Sized>(
    metadata_path: impl AsRef<Path>,
    videos_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    detector: &mut D,
    options: &BatchOptions,
) -> Result<BatchReport, CutrateError> {
    let metadata = MetadataTable::read(metadata_path)?;
    let mut output = OutputTable::open(output_path)?;
    let videos_dir = videos_dir.as_ref();

    let mut report = BatchReport::default();
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::ShotSegmentation,
        Some(metadata.len() as u64),
        options.batch_size,
    );

    for record in &metadata.records {
        if options.is_cancelled() {
            log::info!("Segmentation cancelled after {} row(s)", report.processed);
            return Err(CutrateError::Cancelled);
        }

        match admit(record, &output, options) {
            Admission::AlreadyPresent => {
                log::debug!("{}: already segmented", record.id);
                report.skipped_existing += 1;
            }
            Admission::TooLong => {
                log::debug!(
                    "{}: duration {}s exceeds {}s, skipping",
                    record.id,
                    record.duration,
                    options.max_duration
                );
                report.skipped_too_long += 1;
            }
            Admission::Proceed => {
                let path = video_path(videos_dir, &record.id);
                if !path.is_file() {
                    log::warn!("{}: video file not found at {}", record.id, path.display());
                    report.missing_inputs.push(record.id.clone());
                } else {
                    match detector.detect(&path) {
                        Ok(detection) => {
                            let row = ShotSummaryRow::from_detection(record, &detection);
                            output.append(&row)?;
                            log::debug!("{}: {} shot(s)", record.id, row.num_shots);
                            report.processed += 1;
                        }
                        Err(CutrateError::Cancelled) => return Err(CutrateError::Cancelled),
                        Err(error) => {
                            log::warn!("{}: shot detection failed: {error}", record.id);
                            report.failures.push((record.id.clone(), error.to_string()));
                        }
                    }
                }
            }
        }

        tracker.advance(&record.id);
    }

    tracker.finish();
    log::info!("Segmentation finished: {report}");
    Ok(report)
}
