//! Feature table construction.
//!
//! Joins the metadata table with the shot table, adds TF-IDF vectors of the
//! title and description and the virality bucket, and appends one
//! [`FeatureRow`] per video. The TF-IDF models are fitted over every
//! metadata row, so the vocabulary depends on the corpus and not on which
//! rows this run happens to append.

use std::collections::HashMap;
use std::path::Path;

use crate::{
    batch::{Admission, BatchReport, admit},
    config::{BatchOptions, FeatureOptions},
    error::CutrateError,
    progress::{OperationType, ProgressTracker},
    records::{FeatureRow, MetadataRecord, ShotSummaryRow},
    table::{MetadataTable, OutputTable},
    tfidf::{TfidfModel, TfidfVectorizer},
    virality::ViralityBucket,
};

/// Load the shot table as a map keyed by id. The first row of an id wins.
///
/// A missing file yields an empty map.
pub fn read_shot_table(path: impl AsRef<Path>) -> Result<HashMap<String, ShotSummaryRow>, CutrateError> {
    let path = path.as_ref();
    let mut rows = HashMap::new();
    if !path.exists() {
        log::warn!("Shot table {} does not exist", path.display());
        return Ok(rows);
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| CutrateError::csv(path, e))?;
    for result in reader.deserialize::<ShotSummaryRow>() {
        match result {
            Ok(row) => {
                rows.entry(row.id.clone()).or_insert(row);
            }
            Err(error) => log::warn!("{}: skipping unreadable row: {error}", path.display()),
        }
    }
    Ok(rows)
}

/// Fitted text models for one feature run.
#[derive(Debug, Clone)]
pub struct TextModels {
    /// Model fitted on titles.
    pub title: TfidfModel,
    /// Model fitted on descriptions.
    pub description: TfidfModel,
    width: usize,
}

impl TextModels {
    /// Fit title and description models independently over `records`.
    pub fn fit(records: &[MetadataRecord], max_features: usize) -> Self {
        let vectorizer = TfidfVectorizer::new(max_features);
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        let descriptions: Vec<&str> = records.iter().map(|r| r.description.as_str()).collect();

        Self {
            title: vectorizer.fit(&titles),
            description: vectorizer.fit(&descriptions),
            width: max_features,
        }
    }

    /// Build the feature row of `record` from its shot summary.
    pub fn feature_row(
        &self,
        record: &MetadataRecord,
        shots: &ShotSummaryRow,
        options: &FeatureOptions,
    ) -> FeatureRow {
        FeatureRow {
            id: record.id.clone(),
            view_count: record.view_count,
            like_count: record.like_count,
            comment_count: record.comment_count,
            duration: record.duration,
            total_frames: shots.total_frames,
            shot_durations: shots.shot_durations.clone(),
            num_shots: shots.num_shots,
            shot_duration_variance: shots.shot_duration_variance,
            average_shot_duration: shots.average_shot_duration,
            virality: ViralityBucket::from_views(record.view_count, options.bin_closure),
            title_vector: self.title.transform_padded(&record.title, self.width),
            description_vector: self
                .description
                .transform_padded(&record.description, self.width),
        }
    }
}

/// Append a feature row for every eligible metadata row.
///
/// A row is eligible when its id is absent from `output_path`, its duration
/// is within [`BatchOptions::max_duration`] and the shot table has a row
/// for it. Rows without a shot summary are reported in
/// [`BatchReport::missing_inputs`].
pub fn build_features(
    metadata_path: impl AsRef<Path>,
    shots_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    features: &FeatureOptions,
    options: &BatchOptions,
) -> Result<BatchReport, CutrateError> {
    if features.max_features == 0 {
        return Err(CutrateError::InvalidConfiguration(
            "max_features must be at least 1".to_string(),
        ));
    }

    let metadata = MetadataTable::read(metadata_path)?;
    let shots = read_shot_table(shots_path)?;
    let mut output = OutputTable::open(output_path)?;
    let models = TextModels::fit(&metadata.records, features.max_features);

    let mut report = BatchReport::default();
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FeatureBuilding,
        Some(metadata.len() as u64),
        options.batch_size,
    );

    for record in &metadata.records {
        if options.is_cancelled() {
            log::info!("Feature building cancelled after {} row(s)", report.processed);
            return Err(CutrateError::Cancelled);
        }

        match admit(record, &output, options) {
            Admission::AlreadyPresent => report.skipped_existing += 1,
            Admission::TooLong => report.skipped_too_long += 1,
            Admission::Proceed => match shots.get(&record.id) {
                Some(shot_row) => {
                    output.append(&models.feature_row(record, shot_row, features))?;
                    report.processed += 1;
                }
                None => {
                    log::warn!("{}: no shot summary, skipping", record.id);
                    report.missing_inputs.push(record.id.clone());
                }
            },
        }

        tracker.advance(&record.id);
    }

    tracker.finish();
    log::info!("Feature building finished: {report}");
    Ok(report)
}
