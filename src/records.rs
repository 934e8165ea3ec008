//! Table rows.
//!
//! Every table in the pipeline is a flat CSV keyed by the video `id`. The
//! [`TableRow`] trait is what [`OutputTable`](crate::OutputTable) needs to
//! append a row: its id, its header and its rendered fields.

use serde::{Deserialize, Deserializer};

use crate::conversion::format_decimal;
use crate::error::CutrateError;
use crate::scene::ShotDetection;
use crate::shots::{ShotSummary, parse_durations};
use crate::virality::ViralityBucket;

/// A row that can be appended to an id-keyed CSV table.
pub trait TableRow {
    /// The row's key.
    fn id(&self) -> &str;

    /// Column names, `id` included.
    fn header(&self) -> Vec<String>;

    /// Rendered field values, aligned with [`header`](TableRow::header).
    fn fields(&self) -> Vec<String>;
}

/// Escape the characters the study's tables never store raw.
///
/// ```
/// assert_eq!(cutrate::records::sanitize_text("a,b\nc"), "a\\,b\\nc");
/// ```
pub fn sanitize_text(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace(',', "\\,")
}

/// Counts are sometimes blank (likes hidden, comments disabled) or were
/// written as floats by older tooling.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(count) = trimmed.parse::<u64>() {
        return Ok(count);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.is_finite() => Ok(value as u64),
        _ => Err(serde::de::Error::custom(format!(
            "expected a non-negative count, found {trimmed:?}"
        ))),
    }
}

/// One scraped video: the metadata table row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetadataRecord {
    /// Platform video id.
    pub id: String,
    /// Video title.
    #[serde(default)]
    pub title: String,
    /// Video description.
    #[serde(default)]
    pub description: String,
    /// View count.
    #[serde(default, alias = "viewCount", deserialize_with = "deserialize_count")]
    pub view_count: u64,
    /// Like count.
    #[serde(default, alias = "likeCount", deserialize_with = "deserialize_count")]
    pub like_count: u64,
    /// Comment count.
    #[serde(
        default,
        alias = "commentCount",
        deserialize_with = "deserialize_count"
    )]
    pub comment_count: u64,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: f64,
}

impl MetadataRecord {
    /// Column names of the metadata table.
    pub const HEADER: [&'static str; 7] = [
        "id",
        "title",
        "description",
        "view_count",
        "like_count",
        "comment_count",
        "duration",
    ];

    /// Copy with `title` and `description` passed through [`sanitize_text`].
    pub fn sanitized(&self) -> Self {
        Self {
            title: sanitize_text(&self.title),
            description: sanitize_text(&self.description),
            ..self.clone()
        }
    }
}

impl TableRow for MetadataRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn header(&self) -> Vec<String> {
        Self::HEADER.iter().map(|name| name.to_string()).collect()
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.view_count.to_string(),
            self.like_count.to_string(),
            self.comment_count.to_string(),
            format_decimal(self.duration),
        ]
    }
}

/// One segmented video: the shot table row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShotSummaryRow {
    /// Platform video id.
    pub id: String,
    /// Duration from the metadata table, in seconds.
    pub duration: f64,
    /// Decoded frame count.
    pub total_frames: u64,
    /// Frame rate used for the boundary timestamps.
    pub frames_per_second: f64,
    /// Number of shots (≥ 1).
    pub num_shots: usize,
    /// Space-separated shot lengths; empty below two boundaries.
    #[serde(default)]
    pub shot_durations: String,
    /// Sample variance of the shot lengths.
    pub shot_duration_variance: f64,
    /// Mean shot length.
    pub average_shot_duration: f64,
}

impl ShotSummaryRow {
    /// Column names of the shot table.
    pub const HEADER: [&'static str; 8] = [
        "id",
        "duration",
        "total_frames",
        "frames_per_second",
        "num_shots",
        "shot_durations",
        "shot_duration_variance",
        "average_shot_duration",
    ];

    /// Build a row from a summary and the decoder's frame statistics.
    pub fn new(
        id: impl Into<String>,
        duration: f64,
        total_frames: u64,
        frames_per_second: f64,
        summary: &ShotSummary,
    ) -> Self {
        Self {
            id: id.into(),
            duration,
            total_frames,
            frames_per_second,
            num_shots: summary.num_shots,
            shot_durations: summary.durations_field(),
            shot_duration_variance: summary.shot_duration_variance,
            average_shot_duration: summary.average_shot_duration,
        }
    }

    /// Build a row straight from a detection pass.
    pub fn from_detection(record: &MetadataRecord, detection: &ShotDetection) -> Self {
        Self::new(
            record.id.clone(),
            record.duration,
            detection.total_frames,
            detection.frames_per_second,
            &detection.summary(),
        )
    }

    /// Parsed shot lengths.
    pub fn durations(&self) -> Result<Vec<f64>, CutrateError> {
        parse_durations(&self.shot_durations).map_err(|_| CutrateError::InvalidField {
            id: self.id.clone(),
            field: "shot_durations".to_string(),
            value: self.shot_durations.clone(),
        })
    }
}

impl TableRow for ShotSummaryRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn header(&self) -> Vec<String> {
        Self::HEADER.iter().map(|name| name.to_string()).collect()
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            format_decimal(self.duration),
            self.total_frames.to_string(),
            format_decimal(self.frames_per_second),
            self.num_shots.to_string(),
            self.shot_durations.clone(),
            format_decimal(self.shot_duration_variance),
            format_decimal(self.average_shot_duration),
        ]
    }
}

/// One row of the feature table handed to the modelling tools.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Platform video id.
    pub id: String,
    /// View count.
    pub view_count: u64,
    /// Like count.
    pub like_count: u64,
    /// Comment count.
    pub comment_count: u64,
    /// Duration in seconds.
    pub duration: f64,
    /// Decoded frame count.
    pub total_frames: u64,
    /// Space-separated shot lengths; empty below two boundaries.
    pub shot_durations: String,
    /// Number of shots.
    pub num_shots: usize,
    /// Sample variance of the shot lengths.
    pub shot_duration_variance: f64,
    /// Mean shot length.
    pub average_shot_duration: f64,
    /// Popularity bucket of `view_count`.
    pub virality: ViralityBucket,
    /// TF-IDF components of the title.
    pub title_vector: Vec<f64>,
    /// TF-IDF components of the description.
    pub description_vector: Vec<f64>,
}

impl TableRow for FeatureRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn header(&self) -> Vec<String> {
        let fixed = [
            "id",
            "view_count",
            "like_count",
            "comment_count",
            "duration",
            "total_frames",
            "shot_durations",
            "num_shots",
            "shot_duration_variance",
            "average_shot_duration",
            "virality",
        ];
        fixed
            .iter()
            .map(|name| name.to_string())
            .chain((0..self.title_vector.len()).map(|i| format!("title_{i}")))
            .chain((0..self.description_vector.len()).map(|i| format!("description_{i}")))
            .collect()
    }

    fn fields(&self) -> Vec<String> {
        let fixed = [
            self.id.clone(),
            self.view_count.to_string(),
            self.like_count.to_string(),
            self.comment_count.to_string(),
            format_decimal(self.duration),
            self.total_frames.to_string(),
            self.shot_durations.clone(),
            self.num_shots.to_string(),
            format_decimal(self.shot_duration_variance),
            format_decimal(self.average_shot_duration),
            self.virality.label().to_string(),
        ];
        fixed
            .into_iter()
            .chain(self.title_vector.iter().map(|&value| format_decimal(value)))
            .chain(
                self.description_vector
                    .iter()
                    .map(|&value| format_decimal(value)),
            )
            .collect()
    }
}
