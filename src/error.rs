//! Error types for the `cutrate` crate.
//!
//! This module defines [`CutrateError`], the unified error type returned by
//! all fallible operations in the crate. Per-item failures inside a batch are
//! captured in a [`BatchReport`](crate::BatchReport) instead of being
//! returned; only failures that make the whole stage meaningless surface here.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `cutrate` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CutrateError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// FFmpeg filter graph setup or processing failed.
    #[error("Filter graph error: {0}")]
    FilterGraphError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// A CSV table could not be read or written.
    #[error("CSV error in {path}: {reason}")]
    Csv {
        /// The table being read or written.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// A CSV table has no `id` column.
    #[error("Table {0} has no `id` column")]
    MissingIdColumn(PathBuf),

    /// A row's header does not match the header already present in the
    /// output table.
    #[error("Header mismatch in {path}: table has {existing} columns, row has {incoming}")]
    SchemaMismatch {
        /// The output table.
        path: PathBuf,
        /// Number of columns already in the table.
        existing: usize,
        /// Number of columns of the rejected row.
        incoming: usize,
    },

    /// A field could not be parsed into the expected type.
    #[error("Invalid value for `{field}` in record {id}: {value:?}")]
    InvalidField {
        /// Id of the offending record.
        id: String,
        /// Column name.
        field: String,
        /// Raw value found in the table.
        value: String,
    },

    /// A JSON document could not be parsed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An invalid configuration value was supplied.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for CutrateError {
    fn from(error: FfmpegError) -> Self {
        CutrateError::FfmpegError(error.to_string())
    }
}

impl CutrateError {
    /// Wrap a `csv` crate error with the path of the table involved.
    pub(crate) fn csv(path: impl Into<PathBuf>, error: csv::Error) -> Self {
        CutrateError::Csv {
            path: path.into(),
            reason: error.to_string(),
        }
    }
}
