//! Metadata import from yt-dlp info JSON.
//!
//! Accepts either a JSON-lines file (one info object per line, as written by
//! `yt-dlp --dump-json`) or a directory of `*.info.json` files (as written by
//! `--write-info-json`). Each record is appended to the metadata table unless
//! its id is already there.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{error::CutrateError, records::MetadataRecord, table::MetadataStore};

/// The subset of a yt-dlp info object the study keeps.
#[derive(Debug, Clone, Deserialize)]
struct InfoJson {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    comment_count: Option<u64>,
    #[serde(default)]
    duration: Option<f64>,
}

impl From<InfoJson> for MetadataRecord {
    fn from(info: InfoJson) -> Self {
        MetadataRecord {
            id: info.id,
            title: info.title.unwrap_or_default(),
            description: info.description.unwrap_or_default(),
            view_count: info.view_count.unwrap_or(0),
            like_count: info.like_count.unwrap_or(0),
            comment_count: info.comment_count.unwrap_or(0),
            duration: info.duration.unwrap_or(0.0),
        }
    }
}

/// Parse one yt-dlp info object.
///
/// ```
/// let record = cutrate::import::parse_info_json(
///     r#"{"id": "abc", "title": "Hi", "view_count": 12, "duration": 31.0}"#,
/// )?;
/// assert_eq!(record.id, "abc");
/// assert_eq!(record.like_count, 0);
/// # Ok::<(), cutrate::CutrateError>(())
/// ```
pub fn parse_info_json(json: &str) -> Result<MetadataRecord, CutrateError> {
    let info: InfoJson = serde_json::from_str(json)?;
    Ok(info.into())
}

/// Counts from one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records appended.
    pub appended: usize,
    /// Records whose id was already present.
    pub duplicates: usize,
    /// Objects that could not be parsed.
    pub invalid: usize,
}

fn info_json_files(directory: &Path) -> Result<Vec<PathBuf>, CutrateError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        let is_info = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".info.json"));
        if is_info && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Import the info JSON at `source` into `store`.
///
/// Unparsable objects are logged and counted; they do not stop the import.
pub fn import_metadata(source: impl AsRef<Path>, store: &mut MetadataStore) -> Result<ImportReport, CutrateError> {
    let source = source.as_ref();

    let documents: Vec<(String, String)> = if source.is_dir() {
        info_json_files(source)?
            .into_iter()
            .map(|path| Ok((path.display().to_string(), fs::read_to_string(&path)?)))
            .collect::<Result<_, CutrateError>>()?
    } else {
        fs::read_to_string(source)?
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| (format!("{}:{}", source.display(), index + 1), line.to_string()))
            .collect()
    };

    let mut report = ImportReport::default();
    for (origin, document) in documents {
        match parse_info_json(&document) {
            Ok(record) => {
                if store.append(&record)? {
                    report.appended += 1;
                } else {
                    report.duplicates += 1;
                }
            }
            Err(error) => {
                log::warn!("{origin}: skipping invalid info JSON: {error}");
                report.invalid += 1;
            }
        }
    }

    log::info!(
        "Imported {} record(s) from {} ({} duplicate, {} invalid)",
        report.appended,
        source.display(),
        report.duplicates,
        report.invalid
    );
    Ok(report)
}
