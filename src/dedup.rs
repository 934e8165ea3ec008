//! Id deduplication of CSV tables.
//!
//! Keeps the first row of each `id`, every column and the header. Without an
//! explicit target, or when the target is the input itself, the input is
//! replaced atomically via a sibling temporary file and a rename.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CutrateError;

/// Counts from one deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Rows written.
    pub kept: usize,
    /// Repeated rows dropped.
    pub dropped: usize,
}

fn sibling_temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("table.csv"));
    name.push(".dedup.tmp");
    path.with_file_name(name)
}

/// Whether `a` and `b` name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Deduplicate `input` by its `id` column.
///
/// Writes to `output` when given, otherwise replaces `input`. An `output`
/// resolving to `input` is treated as an in-place rewrite.
///
/// ```no_run
/// let report = cutrate::dedup_csv("data/video_metadata.csv", None)?;
/// println!("kept {}, dropped {}", report.kept, report.dropped);
/// # Ok::<(), cutrate::CutrateError>(())
/// ```
pub fn dedup_csv(input: impl AsRef<Path>, output: Option<&Path>) -> Result<DedupReport, CutrateError> {
    let input = input.as_ref();
    let mut reader = csv::Reader::from_path(input).map_err(|e| CutrateError::csv(input, e))?;
    let header = reader
        .byte_headers()
        .map_err(|e| CutrateError::csv(input, e))?
        .clone();
    let id_index = header
        .iter()
        .position(|name| name == b"id")
        .ok_or_else(|| CutrateError::MissingIdColumn(input.to_path_buf()))?;

    let in_place = output.is_none_or(|path| same_file(input, path));
    let target = match output {
        Some(path) if !in_place => path.to_path_buf(),
        _ => sibling_temp_path(input),
    };

    let mut writer = csv::Writer::from_path(&target).map_err(|e| CutrateError::csv(&target, e))?;
    writer
        .write_byte_record(&header)
        .map_err(|e| CutrateError::csv(&target, e))?;

    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    let mut report = DedupReport::default();
    for record in reader.byte_records() {
        let record = record.map_err(|e| CutrateError::csv(input, e))?;
        let id = record.get(id_index).unwrap_or_default().to_vec();
        if seen.insert(id) {
            writer
                .write_byte_record(&record)
                .map_err(|e| CutrateError::csv(&target, e))?;
            report.kept += 1;
        } else {
            report.dropped += 1;
        }
    }
    writer.flush()?;
    drop(writer);

    if in_place {
        fs::rename(&target, input)?;
    }

    log::info!(
        "Deduplicated {}: kept {}, dropped {}",
        input.display(),
        report.kept,
        report.dropped
    );
    Ok(report)
}
