//! The downloaded video library.
//!
//! Videos live in one flat directory as `<id>.mp4`. Downloaders sometimes
//! leave several files for the same id (`<id>.mp4`, `<id>.f137.mp4`, ...);
//! a file's id is therefore its name up to the first `.`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CutrateError;

/// Where the segmenter expects the video of `id`.
pub fn video_path(videos_dir: &Path, id: &str) -> PathBuf {
    videos_dir.join(format!("{id}.mp4"))
}

/// Id of a library file, or `None` if it is not an `.mp4`.
///
/// ```
/// use std::path::Path;
///
/// assert_eq!(cutrate::library::file_id(Path::new("abc.f137.mp4")), Some("abc".to_string()));
/// assert_eq!(cutrate::library::file_id(Path::new("abc.webm")), None);
/// ```
pub fn file_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if !name.ends_with(".mp4") {
        return None;
    }
    name.split('.')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Result of checking the library against the metadata table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Ids in the metadata with no video file.
    pub missing: Vec<String>,
    /// Video files whose id is not in the metadata.
    pub extra: Vec<String>,
    /// Ids with more than one video file.
    pub duplicates: Vec<String>,
}

impl VerificationReport {
    /// Returns `true` if every id has exactly one file and vice versa.
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.duplicates.is_empty()
    }
}

impl Display for VerificationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_consistent() {
            return write!(f, "Video library is consistent with metadata");
        }
        writeln!(
            f,
            "{} missing, {} extra, {} duplicated",
            self.missing.len(),
            self.extra.len(),
            self.duplicates.len()
        )?;
        for id in &self.missing {
            writeln!(f, "  missing:   {id}")?;
        }
        for id in &self.extra {
            writeln!(f, "  extra:     {id}")?;
        }
        for id in &self.duplicates {
            writeln!(f, "  duplicate: {id}")?;
        }
        Ok(())
    }
}

/// Snapshot of the video directory.
#[derive(Debug, Clone)]
pub struct VideoLibrary {
    directory: PathBuf,
    files: BTreeMap<String, Vec<PathBuf>>,
}

impl VideoLibrary {
    /// Scan `directory` for `.mp4` files. Subdirectories are not visited.
    pub fn scan(directory: impl AsRef<Path>) -> Result<Self, CutrateError> {
        let directory = directory.as_ref().to_path_buf();
        let mut files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for entry in fs::read_dir(&directory)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(id) = file_id(&path) {
                files.entry(id).or_default().push(path);
            }
        }
        for (id, paths) in &mut files {
            let canonical = format!("{id}.mp4");
            paths.sort_by_key(|path| (!path.ends_with(&canonical), path.clone()));
        }

        log::debug!(
            "Scanned {}: {} video id(s)",
            directory.display(),
            files.len()
        );
        Ok(Self { directory, files })
    }

    /// The scanned directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Ids with at least one file, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Files of `id`, the canonical `<id>.mp4` first, then by path.
    pub fn files(&self, id: &str) -> &[PathBuf] {
        self.files.get(id).map_or(&[], Vec::as_slice)
    }

    /// Compare the library with the ids of the metadata table.
    pub fn verify<'a, I>(&self, metadata_ids: I) -> VerificationReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let expected: BTreeSet<&str> = metadata_ids.into_iter().collect();

        VerificationReport {
            missing: expected
                .iter()
                .filter(|id| !self.files.contains_key(**id))
                .map(|id| id.to_string())
                .collect(),
            extra: self
                .ids()
                .filter(|id| !expected.contains(id))
                .map(str::to_string)
                .collect(),
            duplicates: self
                .files
                .iter()
                .filter(|(_, paths)| paths.len() > 1)
                .map(|(id, _)| id.clone())
                .collect(),
        }
    }

    /// Delete all but one file of each duplicated id.
    ///
    /// `<id>.mp4` is kept when present, otherwise the first file by path.
    /// Returns the deleted paths. A failed delete stops the pass; files not
    /// yet deleted stay in the snapshot.
    pub fn remove_duplicates(&mut self) -> Result<Vec<PathBuf>, CutrateError> {
        let mut removed = Vec::new();
        for (id, paths) in &mut self.files {
            while paths.len() > 1 {
                let path = &paths[1];
                log::info!("{id}: removing duplicate file {}", path.display());
                fs::remove_file(path)?;
                removed.push(paths.remove(1));
            }
        }
        Ok(removed)
    }
}
