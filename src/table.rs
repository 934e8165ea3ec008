//! Append-only, id-keyed CSV tables.
//!
//! [`OutputTable`] is the resumability mechanism of every batch stage: the
//! presence of a row's `id` in the output file is the only completion
//! marker. Opening a table scans its `id` column once; appends write the
//! header exactly once and flush after every row, so an interrupted run
//! loses at most the row it was writing.
//!
//! [`MetadataTable`] loads an input table, and [`MetadataStore`] applies the
//! same append-once discipline to the metadata table itself.
//!
//! # Example
//!
//! ```no_run
//! use cutrate::{MetadataRecord, MetadataStore};
//!
//! let mut store = MetadataStore::open("data/video_metadata.csv")?;
//! let record = MetadataRecord {
//!     id: "abc123".to_string(),
//!     title: "Stop motion, frame by frame".to_string(),
//!     description: String::new(),
//!     view_count: 1520,
//!     like_count: 40,
//!     comment_count: 3,
//!     duration: 59.0,
//! };
//! if !store.append(&record)? {
//!     println!("already recorded");
//! }
//! # Ok::<(), cutrate::CutrateError>(())
//! ```

use std::{
    collections::HashSet,
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::CutrateError;
use crate::records::{MetadataRecord, TableRow};

/// Read every value of the `id` column of an existing table.
///
/// Returns the ids in file order (duplicates included) together with the
/// header, or `None` when the file is missing or empty. Rows whose field
/// count differs from the header's are incomplete and contribute no id.
pub fn read_ids<P: AsRef<Path>>(path: P) -> Result<Option<(Vec<String>, Vec<String>)>, CutrateError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| CutrateError::csv(path, e))?;
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| CutrateError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if header.is_empty() {
        return Ok(None);
    }

    let id_index = header
        .iter()
        .position(|name| name == "id")
        .ok_or_else(|| CutrateError::MissingIdColumn(path.to_path_buf()))?;

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CutrateError::csv(path, e))?;
        if record.len() != header.len() {
            let line = record.position().map_or(0, |position| position.line());
            log::warn!(
                "{}:{line}: ignoring incomplete row ({} of {} fields)",
                path.display(),
                record.len(),
                header.len()
            );
            continue;
        }
        if let Some(id) = record.get(id_index) {
            ids.push(id.to_string());
        }
    }

    Ok(Some((header, ids)))
}

/// Number of fields in the first record of `bytes`.
fn first_record_len(bytes: &[u8]) -> usize {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes)
        .byte_records()
        .next()
        .and_then(Result::ok)
        .map_or(0, |record| record.len())
}

/// Make the file end on a row boundary before anything is appended.
///
/// Rows are flushed whole, so a missing final newline means the last write
/// was interrupted. A tail with as many fields as the header only lost its
/// terminator and gets one back; anything shorter is cut off.
fn repair_torn_tail(path: &Path) -> Result<(), CutrateError> {
    if !path.exists() {
        return Ok(());
    }
    let contents = fs::read(path)?;
    if contents.is_empty() || contents.ends_with(b"\n") {
        return Ok(());
    }

    let tail_start = contents
        .iter()
        .rposition(|&byte| byte == b'\n')
        .map_or(0, |index| index + 1);
    let header_len = first_record_len(&contents[..tail_start]);

    if tail_start > 0 && first_record_len(&contents[tail_start..]) == header_len {
        OpenOptions::new().append(true).open(path)?.write_all(b"\n")?;
    } else {
        log::warn!(
            "{}: dropping incomplete last row ({} byte(s))",
            path.display(),
            contents.len() - tail_start
        );
        OpenOptions::new()
            .write(true)
            .open(path)?
            .set_len(tail_start as u64)?;
    }
    Ok(())
}

/// An append-only output table keyed by `id`.
pub struct OutputTable {
    path: PathBuf,
    ids: HashSet<String>,
    header: Option<Vec<String>>,
    writer: Option<csv::Writer<File>>,
}

impl std::fmt::Debug for OutputTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputTable")
            .field("path", &self.path)
            .field("rows", &self.ids.len())
            .field("header_written", &self.header.is_some())
            .finish()
    }
}

impl OutputTable {
    /// Open (or prepare to create) the table at `path`.
    ///
    /// The file is not created until the first [`append`](Self::append). An
    /// existing file whose last row was cut short by an interrupted run is
    /// trimmed back to its last complete row.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CutrateError> {
        let path = path.as_ref().to_path_buf();
        repair_torn_tail(&path)?;
        let (header, ids) = match read_ids(&path)? {
            Some((header, ids)) => (Some(header), ids.into_iter().collect()),
            None => (None, HashSet::new()),
        };

        log::debug!(
            "Opened output table {} ({} existing row(s))",
            path.display(),
            ids.len()
        );

        Ok(Self {
            path,
            ids,
            header,
            writer: None,
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a row with `id` is already present.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of distinct ids in the table.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The table header, once known.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Append `row` unless its id is already present.
    ///
    /// Returns `Ok(false)` for an id that is already in the table. The
    /// header is written on the first append to a new or empty file.
    ///
    /// # Errors
    ///
    /// [`CutrateError::SchemaMismatch`] if the row's header differs from the
    /// table's, or an I/O / CSV error if the write fails.
    pub fn append<R: TableRow + ?Sized>(&mut self, row: &R) -> Result<bool, CutrateError> {
        if self.contains(row.id()) {
            return Ok(false);
        }

        let row_header = row.header();
        if let Some(existing) = &self.header
            && *existing != row_header
        {
            return Err(CutrateError::SchemaMismatch {
                path: self.path.clone(),
                existing: existing.len(),
                incoming: row_header.len(),
            });
        }

        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.writer = Some(
                csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(file),
            );
        }

        let path = &self.path;
        if let Some(writer) = self.writer.as_mut() {
            if self.header.is_none() {
                writer
                    .write_record(&row_header)
                    .map_err(|e| CutrateError::csv(path, e))?;
                self.header = Some(row_header);
            }
            writer
                .write_record(row.fields())
                .map_err(|e| CutrateError::csv(path, e))?;
            writer.flush()?;
        }

        self.ids.insert(row.id().to_string());
        Ok(true)
    }
}

/// A fully loaded metadata table.
///
/// Rows that fail to parse are logged and set aside instead of failing the
/// load.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    /// Parsed rows, in file order.
    pub records: Vec<MetadataRecord>,
    /// `(line, reason)` for each row that could not be parsed.
    pub rejected: Vec<(u64, String)>,
}

impl MetadataTable {
    /// Load the table at `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, CutrateError> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| CutrateError::csv(path, e))?;

        let has_id = reader
            .headers()
            .map_err(|e| CutrateError::csv(path, e))?
            .iter()
            .any(|name| name == "id");
        if !has_id {
            return Err(CutrateError::MissingIdColumn(path.to_path_buf()));
        }

        let mut table = Self::default();
        for result in reader.deserialize::<MetadataRecord>() {
            match result {
                Ok(record) => table.records.push(record),
                Err(error) => {
                    let line = error.position().map_or(0, |position| position.line());
                    log::warn!("{}:{line}: skipping unreadable row: {error}", path.display());
                    table.rejected.push((line, error.to_string()));
                }
            }
        }

        log::info!(
            "Loaded {} metadata row(s) from {}",
            table.records.len(),
            path.display()
        );
        Ok(table)
    }

    /// Number of parsed rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no row could be parsed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The metadata table, written append-once.
#[derive(Debug)]
pub struct MetadataStore {
    table: OutputTable,
}

impl MetadataStore {
    /// Open the metadata table at `path`, creating it on first append.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CutrateError> {
        Ok(Self {
            table: OutputTable::open(path)?,
        })
    }

    /// Whether `id` has already been recorded.
    pub fn contains(&self, id: &str) -> bool {
        self.table.contains(id)
    }

    /// Number of recorded ids.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Sanitize and append `record`; `Ok(false)` if its id already exists.
    pub fn append(&mut self, record: &MetadataRecord) -> Result<bool, CutrateError> {
        let appended = self.table.append(&record.sanitized())?;
        if !appended {
            log::info!("Skipping duplicate video id: {}", record.id);
        }
        Ok(appended)
    }
}
