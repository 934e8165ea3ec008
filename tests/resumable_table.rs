//! Append-only output table and metadata table tests.

use std::fs;

use cutrate::{CutrateError, MetadataRecord, MetadataStore, MetadataTable, OutputTable, ShotSummary, ShotSummaryRow};

fn record(id: &str, duration: f64) -> MetadataRecord {
    MetadataRecord {
        id: id.to_string(),
        title: format!("title of {id}"),
        description: String::new(),
        view_count: 1_500,
        like_count: 10,
        comment_count: 2,
        duration,
    }
}

fn line_count(path: &std::path::Path) -> usize {
    fs::read_to_string(path).expect("read table").lines().count()
}

// ── OutputTable ────────────────────────────────────────────────────

#[test]
fn missing_output_gets_header_once() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");

    let mut table = OutputTable::open(&path).expect("open");
    assert!(table.is_empty());
    assert!(table.header().is_none());
    assert!(!path.exists(), "file is created lazily");

    assert!(table.append(&record("a", 10.0)).expect("append a"));
    assert!(table.append(&record("b", 20.0)).expect("append b"));

    let content = fs::read_to_string(&path).expect("read");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], MetadataRecord::HEADER.join(","));
    assert!(lines[1].starts_with("a,title of a,,1500,10,2,10.0"));
}

#[test]
fn present_ids_are_not_appended_again() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");

    let mut table = OutputTable::open(&path).expect("open");
    table.append(&record("a", 10.0)).expect("append");
    assert!(!table.append(&record("a", 99.0)).expect("append duplicate"));
    drop(table);

    let mut reopened = OutputTable::open(&path).expect("reopen");
    assert!(reopened.contains("a"));
    assert_eq!(reopened.len(), 1);
    assert!(!reopened.append(&record("a", 10.0)).expect("append after reopen"));
    assert!(reopened.append(&record("b", 10.0)).expect("append new"));
    assert_eq!(line_count(&path), 3);
}

#[test]
fn empty_file_is_treated_as_new() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");
    fs::write(&path, "").expect("create empty file");

    let mut table = OutputTable::open(&path).expect("open");
    assert!(table.header().is_none());
    table.append(&record("a", 1.0)).expect("append");
    assert_eq!(line_count(&path), 2);
}

#[test]
fn different_header_is_a_schema_mismatch() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");

    let mut table = OutputTable::open(&path).expect("open");
    table.append(&record("a", 1.0)).expect("append");

    let shots = ShotSummaryRow::new("b", 1.0, 30, 30.0, &ShotSummary::from_boundaries(&[]));
    match table.append(&shots) {
        Err(CutrateError::SchemaMismatch { existing, incoming, .. }) => {
            assert_eq!(existing, 7);
            assert_eq!(incoming, 8);
        }
        other => panic!("Expected SchemaMismatch, got: {other:?}"),
    }
    assert_eq!(line_count(&path), 2);
}

#[test]
fn table_without_id_column_is_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");
    fs::write(&path, "name,value\nx,1\n").expect("write");

    match OutputTable::open(&path) {
        Err(CutrateError::MissingIdColumn(reported)) => assert_eq!(reported, path),
        other => panic!("Expected MissingIdColumn, got: {other:?}"),
    }
}

#[test]
fn read_ids_keeps_file_order_and_duplicates() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("ids.csv");
    fs::write(&path, "title,id\nx,b\ny,a\nz,b\n").expect("write");

    let (header, ids) = cutrate::table::read_ids(&path)
        .expect("read")
        .expect("non-empty table");
    assert_eq!(header, ["title", "id"]);
    assert_eq!(ids, ["b", "a", "b"]);

    assert!(cutrate::table::read_ids(dir.path().join("missing.csv")).expect("read").is_none());
}

#[test]
fn interrupted_last_row_is_dropped_on_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");

    let mut table = OutputTable::open(&path).expect("open");
    table.append(&record("a", 10.0)).expect("append a");
    drop(table);
    let mut torn = fs::OpenOptions::new().append(true).open(&path).expect("reopen file");
    std::io::Write::write_all(&mut torn, b"b,title of b,,15").expect("write partial row");
    drop(torn);

    let mut table = OutputTable::open(&path).expect("open after interrupt");
    assert!(table.contains("a"));
    assert!(!table.contains("b"));
    assert!(table.append(&record("b", 20.0)).expect("append b"));
    drop(table);

    let metadata = MetadataTable::read(&path).expect("read");
    assert!(metadata.rejected.is_empty());
    let ids: Vec<&str> = metadata.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(metadata.records[1].duration, 20.0);
}

#[test]
fn torn_two_column_table_reopens() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");
    fs::write(&path, "id,x\na,1\nb").expect("write");

    let table = OutputTable::open(&path).expect("open");
    assert_eq!(table.len(), 1);
    assert!(table.contains("a"));
    assert_eq!(fs::read_to_string(&path).expect("read"), "id,x\na,1\n");
}

#[test]
fn complete_row_without_newline_is_kept() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");
    fs::write(&path, "id,x\na,1\nb,2").expect("write");

    let table = OutputTable::open(&path).expect("open");
    assert!(table.contains("a"));
    assert!(table.contains("b"));
    assert_eq!(fs::read_to_string(&path).expect("read"), "id,x\na,1\nb,2\n");
}

#[test]
fn short_rows_contribute_no_id() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("out.csv");
    fs::write(&path, "id,x\na,1\nb\nc,3\n").expect("write");

    let table = OutputTable::open(&path).expect("open");
    assert!(table.contains("a"));
    assert!(!table.contains("b"));
    assert!(table.contains("c"));
}

// ── MetadataTable ──────────────────────────────────────────────────

#[test]
fn metadata_accepts_camel_case_counts_and_blanks() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("meta.csv");
    fs::write(
        &path,
        "id,title,description,viewCount,likeCount,commentCount,duration\n\
         a,Hello,,1200,,7,59.0\n\
         b,World,desc,3.0,4,5,61\n",
    )
    .expect("write");

    let table = MetadataTable::read(&path).expect("read");
    assert_eq!(table.len(), 2);
    assert!(table.rejected.is_empty());

    let a = &table.records[0];
    assert_eq!(a.view_count, 1_200);
    assert_eq!(a.like_count, 0);
    assert_eq!(a.comment_count, 7);
    assert_eq!(a.duration, 59.0);

    let b = &table.records[1];
    assert_eq!(b.view_count, 3);
    assert_eq!(b.description, "desc");
}

#[test]
fn metadata_ignores_unknown_columns() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("meta.csv");
    fs::write(&path, "id,channel,view_count,duration\na,somebody,10,5\n").expect("write");

    let table = MetadataTable::read(&path).expect("read");
    assert_eq!(table.records[0].view_count, 10);
    assert_eq!(table.records[0].title, "");
}

#[test]
fn unreadable_metadata_rows_are_set_aside() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("meta.csv");
    fs::write(
        &path,
        "id,view_count,duration\na,10,5\nb,lots,5\nc,10,long\nd,1,2\n",
    )
    .expect("write");

    let table = MetadataTable::read(&path).expect("read");
    let ids: Vec<&str> = table.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "d"]);
    assert_eq!(table.rejected.len(), 2);
}

#[test]
fn metadata_table_requires_id_column() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("meta.csv");
    fs::write(&path, "video,duration\na,5\n").expect("write");
    assert!(matches!(
        MetadataTable::read(&path),
        Err(CutrateError::MissingIdColumn(_))
    ));
}

#[test]
fn missing_metadata_table_error_names_the_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("absent.csv");

    match MetadataTable::read(&path) {
        Err(CutrateError::Csv { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected Csv error, got: {other:?}"),
    }
}

// ── MetadataStore ──────────────────────────────────────────────────

#[test]
fn store_sanitizes_text_and_skips_known_ids() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("meta.csv");

    let mut store = MetadataStore::open(&path).expect("open");
    let mut first = record("a", 30.0);
    first.title = "Hello, world\nagain".to_string();
    assert!(store.append(&first).expect("append"));
    assert!(!store.append(&record("a", 31.0)).expect("append duplicate"));
    assert_eq!(store.len(), 1);

    let table = MetadataTable::read(&path).expect("read");
    assert_eq!(table.len(), 1);
    assert_eq!(table.records[0].title, "Hello\\, world\\nagain");
    assert_eq!(table.records[0].duration, 30.0);
}

#[test]
fn sanitize_text_escapes_separators() {
    assert_eq!(cutrate::records::sanitize_text("a\r\nb,c"), "a\\r\\nb\\,c");
    assert_eq!(cutrate::records::sanitize_text("plain"), "plain");
}
