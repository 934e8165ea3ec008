//! yt-dlp metadata import tests.

use std::fs;

use cutrate::import::parse_info_json;
use cutrate::{MetadataStore, MetadataTable, import_metadata};

#[test]
fn parses_info_json_fields() {
    let record = parse_info_json(
        r#"{"id": "abc", "title": "Line\nbreak", "description": null,
            "view_count": 15000, "like_count": 300, "comment_count": 12,
            "duration": 42.5, "uploader": "someone", "formats": []}"#,
    )
    .expect("parse");

    assert_eq!(record.id, "abc");
    assert_eq!(record.title, "Line\nbreak");
    assert_eq!(record.description, "");
    assert_eq!(record.view_count, 15_000);
    assert_eq!(record.comment_count, 12);
    assert_eq!(record.duration, 42.5);
}

#[test]
fn missing_counts_default_to_zero() {
    let record = parse_info_json(r#"{"id": "abc"}"#).expect("parse");
    assert_eq!(record.like_count, 0);
    assert_eq!(record.duration, 0.0);
}

#[test]
fn object_without_id_is_an_error() {
    assert!(parse_info_json(r#"{"title": "no id"}"#).is_err());
    assert!(parse_info_json("not json").is_err());
}

#[test]
fn imports_json_lines_once() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("info.jsonl");
    let table = dir.path().join("video_metadata.csv");
    fs::write(
        &source,
        concat!(
            r#"{"id": "a", "title": "First, video", "view_count": 10, "duration": 30}"#,
            "\n\n",
            r#"{"id": "b", "title": "Second", "view_count": 20, "duration": 40}"#,
            "\n",
            "{broken\n",
            r#"{"id": "a", "title": "First again", "view_count": 11, "duration": 30}"#,
            "\n",
        ),
    )
    .expect("write source");

    let mut store = MetadataStore::open(&table).expect("open store");
    let report = import_metadata(&source, &mut store).expect("import");
    assert_eq!(report.appended, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.invalid, 1);

    let metadata = MetadataTable::read(&table).expect("read");
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata.records[0].title, "First\\, video");
    assert_eq!(metadata.records[1].view_count, 20);

    let mut reopened = MetadataStore::open(&table).expect("reopen");
    let again = import_metadata(&source, &mut reopened).expect("import again");
    assert_eq!(again.appended, 0);
    assert_eq!(again.duplicates, 3);
}

#[test]
fn imports_info_json_directory() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let downloads = dir.path().join("downloads");
    fs::create_dir(&downloads).expect("create dir");
    fs::write(downloads.join("b.info.json"), r#"{"id": "b", "duration": 5}"#).expect("write b");
    fs::write(downloads.join("a.info.json"), r#"{"id": "a", "duration": 6}"#).expect("write a");
    fs::write(downloads.join("a.mp4"), b"").expect("write video");
    fs::write(downloads.join("notes.json"), r#"{"id": "z"}"#).expect("write other");

    let table = dir.path().join("video_metadata.csv");
    let mut store = MetadataStore::open(&table).expect("open store");
    let report = import_metadata(&downloads, &mut store).expect("import");
    assert_eq!(report.appended, 2);

    let ids: Vec<String> = MetadataTable::read(&table)
        .expect("read")
        .records
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, ["a", "b"]);
}
