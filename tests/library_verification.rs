//! Video library verification tests.

use std::fs;
use std::path::Path;

use cutrate::VideoLibrary;
use cutrate::library::{file_id, video_path};

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").expect("write file");
}

#[test]
fn file_ids_stop_at_first_dot() {
    assert_eq!(file_id(Path::new("dir/abc.mp4")).as_deref(), Some("abc"));
    assert_eq!(file_id(Path::new("abc.f137.mp4")).as_deref(), Some("abc"));
    assert_eq!(file_id(Path::new("abc.mkv")), None);
    assert_eq!(file_id(Path::new(".mp4")), None);
}

#[test]
fn video_path_uses_id_and_extension() {
    assert_eq!(
        video_path(Path::new("data/raw_videos"), "xyz"),
        Path::new("data/raw_videos/xyz.mp4")
    );
}

#[test]
fn reports_missing_extra_and_duplicates() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for name in ["a.mp4", "b.mp4", "b.f137.mp4", "x.mp4", "notes.txt"] {
        touch(dir.path(), name);
    }
    fs::create_dir(dir.path().join("nested.mp4")).expect("create dir");

    let library = VideoLibrary::scan(dir.path()).expect("scan");
    assert_eq!(library.ids().collect::<Vec<_>>(), ["a", "b", "x"]);

    let report = library.verify(["a", "b", "c"]);
    assert_eq!(report.missing, ["c"]);
    assert_eq!(report.extra, ["x"]);
    assert_eq!(report.duplicates, ["b"]);
    assert!(!report.is_consistent());

    let rendered = report.to_string();
    assert!(rendered.contains("1 missing, 1 extra, 1 duplicated"));
    assert!(rendered.contains("missing:   c"));
}

#[test]
fn consistent_library_reports_nothing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    touch(dir.path(), "a.mp4");

    let report = VideoLibrary::scan(dir.path()).expect("scan").verify(["a"]);
    assert!(report.is_consistent());
    assert_eq!(report.to_string(), "Video library is consistent with metadata");
}

#[test]
fn duplicate_removal_keeps_canonical_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for name in ["b.f137.mp4", "b.mp4", "b.f22.mp4", "c.f1.mp4", "c.f2.mp4", "d.mp4"] {
        touch(dir.path(), name);
    }

    let mut library = VideoLibrary::scan(dir.path()).expect("scan");
    assert_eq!(library.files("b")[0], dir.path().join("b.mp4"));

    let removed = library.remove_duplicates().expect("remove");
    assert_eq!(removed.len(), 3);

    assert!(dir.path().join("b.mp4").exists());
    assert!(!dir.path().join("b.f137.mp4").exists());
    assert!(!dir.path().join("b.f22.mp4").exists());
    assert!(dir.path().join("c.f1.mp4").exists());
    assert!(!dir.path().join("c.f2.mp4").exists());
    assert!(dir.path().join("d.mp4").exists());

    let rescanned = VideoLibrary::scan(dir.path()).expect("rescan");
    assert!(rescanned.verify(["b", "c", "d"]).is_consistent());
}

#[test]
fn failed_delete_keeps_remaining_files_in_snapshot() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for name in ["b.mp4", "b.f1.mp4", "b.f2.mp4"] {
        touch(dir.path(), name);
    }

    let mut library = VideoLibrary::scan(dir.path()).expect("scan");
    fs::remove_file(dir.path().join("b.f2.mp4")).expect("remove behind the scan");

    assert!(library.remove_duplicates().is_err());
    assert!(!dir.path().join("b.f1.mp4").exists());
    assert_eq!(
        library.files("b"),
        [dir.path().join("b.mp4"), dir.path().join("b.f2.mp4")]
    );
    assert_eq!(library.verify(["b"]).duplicates, ["b"]);
}

#[test]
fn scanning_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    assert!(VideoLibrary::scan(dir.path().join("absent")).is_err());
}
