//! Shot detection on a real video.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and return early when they are absent.

use std::path::Path;

use cutrate::{
    CancellationToken, CutrateError, DetectorKind, FfmpegShotDetector, ShotDetectionOptions,
    ShotDetector, VideoFile,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn open_nonexistent_file() {
    let result = VideoFile::open("this_file_does_not_exist.mp4");
    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Failed to open video file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    assert!(VideoFile::open(&invalid_file_path).is_err());

    let mut detector = FfmpegShotDetector::default();
    assert!(detector.detect(&invalid_file_path).is_err());
}

#[test]
fn metadata_is_read_at_open() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let video = VideoFile::open(path).expect("Failed to open fixture");
    let metadata = video.metadata();
    assert!(metadata.width > 0);
    assert!(metadata.height > 0);
    assert!(metadata.frames_per_second > 0.0);
    assert!(metadata.duration.as_secs_f64() > 0.0);
    assert_eq!(video.path(), Path::new(path));
}

#[test]
fn every_detector_produces_a_summary() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    for kind in [DetectorKind::Adaptive, DetectorKind::Content, DetectorKind::Scdet] {
        let mut video = VideoFile::open(path).expect("Failed to open fixture");
        let detection = video
            .detect_shots(&ShotDetectionOptions::new().detector(kind))
            .unwrap_or_else(|error| panic!("{kind:?} failed: {error}"));

        assert!(detection.total_frames > 0);
        assert!(detection.boundaries().iter().all(|shot| shot.end > shot.start));

        let summary = detection.summary();
        assert!(summary.num_shots >= 1);
        let covered: f64 = summary.shot_durations.iter().sum();
        if summary.shot_durations.len() > 1 {
            let expected = detection.total_frames as f64 / detection.frames_per_second;
            assert!((covered - expected).abs() < 0.01, "{kind:?}: {covered} vs {expected}");
        }
    }
}

#[test]
fn cancelled_detection_returns_error() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let token = CancellationToken::new();
    token.cancel();

    let mut video = VideoFile::open(path).expect("Failed to open fixture");
    let result = video.detect_shots(&ShotDetectionOptions::new().with_cancellation(token));
    match result {
        Err(CutrateError::Cancelled) => {}
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
}
