//! Cut detector tests on synthetic content values and frames.

use cutrate::detector::{downscale_factor, AdaptiveDetector, ContentDetector, CutDetector, HsvFrame};
use cutrate::content_value;
use image::{Rgb, RgbImage};

fn run<D: CutDetector>(detector: &mut D, scores: &[f64]) -> Vec<u64> {
    let mut cuts = Vec::new();
    for (frame_number, &score) in scores.iter().enumerate() {
        cuts.extend(detector.push(frame_number as u64, score));
    }
    cuts.extend(detector.finish());
    cuts
}

fn solid(width: u32, height: u32, color: [u8; 3]) -> HsvFrame {
    HsvFrame::from_rgb(&RgbImage::from_pixel(width, height, Rgb(color)))
}

// ── Content value ──────────────────────────────────────────────────

#[test]
fn identical_frames_score_zero() {
    let frame = solid(8, 8, [12, 200, 90]);
    assert_eq!(content_value(&frame, &frame), 0.0);
}

#[test]
fn black_to_white_changes_value_only() {
    let black = solid(4, 4, [0, 0, 0]);
    let white = solid(4, 4, [255, 255, 255]);
    assert!((content_value(&black, &white) - 85.0).abs() < 1e-9);
}

#[test]
fn red_to_blue_changes_hue_only() {
    let red = solid(4, 4, [255, 0, 0]);
    let blue = solid(4, 4, [0, 0, 255]);
    assert!((content_value(&red, &blue) - 40.0).abs() < 1e-9);
}

#[test]
fn size_change_scores_maximum() {
    let small = solid(4, 4, [0, 0, 0]);
    let large = solid(8, 8, [0, 0, 0]);
    assert_eq!(content_value(&small, &large), 255.0);
}

#[test]
fn downscale_factor_keeps_small_frames() {
    assert_eq!(downscale_factor(200), 1);
    assert_eq!(downscale_factor(256), 1);
    assert_eq!(downscale_factor(1280), 5);
    assert_eq!(downscale_factor(1920), 7);
}

// ── ContentDetector ────────────────────────────────────────────────

#[test]
fn content_detector_respects_threshold_and_min_length() {
    let mut scores = vec![0.0; 40];
    scores[10] = 50.0; // too early
    scores[20] = 50.0;
    scores[30] = 50.0; // too close to 20
    scores[36] = 26.9; // under threshold
    scores[39] = 27.0;

    let cuts = run(&mut ContentDetector::default(), &scores);
    assert_eq!(cuts, vec![20, 39]);
}

#[test]
fn content_detector_counts_from_first_frame() {
    let mut detector = ContentDetector::new(10.0, 5);
    assert_eq!(detector.push(100, 0.0), None);
    assert_eq!(detector.push(103, 50.0), None);
    assert_eq!(detector.push(105, 50.0), Some(105));
}

// ── AdaptiveDetector ───────────────────────────────────────────────

#[test]
fn adaptive_detector_reports_spike_frame() {
    let mut scores = vec![1.0; 40];
    scores[20] = 90.0;
    assert_eq!(run(&mut AdaptiveDetector::default(), &scores), vec![20]);
}

#[test]
fn adaptive_detector_ignores_sustained_motion() {
    let scores = vec![40.0; 60];
    assert!(run(&mut AdaptiveDetector::default(), &scores).is_empty());
}

#[test]
fn adaptive_detector_with_still_neighbours() {
    let mut scores = vec![0.0; 40];
    scores[20] = 20.0;
    assert_eq!(run(&mut AdaptiveDetector::default(), &scores), vec![20]);

    let mut faint = vec![0.0; 40];
    faint[20] = 10.0;
    assert!(run(&mut AdaptiveDetector::default(), &faint).is_empty());
}

#[test]
fn adaptive_detector_enforces_min_scene_len() {
    let mut scores = vec![1.0; 60];
    scores[5] = 90.0;
    scores[25] = 90.0;
    scores[30] = 90.0;
    assert_eq!(run(&mut AdaptiveDetector::default(), &scores), vec![25]);
}

#[test]
fn adaptive_detector_clamps_window_width() {
    let detector = AdaptiveDetector::new(3.0, 15, 0, 15.0);
    assert_eq!(detector.window_width, 1);
}
