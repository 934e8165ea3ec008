//! Benchmarks for frame scoring, cut detection, text vectors and shot
//! detection.
//!
//! Run with: cargo bench
//!
//! The shot detection benchmarks require fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use cutrate::{
    AdaptiveDetector, ContentDetector, CutDetector, DetectorKind, FfmpegLogLevel, HsvFrame,
    ShotDetectionOptions, TfidfVectorizer, VideoFile, content_value,
};
use image::{Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn gradient(width: u32, height: u32, shift: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x + shift) % 256) as u8,
            ((y + shift) % 256) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}

fn benchmark_frame_scoring(criterion: &mut Criterion) {
    let first = gradient(256, 144, 0);
    let second = gradient(256, 144, 7);

    criterion.bench_function("hsv conversion (256x144)", |bencher| {
        bencher.iter(|| HsvFrame::from_rgb(black_box(&first)));
    });

    let previous = HsvFrame::from_rgb(&first);
    let current = HsvFrame::from_rgb(&second);
    criterion.bench_function("content value (256x144)", |bencher| {
        bencher.iter(|| content_value(black_box(&previous), black_box(&current)));
    });
}

fn benchmark_cut_detection(criterion: &mut Criterion) {
    // Five minutes at 30 fps with a hard cut every 90 frames.
    let scores: Vec<f64> = (0..9_000)
        .map(|frame| if frame % 90 == 0 { 60.0 } else { 2.0 + (frame % 7) as f64 })
        .collect();

    let mut group = criterion.benchmark_group("cut detection (9000 frames)");
    group.bench_function("content", |bencher| {
        bencher.iter(|| {
            let mut detector = ContentDetector::default();
            scores
                .iter()
                .enumerate()
                .filter_map(|(frame, &score)| detector.push(frame as u64, score))
                .count()
        });
    });
    group.bench_function("adaptive", |bencher| {
        bencher.iter(|| {
            let mut detector = AdaptiveDetector::default();
            scores
                .iter()
                .enumerate()
                .filter_map(|(frame, &score)| detector.push(frame as u64, score))
                .count()
        });
    });
    group.finish();
}

fn benchmark_tfidf(criterion: &mut Criterion) {
    let words = [
        "funny", "cat", "fails", "compilation", "try", "not", "to", "laugh", "prank", "dance",
        "challenge", "viral", "shorts", "life", "hack", "cooking", "asmr", "gaming", "clip",
    ];
    let documents: Vec<String> = (0..2_000)
        .map(|index| {
            (0..8)
                .map(|offset| words[(index * 7 + offset * 3) % words.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    criterion.bench_function("tfidf fit (2000 titles)", |bencher| {
        bencher.iter(|| TfidfVectorizer::new(50).fit(black_box(&documents)));
    });

    let model = TfidfVectorizer::new(50).fit(&documents);
    criterion.bench_function("tfidf transform (single title)", |bencher| {
        bencher.iter(|| model.transform(black_box(&documents[17])));
    });
}

fn benchmark_shot_detection(criterion: &mut Criterion) {
    cutrate::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("shot detection");
    group.sample_size(10);
    for kind in [DetectorKind::Adaptive, DetectorKind::Content, DetectorKind::Scdet] {
        group.bench_function(format!("{kind:?}"), |bencher| {
            bencher.iter(|| {
                let mut video = VideoFile::open(SAMPLE_VIDEO).unwrap();
                video
                    .detect_shots(&ShotDetectionOptions::new().detector(kind))
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_frame_scoring,
    benchmark_cut_detection,
    benchmark_tfidf,
    benchmark_shot_detection,
);
criterion::criterion_main!(benches);
