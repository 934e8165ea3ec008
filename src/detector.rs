//! Content-change cut detectors.
//!
//! Frames are compared in HSV space. The *content value* of a frame is the
//! mean of the average absolute hue, saturation and value differences to the
//! previous frame, on the 8-bit OpenCV scale (hue 0–179, saturation and value
//! 0–255). Two detectors turn the per-frame content values into cuts:
//!
//! - [`ContentDetector`] cuts whenever the content value crosses a fixed
//!   threshold.
//! - [`AdaptiveDetector`] compares each frame against a rolling average of
//!   its neighbours, which copes better with fast camera motion.
//!
//! Both enforce a minimum shot length in frames. Everything here is pure;
//! [`scene`](crate::scene) feeds decoded frames in.
//!
//! # Example
//!
//! ```
//! use cutrate::detector::{AdaptiveDetector, CutDetector};
//!
//! let mut detector = AdaptiveDetector::default();
//! let scores = [0.0, 1.0, 1.0, 1.0, 90.0, 1.0, 1.0, 1.0];
//! let mut cuts = Vec::new();
//! for (frame_number, score) in scores.iter().enumerate() {
//!     cuts.extend(detector.push(frame_number as u64, *score));
//! }
//! cuts.extend(detector.finish());
//! assert!(cuts.is_empty()); // too close to the start for min_scene_len = 15
//! ```

use std::collections::VecDeque;

use image::RgbImage;

/// Frames narrower than this are analysed at full resolution.
pub const DOWNSCALE_MIN_WIDTH: u32 = 256;

/// Integer factor by which frames of `width` pixels are shrunk before
/// scoring.
pub fn downscale_factor(width: u32) -> u32 {
    (width / DOWNSCALE_MIN_WIDTH).max(1)
}

/// A frame split into 8-bit hue, saturation and value planes.
#[derive(Debug, Clone, PartialEq)]
pub struct HsvFrame {
    hue: Vec<u8>,
    saturation: Vec<u8>,
    value: Vec<u8>,
}

impl HsvFrame {
    /// Convert an RGB image using OpenCV's 8-bit HSV convention.
    pub fn from_rgb(image: &RgbImage) -> Self {
        let pixel_count = (image.width() * image.height()) as usize;
        let mut hue = Vec::with_capacity(pixel_count);
        let mut saturation = Vec::with_capacity(pixel_count);
        let mut value = Vec::with_capacity(pixel_count);

        for pixel in image.pixels() {
            let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
            hue.push(h);
            saturation.push(s);
            value.push(v);
        }

        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Number of pixels in the frame.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Returns `true` for a zero-sized frame.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

fn rgb_to_hsv(red: u8, green: u8, blue: u8) -> (u8, u8, u8) {
    let (r, g, b) = (red as f64, green as f64, blue as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    (
        ((hue / 2.0).round() as u32).min(179) as u8,
        saturation.round() as u8,
        max as u8,
    )
}

fn mean_pixel_distance(left: &[u8], right: &[u8]) -> f64 {
    if left.is_empty() {
        return 0.0;
    }
    let total: u64 = left
        .iter()
        .zip(right)
        .map(|(&a, &b)| a.abs_diff(b) as u64)
        .sum();
    total as f64 / left.len() as f64
}

/// Content value between two consecutive frames.
///
/// Frames of different sizes (a mid-stream resolution change) score the
/// maximum, which any sensible threshold treats as a cut.
pub fn content_value(previous: &HsvFrame, current: &HsvFrame) -> f64 {
    if previous.len() != current.len() {
        return 255.0;
    }
    let delta_hue = mean_pixel_distance(&previous.hue, &current.hue);
    let delta_saturation = mean_pixel_distance(&previous.saturation, &current.saturation);
    let delta_value = mean_pixel_distance(&previous.value, &current.value);
    (delta_hue + delta_saturation + delta_value) / 3.0
}

/// Turns per-frame content values into cut frame numbers.
///
/// Frames must be pushed in increasing frame-number order. The content value
/// of the first frame is `0.0`.
pub trait CutDetector {
    /// Feed one frame; returns a cut frame number when one is confirmed.
    fn push(&mut self, frame_number: u64, content_value: f64) -> Option<u64>;

    /// Flush any cuts still pending at end of stream.
    fn finish(&mut self) -> Vec<u64> {
        Vec::new()
    }
}

/// Fixed-threshold detector.
#[derive(Debug, Clone)]
pub struct ContentDetector {
    /// Content value at or above which a cut is reported. Default: 27.0.
    pub threshold: f64,
    /// Minimum shot length in frames. Default: 15.
    pub min_scene_len: u64,
    last_cut: Option<u64>,
}

impl ContentDetector {
    /// Create a detector with the given threshold and minimum shot length.
    pub fn new(threshold: f64, min_scene_len: u64) -> Self {
        Self {
            threshold,
            min_scene_len,
            last_cut: None,
        }
    }
}

impl Default for ContentDetector {
    fn default() -> Self {
        Self::new(27.0, 15)
    }
}

impl CutDetector for ContentDetector {
    fn push(&mut self, frame_number: u64, content_value: f64) -> Option<u64> {
        let last_cut = *self.last_cut.get_or_insert(frame_number);
        if content_value >= self.threshold
            && frame_number.saturating_sub(last_cut) >= self.min_scene_len
        {
            self.last_cut = Some(frame_number);
            return Some(frame_number);
        }
        None
    }
}

/// Rolling-average detector.
///
/// A frame is a cut when its content value is at least `adaptive_threshold`
/// times the mean of the `window_width` frames on either side, and at least
/// `min_content_val` in absolute terms. Decisions lag the input by
/// `window_width` frames.
#[derive(Debug, Clone)]
pub struct AdaptiveDetector {
    /// Ratio to the neighbourhood average required for a cut. Default: 3.0.
    pub adaptive_threshold: f64,
    /// Minimum shot length in frames. Default: 15.
    pub min_scene_len: u64,
    /// Frames considered on each side of the candidate. Default: 2.
    pub window_width: usize,
    /// Absolute content value a cut must reach. Default: 15.0.
    pub min_content_val: f64,
    buffer: VecDeque<(u64, f64)>,
    last_cut: Option<u64>,
}

impl AdaptiveDetector {
    /// Create a detector with explicit parameters.
    ///
    /// `window_width` is clamped to at least 1.
    pub fn new(
        adaptive_threshold: f64,
        min_scene_len: u64,
        window_width: usize,
        min_content_val: f64,
    ) -> Self {
        let window_width = window_width.max(1);
        Self {
            adaptive_threshold,
            min_scene_len,
            window_width,
            min_content_val,
            buffer: VecDeque::with_capacity(2 * window_width + 1),
            last_cut: None,
        }
    }

    /// Ratio of the candidate's content value to its neighbourhood average.
    fn adaptive_ratio(&self, target_score: f64) -> f64 {
        let neighbour_sum: f64 = self
            .buffer
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.window_width)
            .map(|(_, (_, score))| score)
            .sum();
        let average = neighbour_sum / (2.0 * self.window_width as f64);

        if average.abs() >= 1e-5 {
            (target_score / average).min(255.0)
        } else if target_score >= self.min_content_val {
            255.0
        } else {
            0.0
        }
    }
}

impl Default for AdaptiveDetector {
    fn default() -> Self {
        Self::new(3.0, 15, 2, 15.0)
    }
}

impl CutDetector for AdaptiveDetector {
    fn push(&mut self, frame_number: u64, content_value: f64) -> Option<u64> {
        let last_cut = *self.last_cut.get_or_insert(frame_number);

        let required = 2 * self.window_width + 1;
        self.buffer.push_back((frame_number, content_value));
        if self.buffer.len() > required {
            self.buffer.pop_front();
        }
        if self.buffer.len() < required {
            return None;
        }

        let (target_frame, target_score) = self.buffer[self.window_width];
        let ratio = self.adaptive_ratio(target_score);

        let threshold_met =
            ratio >= self.adaptive_threshold && target_score >= self.min_content_val;
        let min_length_met = frame_number.saturating_sub(last_cut) >= self.min_scene_len;

        if threshold_met && min_length_met {
            self.last_cut = Some(frame_number);
            return Some(target_frame);
        }
        None
    }
}
