//! Shot boundary detection.
//!
//! Decodes a video stream once and reports the frames at which one shot cuts
//! to the next. Three strategies are available through [`DetectorKind`]:
//! the HSV content detectors from [`detector`](crate::detector) (adaptive by
//! default), or FFmpeg's `scdet` filter.
//!
//! # Example
//!
//! ```no_run
//! use cutrate::{DetectorKind, ShotDetectionOptions, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let options = ShotDetectionOptions::new().detector(DetectorKind::Content);
//! let detection = video.detect_shots(&options)?;
//! for boundary in detection.boundaries() {
//!     println!("{:.3}s -> {:.3}s", boundary.start, boundary.end);
//! }
//! # Ok::<(), cutrate::CutrateError>(())
//! ```

use std::ffi::CStr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    filter::Graph as FilterGraph,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::AVPixelFormat;
use image::RgbImage;

use crate::{
    conversion::{frame_to_rgb_buffer, frame_to_seconds, pts_to_frame_number},
    detector::{
        AdaptiveDetector, ContentDetector, CutDetector, HsvFrame, content_value,
        downscale_factor,
    },
    error::CutrateError,
    progress::CancellationToken,
    shots::{ShotBoundary, ShotSummary},
    video_file::VideoFile,
};

/// Cut detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    /// Rolling-average HSV detector ([`AdaptiveDetector`]).
    #[default]
    Adaptive,
    /// Fixed-threshold HSV detector ([`ContentDetector`]).
    Content,
    /// FFmpeg's `scdet` filter.
    Scdet,
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "adaptive" => Ok(DetectorKind::Adaptive),
            "content" => Ok(DetectorKind::Content),
            "scdet" | "ffmpeg" => Ok(DetectorKind::Scdet),
            other => Err(format!("unsupported detector: {other}")),
        }
    }
}

/// Shot detection settings.
///
/// `threshold` is interpreted per detector: the adaptive ratio for
/// [`DetectorKind::Adaptive`], the content value for
/// [`DetectorKind::Content`] and the `scdet` score (0–100) for
/// [`DetectorKind::Scdet`]. When unset, each detector uses its own default
/// (3.0, 27.0 and 10.0 respectively).
#[derive(Debug, Clone)]
pub struct ShotDetectionOptions {
    /// Detection strategy.
    pub detector: DetectorKind,
    /// Detector-specific threshold override.
    pub threshold: Option<f64>,
    /// Minimum shot length in frames for the HSV detectors. Default: 15.
    pub min_scene_len: u64,
    /// Neighbourhood half-width for the adaptive detector. Default: 2.
    pub window_width: usize,
    /// Minimum absolute content value for an adaptive cut. Default: 15.0.
    pub min_content_val: f64,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Default for ShotDetectionOptions {
    fn default() -> Self {
        Self {
            detector: DetectorKind::Adaptive,
            threshold: None,
            min_scene_len: 15,
            window_width: 2,
            min_content_val: 15.0,
            cancellation: None,
        }
    }
}

impl ShotDetectionOptions {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the detection strategy.
    #[must_use]
    pub fn detector(mut self, detector: DetectorKind) -> Self {
        self.detector = detector;
        self
    }

    /// Override the detector's threshold.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the minimum shot length in frames.
    #[must_use]
    pub fn min_scene_len(mut self, frames: u64) -> Self {
        self.min_scene_len = frames;
        self
    }

    /// Stop decoding with [`CutrateError::Cancelled`] once `token` is
    /// cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    fn cut_detector(&self) -> Box<dyn CutDetector> {
        match self.detector {
            DetectorKind::Content => Box::new(ContentDetector::new(
                self.threshold.unwrap_or(27.0),
                self.min_scene_len,
            )),
            _ => Box::new(AdaptiveDetector::new(
                self.threshold.unwrap_or(3.0),
                self.min_scene_len,
                self.window_width,
                self.min_content_val,
            )),
        }
    }
}

/// Raw result of a detection pass over one video.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotDetection {
    /// Frame numbers at which a new shot starts, ascending.
    pub cuts: Vec<u64>,
    /// Number of frames in the video.
    pub total_frames: u64,
    /// Frame rate used to convert frame numbers to seconds.
    pub frames_per_second: f64,
    /// Container duration.
    pub duration: Duration,
}

impl ShotDetection {
    /// Shot boundaries covering the whole timeline.
    ///
    /// `k` cuts give `k + 1` shots. A video without cuts yields an empty
    /// list rather than a single whole-video shot.
    pub fn boundaries(&self) -> Vec<ShotBoundary> {
        let mut cuts: Vec<u64> = self
            .cuts
            .iter()
            .copied()
            .filter(|&cut| cut > 0 && (self.total_frames == 0 || cut < self.total_frames))
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        if cuts.is_empty() {
            return Vec::new();
        }

        let end_frame = self.total_frames.max(cuts[cuts.len() - 1] + 1);
        let starts = std::iter::once(0).chain(cuts.iter().copied());
        let ends = cuts.iter().copied().chain(std::iter::once(end_frame));

        starts
            .zip(ends)
            .map(|(start, end)| ShotBoundary {
                start: frame_to_seconds(start, self.frames_per_second),
                end: frame_to_seconds(end, self.frames_per_second),
            })
            .collect()
    }

    /// Aggregate the boundaries into shot statistics.
    pub fn summary(&self) -> ShotSummary {
        ShotSummary::from_boundaries(&self.boundaries())
    }
}

/// Source of shot detections for a video file.
///
/// The batch segmenter depends on this trait rather than on FFmpeg
/// directly.
pub trait ShotDetector {
    /// Detect shots in the video at `path`.
    fn detect(&mut self, path: &Path) -> Result<ShotDetection, CutrateError>;
}

/// [`ShotDetector`] that decodes the file with FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegShotDetector {
    options: ShotDetectionOptions,
}

impl FfmpegShotDetector {
    /// Create a detector with the given options.
    pub fn new(options: ShotDetectionOptions) -> Self {
        Self { options }
    }
}

impl ShotDetector for FfmpegShotDetector {
    fn detect(&mut self, path: &Path) -> Result<ShotDetection, CutrateError> {
        let mut video = VideoFile::open(path)?;
        video.detect_shots(&self.options)
    }
}

/// Consumes decoded frames in presentation order.
trait FrameSink {
    fn consume(&mut self, frame: &VideoFrame) -> Result<(), CutrateError>;

    /// Returns the detected cut frames.
    fn finish(self: Box<Self>) -> Result<Vec<u64>, CutrateError>;
}

/// Detect shots in `video`.
///
/// Called by [`VideoFile::detect_shots`].
pub(crate) fn detect_shots_impl(
    video: &mut VideoFile,
    options: &ShotDetectionOptions,
) -> Result<ShotDetection, CutrateError> {
    let video_stream_index = video.video_stream_index;

    log::debug!(
        "Detecting shots in {} (detector={:?}, threshold={:?})",
        video.file_path.display(),
        options.detector,
        options.threshold,
    );

    let stream = video
        .input_context
        .stream(video_stream_index)
        .ok_or(CutrateError::NoVideoStream)?;
    let time_base = stream.time_base();
    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    let mut decoder = decoder_context.decoder().video()?;

    let frames_per_second = video.metadata.frames_per_second;
    let mut sink: Box<dyn FrameSink> = match options.detector {
        DetectorKind::Scdet => Box::new(ScdetSink::new(
            options.threshold.unwrap_or(10.0),
            time_base,
            frames_per_second,
        )),
        _ => Box::new(HsvSink::new(options.cut_detector())),
    };

    let mut decoded_frame = VideoFrame::empty();
    let mut decoded_count: u64 = 0;

    for (stream, packet) in video.input_context.packets() {
        if options.is_cancelled() {
            return Err(CutrateError::Cancelled);
        }

        if stream.index() != video_stream_index {
            continue;
        }

        decoder
            .send_packet(&packet)
            .map_err(|e| CutrateError::VideoDecodeError(e.to_string()))?;

        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            sink.consume(&decoded_frame)?;
            decoded_count += 1;
        }
    }

    let _ = decoder.send_eof();
    while decoder.receive_frame(&mut decoded_frame).is_ok() {
        sink.consume(&decoded_frame)?;
        decoded_count += 1;
    }

    if decoded_count == 0 {
        return Err(CutrateError::VideoDecodeError(
            "no frames could be decoded".to_string(),
        ));
    }

    let cuts = sink.finish()?;
    log::debug!(
        "{}: {} frame(s), {} cut(s)",
        video.file_path.display(),
        decoded_count,
        cuts.len()
    );

    Ok(ShotDetection {
        cuts,
        total_frames: decoded_count,
        frames_per_second,
        duration: video.metadata.duration,
    })
}

/// Scores downscaled HSV frames with a [`CutDetector`].
struct HsvSink {
    detector: Box<dyn CutDetector>,
    scaler: Option<(ScalingContext, Pixel, u32, u32)>,
    rgb_frame: VideoFrame,
    previous: Option<HsvFrame>,
    frame_number: u64,
    cuts: Vec<u64>,
}

impl HsvSink {
    fn new(detector: Box<dyn CutDetector>) -> Self {
        Self {
            detector,
            scaler: None,
            rgb_frame: VideoFrame::empty(),
            previous: None,
            frame_number: 0,
            cuts: Vec::new(),
        }
    }

    fn scaler_for(&mut self, frame: &VideoFrame) -> Result<&mut ScalingContext, CutrateError> {
        let (format, width, height) = (frame.format(), frame.width(), frame.height());
        let stale = self
            .scaler
            .as_ref()
            .is_none_or(|(_, f, w, h)| (*f, *w, *h) != (format, width, height));

        if stale {
            let factor = downscale_factor(width);
            let scaler = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                (width / factor).max(1),
                (height / factor).max(1),
                ScalingFlags::AREA,
            )?;
            self.scaler = Some((scaler, format, width, height));
        }

        self.scaler
            .as_mut()
            .map(|(scaler, ..)| scaler)
            .ok_or_else(|| CutrateError::VideoDecodeError("scaler unavailable".to_string()))
    }
}

impl FrameSink for HsvSink {
    fn consume(&mut self, frame: &VideoFrame) -> Result<(), CutrateError> {
        let mut rgb_frame = std::mem::replace(&mut self.rgb_frame, VideoFrame::empty());
        self.scaler_for(frame)?.run(frame, &mut rgb_frame)?;

        let (width, height) = (rgb_frame.width(), rgb_frame.height());
        let buffer = frame_to_rgb_buffer(&rgb_frame, width, height);
        self.rgb_frame = rgb_frame;

        let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            CutrateError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        let current = HsvFrame::from_rgb(&image);

        let score = self
            .previous
            .as_ref()
            .map_or(0.0, |previous| content_value(previous, &current));
        self.previous = Some(current);

        if let Some(cut) = self.detector.push(self.frame_number, score) {
            self.cuts.push(cut);
        }
        self.frame_number += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u64>, CutrateError> {
        let pending = self.detector.finish();
        self.cuts.extend(pending);
        Ok(self.cuts)
    }
}

/// Runs frames through `scale → format → scdet` and reads the per-frame
/// `lavfi.scd.score`.
struct ScdetSink {
    threshold: f64,
    time_base: Rational,
    frames_per_second: f64,
    graph: Option<FilterGraph>,
    filtered_frame: VideoFrame,
    cuts: Vec<u64>,
}

impl ScdetSink {
    fn new(threshold: f64, time_base: Rational, frames_per_second: f64) -> Self {
        Self {
            threshold,
            time_base,
            frames_per_second,
            graph: None,
            filtered_frame: VideoFrame::empty(),
            cuts: Vec::new(),
        }
    }

    /// Build the filter graph from the first decoded frame.
    ///
    /// The decoder's advertised pixel format can differ from what it
    /// actually emits, so the buffer source is configured from a real
    /// frame. The `format` stage normalises any later mid-stream change.
    fn build_graph(&self, frame: &VideoFrame) -> Result<FilterGraph, CutrateError> {
        let pix_fmt = AVPixelFormat::from(frame.format()) as i32;
        // SAFETY: reads two plain enum fields of a valid, decoded AVFrame.
        let (color_space, color_range) = unsafe {
            let ptr = frame.as_ptr();
            ((*ptr).colorspace as i32, (*ptr).color_range as i32)
        };

        let buffer_args = format!(
            "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect=1/1:colorspace={}:range={}",
            frame.width(),
            frame.height(),
            pix_fmt,
            self.time_base.numerator(),
            self.time_base.denominator(),
            color_space,
            color_range,
        );

        let mut graph = FilterGraph::new();
        let buffer = ffmpeg_next::filter::find("buffer").ok_or_else(|| {
            CutrateError::FilterGraphError("FFmpeg 'buffer' filter not found".to_string())
        })?;
        let buffersink = ffmpeg_next::filter::find("buffersink").ok_or_else(|| {
            CutrateError::FilterGraphError("FFmpeg 'buffersink' filter not found".to_string())
        })?;

        graph
            .add(&buffer, "in", &buffer_args)
            .map_err(|e| CutrateError::FilterGraphError(format!("buffer: {e}")))?;
        graph
            .add(&buffersink, "out", "")
            .map_err(|e| CutrateError::FilterGraphError(format!("buffersink: {e}")))?;

        let spec = format!(
            "scale=320:-2,format=pix_fmts=yuv420p,scdet=threshold={}",
            self.threshold
        );
        graph
            .output("in", 0)
            .map_err(|e| CutrateError::FilterGraphError(format!("output: {e}")))?
            .input("out", 0)
            .map_err(|e| CutrateError::FilterGraphError(format!("input: {e}")))?
            .parse(&spec)
            .map_err(|e| CutrateError::FilterGraphError(format!("parse: {e}")))?;
        graph
            .validate()
            .map_err(|e| CutrateError::FilterGraphError(format!("validate: {e}")))?;

        Ok(graph)
    }

    fn drain(&mut self) {
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        while let Some(mut sink) = graph.get("out") {
            if sink.sink().frame(&mut self.filtered_frame).is_err() {
                break;
            }
            let Some(score) = read_scdet_score(&self.filtered_frame) else {
                continue;
            };
            if score >= self.threshold {
                let pts = self.filtered_frame.pts().unwrap_or(0);
                self.cuts.push(pts_to_frame_number(
                    pts,
                    self.time_base,
                    self.frames_per_second,
                ));
            }
        }
    }
}

impl FrameSink for ScdetSink {
    fn consume(&mut self, frame: &VideoFrame) -> Result<(), CutrateError> {
        if self.graph.is_none() {
            self.graph = Some(self.build_graph(frame)?);
        }
        if let Some(graph) = self.graph.as_mut() {
            graph
                .get("in")
                .ok_or_else(|| CutrateError::FilterGraphError("Filter 'in' not found".to_string()))?
                .source()
                .add(frame)
                .map_err(|e| CutrateError::FilterGraphError(format!("feed: {e}")))?;
        }
        self.drain();
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u64>, CutrateError> {
        if let Some(graph) = self.graph.as_mut()
            && let Some(mut source) = graph.get("in")
        {
            let _ = source.source().flush();
        }
        self.drain();
        Ok(self.cuts)
    }
}

/// Read the `lavfi.scd.score` metadata value from a filtered frame.
///
/// `scdet` attaches the key to every frame it analyses; frames without it
/// yield `None`.
fn read_scdet_score(frame: &VideoFrame) -> Option<f64> {
    // SAFETY: ffmpeg-next's safe API does not expose per-frame metadata; the
    // frame pointer and dictionary entries are checked for null before use.
    unsafe {
        let frame_ptr = frame.as_ptr();
        if frame_ptr.is_null() {
            return None;
        }

        let metadata = (*frame_ptr).metadata;
        if metadata.is_null() {
            return None;
        }

        let key = c"lavfi.scd.score";
        let entry = ffmpeg_sys_next::av_dict_get(metadata, key.as_ptr(), std::ptr::null(), 0);
        if entry.is_null() || (*entry).value.is_null() {
            return None;
        }

        CStr::from_ptr((*entry).value).to_str().ok()?.parse::<f64>().ok()
    }
}
