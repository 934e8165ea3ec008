//! Decoder-reported video stream metadata.
//!
//! Extracted once when a [`VideoFile`](crate::VideoFile) is opened. The
//! scraped per-video table rows live in [`records`](crate::records); this is
//! what the container itself says about the stream.

use std::time::Duration;

/// Metadata for the primary video stream of a file.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, computed from duration and frame rate.
    pub frame_count: u64,
    /// Container duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}
