use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container-reported frame count; 0 when the container doesn't know.
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Nominal time between frames, if the container reports a frame rate.
    pub fn frame_period(&self) -> Option<Duration> {
        (self.fps.is_finite() && self.fps > 0.0).then(|| Duration::from_secs_f64(1.0 / self.fps))
    }
}
