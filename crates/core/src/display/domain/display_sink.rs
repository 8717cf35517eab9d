use std::path::PathBuf;

use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame {sequence} buffer does not match {width}x{height} RGB")]
    BufferSize { sequence: u64, width: u32, height: u32 },
}

/// Receives rendered frames for presentation, one at a time.
pub trait DisplaySink: Send {
    /// `track` is the box drawn on `frame`, if any.
    fn show(&mut self, frame: Frame, track: Option<BoundingBox>) -> Result<(), DisplayError>;
}

/// Persists every overlay-drawn frame while the save-output toggle is on.
pub trait FrameRecorder: Send {
    fn record(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Flushes and releases the output. Called once when the session stops.
    fn finish(&mut self) -> Result<(), DisplayError>;
}
