use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("failed to initialise ffmpeg: {0}")]
    Init(#[source] ffmpeg_next::Error),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("no video stream in {0}")]
    NoVideoStream(PathBuf),
    #[error("decode failed: {0}")]
    Decode(#[source] ffmpeg_next::Error),
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Sequential, forward-only supplier of frames.
///
/// The pipeline treats `Ok(None)` and any `Err` alike: the stream is over.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError>;

    /// Releases decoder resources. Safe to call more than once.
    fn close(&mut self);
}
