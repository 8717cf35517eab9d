use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::VideoError;

/// Decodes a still image (e.g. the reference face photo) into an RGB frame
/// with sequence id 0.
pub fn read_image_frame(path: &Path) -> Result<Frame, VideoError> {
    let img = image::open(path)
        .map_err(|source| VideoError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 0))
}
