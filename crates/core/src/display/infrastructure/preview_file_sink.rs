use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};

use crate::display::domain::display_sink::{DisplayError, DisplaySink};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Keeps a single image file showing the latest displayed frame.
///
/// Each frame is written to a sibling `.part` file and renamed over the
/// target, so viewers polling the file never read a half-written image.
pub struct PreviewFileSink {
    path: PathBuf,
    format: ImageFormat,
}

impl PreviewFileSink {
    pub fn new(path: &Path) -> Result<Self, DisplayError> {
        let format = ImageFormat::from_path(path).map_err(|source| DisplayError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
        })
    }
}

impl DisplaySink for PreviewFileSink {
    fn show(&mut self, frame: Frame, _track: Option<BoundingBox>) -> Result<(), DisplayError> {
        let sequence = frame.sequence();
        let (width, height) = (frame.width(), frame.height());
        let image = RgbImage::from_raw(width, height, frame.into_data()).ok_or(
            DisplayError::BufferSize {
                sequence,
                width,
                height,
            },
        )?;

        let mut part = self.path.clone().into_os_string();
        part.push(".part");
        let part = PathBuf::from(part);

        image
            .save_with_format(&part, self.format)
            .map_err(|source| DisplayError::Image {
                path: part.clone(),
                source,
            })?;
        fs::rename(&part, &self.path).map_err(|source| DisplayError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
