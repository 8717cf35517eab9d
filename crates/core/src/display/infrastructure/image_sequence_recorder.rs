use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::display::domain::display_sink::{DisplayError, FrameRecorder};
use crate::shared::frame::Frame;

/// Writes each recorded frame as `frame_NNNNNN.png` into a directory.
pub struct ImageSequenceRecorder {
    dir: PathBuf,
    written: usize,
}

impl ImageSequenceRecorder {
    pub fn new(dir: &Path) -> Result<Self, DisplayError> {
        fs::create_dir_all(dir).map_err(|source| DisplayError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn frame_path(&self, sequence: u64) -> PathBuf {
        self.dir.join(format!("frame_{sequence:06}.png"))
    }
}

impl FrameRecorder for ImageSequenceRecorder {
    fn record(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let path = self.frame_path(frame.sequence());
        let image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec()).ok_or(
            DisplayError::BufferSize {
                sequence: frame.sequence(),
                width: frame.width(),
                height: frame.height(),
            },
        )?;
        image
            .save(&path)
            .map_err(|source| DisplayError::Image { path, source })?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DisplayError> {
        log::info!("Saved {} frames to {}", self.written, self.dir.display());
        Ok(())
    }
}
