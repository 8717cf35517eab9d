use crate::display::domain::display_sink::{DisplayError, DisplaySink};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Headless sink: reports lock state changes through `log`.
#[derive(Debug, Default)]
pub struct LogDisplaySink {
    shown: u64,
    locked: Option<BoundingBox>,
}

impl LogDisplaySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> u64 {
        self.shown
    }

    pub fn locked(&self) -> Option<BoundingBox> {
        self.locked
    }
}

impl DisplaySink for LogDisplaySink {
    fn show(&mut self, frame: Frame, track: Option<BoundingBox>) -> Result<(), DisplayError> {
        self.shown += 1;
        match (self.locked, track) {
            (None, Some(b)) => log::info!(
                "Frame {}: face locked at ({}, {})-({}, {})",
                frame.sequence(),
                b.x1,
                b.y1,
                b.x2,
                b.y2
            ),
            (Some(_), None) => log::info!("Frame {}: face lost", frame.sequence()),
            (Some(prev), Some(b)) if prev != b => log::debug!(
                "Frame {}: face moved to ({}, {})-({}, {})",
                frame.sequence(),
                b.x1,
                b.y1,
                b.x2,
                b.y2
            ),
            _ => {}
        }
        self.locked = track;
        Ok(())
    }
}
