use crate::display::domain::display_sink::{DisplayError, DisplaySink};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Forwards every `interval`-th frame to the display sink.
pub struct DisplayThrottle {
    sink: Box<dyn DisplaySink>,
    interval: u64,
}

impl DisplayThrottle {
    pub fn new(sink: Box<dyn DisplaySink>, interval: u64) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("display interval must be >= 1");
        }
        Ok(Self { sink, interval })
    }

    /// `frame_count` is 1-based.
    pub fn is_due(&self, frame_count: u64) -> bool {
        frame_count > 0 && frame_count % self.interval == 0
    }

    /// Hands a copy of `frame` to the sink when due. Returns whether it did.
    pub fn offer(
        &mut self,
        frame_count: u64,
        frame: &Frame,
        track: Option<BoundingBox>,
    ) -> Result<bool, DisplayError> {
        if !self.is_due(frame_count) {
            return Ok(false);
        }
        self.sink.show(frame.clone(), track)?;
        Ok(true)
    }
}
