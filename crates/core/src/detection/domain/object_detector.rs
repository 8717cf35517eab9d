use std::time::Duration;

use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("detector inference failed: {0}")]
    Inference(String),
    #[error("detector did not answer within {0:?}")]
    Timeout(Duration),
    #[error("detector is still busy with an earlier frame")]
    Busy,
    #[error("detector worker is gone")]
    Disconnected,
}

/// Proposes boxes for one object class.
///
/// Implementations are shared between threads behind an `Arc`, so `detect`
/// takes `&self`; any mutable inference state lives behind a lock.
pub trait ObjectDetector: Send + Sync {
    /// Returns boxes of `target_class` in the detector's own order.
    fn detect(&self, frame: &Frame, target_class: usize) -> Result<Vec<BoundingBox>, DetectionError>;
}
