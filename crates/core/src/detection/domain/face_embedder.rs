use thiserror::Error;

use crate::detection::domain::embedding::Embedding;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("box {0:?} has no area inside the frame")]
    InvalidRegion(BoundingBox),
    #[error("embedding inference failed: {0}")]
    Inference(String),
}

/// Maps a face region to a descriptor. Failures are per box and leave no
/// state behind.
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Embedding, EmbeddingError>;
}
