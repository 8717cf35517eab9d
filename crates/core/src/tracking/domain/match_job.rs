use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// A frame and the candidates detected in it, handed to the match worker as
/// one unit so the two can never be paired across jobs.
#[derive(Clone, Debug)]
pub struct MatchJob {
    frame: Frame,
    candidates: Vec<BoundingBox>,
}

impl MatchJob {
    pub fn new(frame: Frame, candidates: Vec<BoundingBox>) -> Self {
        Self { frame, candidates }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn candidates(&self) -> &[BoundingBox] {
        &self.candidates
    }

    pub fn frame_sequence(&self) -> u64 {
        self.frame.sequence()
    }
}

/// Outcome of one [`MatchJob`]: the winning box, if any.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub frame_sequence: u64,
    pub matched: Option<BoundingBox>,
    /// Distance of the winning candidate to the reference.
    pub distance: Option<f32>,
}

impl MatchResult {
    pub fn no_match(frame_sequence: u64) -> Self {
        Self {
            frame_sequence,
            matched: None,
            distance: None,
        }
    }

    pub fn matched(bbox: BoundingBox, distance: f32) -> Self {
        Self {
            frame_sequence: bbox.frame_sequence,
            matched: Some(bbox),
            distance: Some(distance),
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }
}
