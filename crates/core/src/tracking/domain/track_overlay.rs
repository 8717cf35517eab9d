use std::fmt;
use std::str::FromStr;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{OVERLAY_COLOR, OVERLAY_THICKNESS};
use crate::shared::frame::Frame;
use crate::tracking::domain::match_job::MatchResult;

/// What the overlay does when a result reports no match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoMatchPolicy {
    /// Drop the held box.
    #[default]
    Clear,
    /// Keep drawing the previous box.
    Retain,
}

impl FromStr for NoMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "retain" => Ok(Self::Retain),
            other => Err(format!("no-match policy must be 'clear' or 'retain', got '{other}'")),
        }
    }
}

impl fmt::Display for NoMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => f.write_str("clear"),
            Self::Retain => f.write_str("retain"),
        }
    }
}

/// Holds the box currently drawn around the tracked face.
///
/// Every result replaces the held box; between results the same box is
/// redrawn on each frame, even though the face may have moved.
#[derive(Debug, Default)]
pub struct TrackOverlay {
    policy: NoMatchPolicy,
    current: Option<BoundingBox>,
    last_result: Option<u64>,
}

impl TrackOverlay {
    pub fn new(policy: NoMatchPolicy) -> Self {
        Self {
            policy,
            current: None,
            last_result: None,
        }
    }

    pub fn apply(&mut self, result: MatchResult) {
        match (result.matched, self.policy) {
            (Some(bbox), _) => self.current = Some(bbox),
            (None, NoMatchPolicy::Clear) => self.current = None,
            (None, NoMatchPolicy::Retain) => {}
        }
        self.last_result = Some(result.frame_sequence);
    }

    pub fn current(&self) -> Option<BoundingBox> {
        self.current
    }

    /// Frame sequence of the most recently applied result.
    pub fn last_result(&self) -> Option<u64> {
        self.last_result
    }

    pub fn draw(&self, frame: &mut Frame) {
        if let Some(bbox) = self.current {
            draw_outline(frame, &bbox, OVERLAY_COLOR, OVERLAY_THICKNESS);
        }
    }
}

/// Draws a rectangle outline `thickness` pixels wide, growing inward from
/// the box edges. Parts outside the frame are clipped.
pub fn draw_outline(frame: &mut Frame, bbox: &BoundingBox, color: [u8; 3], thickness: u32) {
    let Some(b) = bbox.clamped(frame.width(), frame.height()) else {
        return;
    };
    let (x1, y1) = (b.x1 as u32, b.y1 as u32);
    let (x2, y2) = (b.x2 as u32, b.y2 as u32);
    let t = thickness.max(1);

    for y in y1..y2 {
        let on_band = y < y1 + t || y + t >= y2;
        for x in x1..x2 {
            if on_band || x < x1 + t || x + t >= x2 {
                frame.set_pixel(x, y, color);
            }
        }
    }
}
