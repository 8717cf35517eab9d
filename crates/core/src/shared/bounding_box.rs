/// Axis-aligned box in pixel coordinates, `(x1, y1)` inclusive and
/// `(x2, y2)` exclusive, tied to the sequence id of the frame it was
/// detected in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub frame_sequence: u64,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, frame_sequence: u64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            frame_sequence,
        }
    }

    /// Rounds detector-space float corners to pixels.
    pub fn from_corners(corners: [f64; 4], frame_sequence: u64) -> Self {
        Self::new(
            corners[0].round() as i32,
            corners[1].round() as i32,
            corners[2].round() as i32,
            corners[3].round() as i32,
            frame_sequence,
        )
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Intersects the box with a `frame_w` x `frame_h` frame.
    ///
    /// Returns `None` when nothing of the box remains visible.
    pub fn clamped(&self, frame_w: u32, frame_h: u32) -> Option<BoundingBox> {
        let fw = frame_w as i32;
        let fh = frame_h as i32;
        let clamped = BoundingBox {
            x1: self.x1.clamp(0, fw),
            y1: self.y1.clamp(0, fh),
            x2: self.x2.clamp(0, fw),
            y2: self.y2.clamp(0, fh),
            frame_sequence: self.frame_sequence,
        };
        (!clamped.is_empty()).then_some(clamped)
    }
}
