use ndarray::ArrayView3;

use crate::shared::bounding_box::BoundingBox;

/// A decoded video frame: contiguous RGB24 bytes in row-major order plus the
/// sequence id assigned by its source.
///
/// A `Frame` has a single owner. Crossing a thread boundary means handing
/// over a deep copy (`Clone`), never a view into a buffer the source reuses.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    /// All-black frame, mostly useful for synthetic sources.
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        Self::new(
            vec![0u8; (width as usize) * (height as usize) * CHANNELS],
            width,
            height,
            sequence,
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
        self.data[offset..offset + CHANNELS].copy_from_slice(&rgb);
    }

    /// Copies the pixels inside `bbox` (clamped to the frame) into a new frame
    /// that keeps this frame's sequence id. Returns `None` when the clamped
    /// box has no area.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let clamped = bbox.clamped(self.width, self.height)?;
        let x1 = clamped.x1 as usize;
        let y1 = clamped.y1 as usize;
        let w = clamped.width() as usize;
        let h = clamped.height() as usize;
        let stride = self.width as usize * CHANNELS;

        let mut pixels = Vec::with_capacity(w * h * CHANNELS);
        for row in y1..y1 + h {
            let start = row * stride + x1 * CHANNELS;
            pixels.extend_from_slice(&self.data[start..start + w * CHANNELS]);
        }
        Some(Frame::new(pixels, w as u32, h as u32, self.sequence))
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
