use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameSource, VideoError};

/// Decodes a video file via ffmpeg-next, converting each frame to RGB24.
///
/// Frames are numbered from 1 in decode order.
pub struct FfmpegReader {
    decoding: Option<DecodeState>,
    metadata: VideoMetadata,
    next_sequence: u64,
}

// Safety: FfmpegReader is owned by exactly one thread at a time; the raw
// ffmpeg pointers inside are never shared.
unsafe impl Send for FfmpegReader {}

struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    flushing: bool,
}

impl FfmpegReader {
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        ffmpeg_next::init().map_err(VideoError::Init)?;

        let ictx = ffmpeg_next::format::input(path).map_err(|source| VideoError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| VideoError::NoVideoStream(path.to_path_buf()))?;
        let stream_index = stream.index();

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = stream.frames().max(0) as usize;

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(VideoError::Decode)?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(VideoError::Decode)?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            source_path: Some(path.to_path_buf()),
        };

        Ok(Self {
            decoding: Some(DecodeState {
                ictx,
                decoder,
                scaler,
                stream_index,
                width,
                height,
                flushing: false,
            }),
            metadata,
            next_sequence: 1,
        })
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }
}

impl FrameSource for FfmpegReader {
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        let Some(state) = self.decoding.as_mut() else {
            return Ok(None);
        };

        match state.decode_next() {
            Ok(Some(pixels)) => {
                let frame = Frame::new(pixels, state.width, state.height, self.next_sequence);
                self.next_sequence += 1;
                Ok(Some(frame))
            }
            Ok(None) => {
                self.decoding = None;
                Ok(None)
            }
            Err(e) => {
                self.decoding = None;
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.decoding = None;
    }
}

impl DecodeState {
    /// Pulls packets until the decoder yields a frame or the input runs dry.
    fn decode_next(&mut self) -> Result<Option<Vec<u8>>, VideoError> {
        loop {
            if let Some(pixels) = self.receive()? {
                return Ok(Some(pixels));
            }
            if self.flushing {
                return Ok(None);
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, VideoError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb)
            .map_err(VideoError::Decode)?;
        Ok(Some(packed_rgb(&rgb, self.width, self.height)))
    }
}

/// Drops the per-row stride padding ffmpeg may add.
fn packed_rgb(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
