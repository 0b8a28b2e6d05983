//! Sequential frame sources.
//!
//! The extraction loop reads a video exactly once, front to back, through
//! the [`FrameSource`] trait. [`VideoSource`] implements it on top of
//! FFmpeg; tests drive the loop with synthetic in-memory sources.
//!
//! Decoding a frame and converting it to RGB are separate steps:
//! [`advance`](FrameSource::advance) decodes the next frame and
//! [`current_frame`](FrameSource::current_frame) converts it, optionally
//! scaling to an exact output size in the same pass. Frames the sampler
//! did not select are never converted.
//!
//! # Example
//!
//! ```no_run
//! use frameset::{FrameSource, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! println!("{} frames", source.total_frames()?);
//! while let Some(frame) = source.read_next(Some((224, 224)))? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), frameset::FramesetError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{error::FramesetError, metadata::VideoMetadata};

/// Consecutive demuxer read errors tolerated before the stream is treated
/// as ended.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 16;

/// A forward-only supply of decoded video frames.
pub trait FrameSource {
    /// Total number of frames in the stream.
    ///
    /// Implementations may have to scan the whole stream to answer; the
    /// read position is back at the first frame afterwards.
    fn total_frames(&mut self) -> Result<u64, FramesetError>;

    /// Decode the next frame. Returns `false` at end of stream.
    fn advance(&mut self) -> Result<bool, FramesetError>;

    /// Convert the frame produced by the last successful
    /// [`advance`](FrameSource::advance) to RGB8.
    ///
    /// With `Some((width, height))` the frame is area-scaled to exactly
    /// that size, stretching if the aspect ratio differs; with `None` it
    /// keeps the decoded size.
    fn current_frame(&mut self, size: Option<(u32, u32)>) -> Result<RgbImage, FramesetError>;

    /// Decode and convert the next frame; `None` at end of stream.
    fn read_next(&mut self, size: Option<(u32, u32)>) -> Result<Option<RgbImage>, FramesetError> {
        if self.advance()? {
            self.current_frame(size).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Release decoder resources. Calling it more than once is harmless.
    fn close(&mut self) {}
}

/// FFmpeg-backed [`FrameSource`] over the best video stream of a file.
///
/// The demuxer and decoder are released by [`close`](FrameSource::close)
/// or when the source is dropped, whichever comes first.
pub struct VideoSource {
    path: PathBuf,
    metadata: VideoMetadata,
    session: Option<DecodeSession>,
    scanned_frame_count: Option<u64>,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("open", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open `path` and prepare a decoder for its best video stream.
    ///
    /// # Errors
    ///
    /// - [`FramesetError::FileOpen`] if the file is missing or FFmpeg cannot
    ///   read it.
    /// - [`FramesetError::NoVideoStream`] if it contains no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramesetError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", path.display());

        if !path.exists() {
            return Err(FramesetError::FileOpen {
                path,
                reason: "file does not exist".to_string(),
            });
        }

        ffmpeg_next::init().map_err(|error| FramesetError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let (session, metadata) = DecodeSession::open(&path)?;

        log::info!(
            "Opened video {}: {}x{}, {:.2} fps, codec={}, frames reported={} estimated={}",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
            metadata.reported_frame_count,
            metadata.estimated_frame_count,
        );

        Ok(Self {
            path,
            metadata,
            session: Some(session),
            scanned_frame_count: None,
        })
    }

    /// Stream metadata read at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn session(&mut self) -> Result<&mut DecodeSession, FramesetError> {
        self.session.as_mut().ok_or_else(|| {
            FramesetError::VideoDecodeError("video source has been closed".to_string())
        })
    }

    /// Count frames by decoding the whole stream, then start over.
    fn scan_frame_count(&mut self) -> Result<u64, FramesetError> {
        log::warn!(
            "Frame count unavailable for {}; decoding the whole stream to count frames",
            self.path.display()
        );

        let mut count = 0u64;
        while self.session()?.advance()? {
            count += 1;
        }

        // Reopening is the only rewind that works for unseekable inputs too.
        let (session, _) = DecodeSession::open(&self.path)?;
        self.session = Some(session);

        log::debug!("Full scan counted {count} frames");
        Ok(count)
    }
}

impl FrameSource for VideoSource {
    fn total_frames(&mut self) -> Result<u64, FramesetError> {
        if let Some(count) = self.metadata.known_frame_count() {
            return Ok(count);
        }
        if let Some(count) = self.scanned_frame_count {
            return Ok(count);
        }
        let count = self.scan_frame_count()?;
        self.scanned_frame_count = Some(count);
        Ok(count)
    }

    fn advance(&mut self) -> Result<bool, FramesetError> {
        match self.session.as_mut() {
            Some(session) => session.advance(),
            None => Ok(false),
        }
    }

    fn current_frame(&mut self, size: Option<(u32, u32)>) -> Result<RgbImage, FramesetError> {
        self.session()?.convert_current_frame(size)
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            log::debug!("Closed video source {}", self.path.display());
        }
    }
}

/// Demuxer, decoder and colour converter for one pass over the stream.
struct DecodeSession {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalerState>,
    video_stream_index: usize,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    has_frame: bool,
    eof_sent: bool,
}

/// A scaler together with the geometry it was built for.
struct ScalerState {
    context: ScalingContext,
    format: Pixel,
    input: (u32, u32),
    output: (u32, u32),
}

impl DecodeSession {
    fn open(path: &Path) -> Result<(Self, VideoMetadata), FramesetError> {
        let open_error = |reason: String| FramesetError::FileOpen {
            path: path.to_path_buf(),
            reason,
        };

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FramesetError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_error(format!("Failed to read video codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let duration_microseconds = input_context.duration();
        let estimated_frame_count = if duration_microseconds > 0 && frames_per_second > 0.0 {
            (duration_microseconds as f64 / 1_000_000.0 * frames_per_second).round() as u64
        } else {
            0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            reported_frame_count: stream.frames().max(0) as u64,
            estimated_frame_count,
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            stream_index: video_stream_index,
        };

        let session = Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            has_frame: false,
            eof_sent: false,
        };
        Ok((session, metadata))
    }

    fn advance(&mut self) -> Result<bool, FramesetError> {
        let mut read_errors = 0u32;
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                self.has_frame = true;
                return Ok(true);
            }

            if self.eof_sent {
                self.has_frame = false;
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            log::warn!("Dropping undecodable video packet: {error}");
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_errors += 1;
                    log::debug!("Demuxer read error ({read_errors}): {error}");
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        log::warn!("Too many demuxer read errors, treating stream as ended");
                        self.decoder.send_eof()?;
                        self.eof_sent = true;
                    }
                }
            }
        }
    }

    fn convert_current_frame(
        &mut self,
        size: Option<(u32, u32)>,
    ) -> Result<RgbImage, FramesetError> {
        if !self.has_frame {
            return Err(FramesetError::VideoDecodeError(
                "no decoded frame available".to_string(),
            ));
        }

        let format = self.decoded_frame.format();
        let input = (self.decoded_frame.width(), self.decoded_frame.height());
        let (width, height) = size.unwrap_or(input);

        let stale = self.scaler.as_ref().is_none_or(|state| {
            state.format != format || state.input != input || state.output != (width, height)
        });
        if stale {
            let context = ScalingContext::get(
                format,
                input.0,
                input.1,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::AREA,
            )?;
            self.scaler = Some(ScalerState {
                context,
                format,
                input,
                output: (width, height),
            });
            // The scaler refuses an output frame of the old geometry.
            self.rgb_frame = VideoFrame::empty();
        }

        if let Some(state) = self.scaler.as_mut() {
            state.context.run(&self.decoded_frame, &mut self.rgb_frame)?;
        }

        let buffer = packed_rgb_buffer(&self.rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            FramesetError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}

/// Copy an RGB24 frame into a tightly packed buffer, dropping row padding.
fn packed_rgb_buffer(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * height as usize].to_vec();
    }
    (0..height as usize)
        .flat_map(|row| &data[row * stride..row * stride + row_bytes])
        .copied()
        .collect()
}
