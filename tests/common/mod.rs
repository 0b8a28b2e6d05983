//! Shared helpers for integration tests.

#![allow(dead_code)]

use frameset::{FrameSource, FramesetError};
use image::{Rgb, RgbImage};

/// In-memory [`FrameSource`] whose frame `n` has red = `n % 256`
/// everywhere, so frame order is visible at any requested size.
pub struct SyntheticSource {
    frame_count: u64,
    reported_count: Option<u64>,
    width: u32,
    height: u32,
    position: u64,
    pub frames_read: u64,
    pub frames_converted: u64,
    pub closed: bool,
}

impl SyntheticSource {
    pub fn new(frame_count: u64) -> Self {
        Self {
            frame_count,
            reported_count: None,
            width: 32,
            height: 24,
            position: 0,
            frames_read: 0,
            frames_converted: 0,
            closed: false,
        }
    }

    /// Report `count` frames regardless of how many the stream holds.
    pub fn reporting(mut self, count: u64) -> Self {
        self.reported_count = Some(count);
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

pub fn frame_image(number: u64, width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(number % 256) as u8, (x * 7 % 256) as u8, (y * 11 % 256) as u8])
    })
}

impl FrameSource for SyntheticSource {
    fn total_frames(&mut self) -> Result<u64, FramesetError> {
        Ok(self.reported_count.unwrap_or(self.frame_count))
    }

    fn advance(&mut self) -> Result<bool, FramesetError> {
        if self.closed || self.position >= self.frame_count {
            return Ok(false);
        }
        self.position += 1;
        self.frames_read += 1;
        Ok(true)
    }

    fn current_frame(&mut self, size: Option<(u32, u32)>) -> Result<RgbImage, FramesetError> {
        if self.position == 0 {
            return Err(FramesetError::VideoDecodeError("no frame".to_string()));
        }
        self.frames_converted += 1;
        let (width, height) = size.unwrap_or((self.width, self.height));
        Ok(frame_image(self.position - 1, width, height))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Sorted file names in `directory`.
pub fn file_names(directory: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(directory)
        .expect("Failed to list output directory")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
