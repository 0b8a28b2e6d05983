//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is opened and does not require decoding any frames.

/// Metadata for the video stream a dataset is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second, or `0.0` if unknown.
    pub frames_per_second: f64,
    /// Frame count as reported by the container, `0` if absent.
    pub reported_frame_count: u64,
    /// Frame count estimated from duration × frame rate, `0` if unknown.
    pub estimated_frame_count: u64,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
    /// Index of the stream within the container.
    pub stream_index: usize,
}

impl VideoMetadata {
    /// The best frame count available without decoding, if any.
    ///
    /// Prefers the container's count over the duration-based estimate.
    pub fn known_frame_count(&self) -> Option<u64> {
        [self.reported_frame_count, self.estimated_frame_count]
            .into_iter()
            .find(|&count| count > 0)
    }
}
