//! Stream Capture Library for the Cabin Pipeline
//!
//! Turns a continuous MJPEG byte stream (concatenated JPEG images with no
//! length prefix) into decoded RGB frames:
//! - Fixed-size byte window scanned for SOI/EOI markers
//! - 4x downsampled JPEG decode
//! - Dedicated extractor thread with cooperative, bounded-time stop

pub mod extractor;
pub mod frame;
pub mod framer;
pub mod source;

pub use extractor::FrameExtractor;
pub use frame::{decode_jpeg, VideoFrame};
pub use framer::JpegFramer;
pub use source::{ChunkStream, HttpStreamSource, StreamSource};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Capture error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open stream: {0}")]
    Open(String),

    #[error("Connection Failed: HTTP {0}")]
    Http(u16),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Read timeout after {0}ms")]
    Timeout(u64),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Extractor thread failed to start: {0}")]
    Thread(String),
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Decode(err.to_string())
    }
}

/// Connection lifecycle notifications from the extractor thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Stream opened with a success response
    Connected,
    /// Stream could not be opened or failed while reading
    Error(String),
    /// Remote end closed the stream
    Ended,
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Byte window size; a frame larger than this is dropped
    pub window_size: usize,
    /// Integer downsampling factor applied on decode
    pub downsample: u32,
    /// Connection/response timeout (milliseconds)
    pub connect_timeout_ms: u64,
    /// Maximum wait for the next chunk (milliseconds)
    pub read_timeout_ms: u64,
    /// How long `stop` waits for the extractor thread (milliseconds)
    pub stop_grace_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window_size: framer::DEFAULT_WINDOW_SIZE,
            downsample: 4,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            stop_grace_ms: 500,
        }
    }
}

impl CaptureConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}
