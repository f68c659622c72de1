//! Video frame types and decoding

use crate::CaptureError;
use image::imageops::FilterType;
use image::ImageFormat;
use std::time::Instant;

/// Half-width of the central luminance patch (10x10 pixels)
const LUMINANCE_PATCH_HALF: i64 = 5;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// When the frame was decoded
    pub captured_at: Instant,
    /// Frame sequence number within the current stream
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            captured_at: Instant::now(),
            sequence,
        }
    }

    /// Create a frame filled with a single colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::new(data, width, height, 0)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Average perceptual luminance (0-255) of a 10x10 patch at the centre.
    ///
    /// Frames too small to hold the patch report full brightness.
    pub fn center_luminance(&self) -> u8 {
        let cx = (self.width / 2) as i64;
        let cy = (self.height / 2) as i64;
        if cx <= 10 || cy <= 10 {
            return 255;
        }

        let mut sum: u64 = 0;
        let mut pixels: u64 = 0;
        for dx in -LUMINANCE_PATCH_HALF..LUMINANCE_PATCH_HALF {
            for dy in -LUMINANCE_PATCH_HALF..LUMINANCE_PATCH_HALF {
                if let Some([r, g, b]) = self.get_pixel((cx + dx) as u32, (cy + dy) as u32) {
                    // Luminance formula: 0.299*R + 0.587*G + 0.114*B
                    sum += (r as f32 * 0.299 + g as f32 * 0.587 + b as f32 * 0.114) as u64;
                    pixels += 1;
                }
            }
        }

        if pixels == 0 {
            255
        } else {
            (sum / pixels).min(255) as u8
        }
    }
}

/// Decode a JPEG image to RGB, shrinking each side by `downsample`
pub fn decode_jpeg(bytes: &[u8], downsample: u32, sequence: u64) -> Result<VideoFrame, CaptureError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;

    let factor = downsample.max(1);
    let img = if factor > 1 {
        let width = (img.width() / factor).max(1);
        let height = (img.height() / factor).max(1);
        img.resize_exact(width, height, FilterType::Nearest)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(VideoFrame::new(rgb.into_raw(), width, height, sequence))
}
