//! Region-of-interest green sampling

use stream_capture::VideoFrame;

/// Face mesh index of the left cheek centre
pub const CHEEK_LANDMARK: usize = 101;
/// Meshes with this many points or fewer are not trusted for the cheek
const MIN_MESH_POINTS: usize = 200;
const CHEEK_HALF_SIZE: i64 = 20;
const CENTER_HALF_SIZE: i64 = 40;
const SAMPLE_STEP: usize = 2;

/// Square patch centred on a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub cx: i64,
    pub cy: i64,
    pub half_size: i64,
}

impl Roi {
    /// Cheek patch when a full face mesh is available, frame centre otherwise
    pub fn select(frame: &VideoFrame, face_landmarks: Option<&[(f32, f32)]>) -> Self {
        let w = frame.width as f32;
        let h = frame.height as f32;

        match face_landmarks {
            Some(mesh) if mesh.len() > MIN_MESH_POINTS => {
                let (x, y) = mesh[CHEEK_LANDMARK];
                Self {
                    cx: (x * w) as i64,
                    cy: (y * h) as i64,
                    half_size: CHEEK_HALF_SIZE,
                }
            }
            _ => Self {
                cx: i64::from(frame.width / 2),
                cy: i64::from(frame.height / 2),
                half_size: CENTER_HALF_SIZE,
            },
        }
    }

    /// Mean green value over the patch, every second pixel, clamped to the frame
    pub fn average_green(&self, frame: &VideoFrame) -> f32 {
        if frame.width == 0 || frame.height == 0 {
            return 0.0;
        }
        let max_x = i64::from(frame.width) - 1;
        let max_y = i64::from(frame.height) - 1;

        let start_x = (self.cx - self.half_size).max(0);
        let end_x = (self.cx + self.half_size).min(max_x);
        let start_y = (self.cy - self.half_size).max(0);
        let end_y = (self.cy + self.half_size).min(max_y);

        let mut sum: u64 = 0;
        let mut count: u64 = 0;
        if start_x <= end_x && start_y <= end_y {
            for x in (start_x..=end_x).step_by(SAMPLE_STEP) {
                for y in (start_y..=end_y).step_by(SAMPLE_STEP) {
                    if let Some([_, g, _]) = frame.get_pixel(x as u32, y as u32) {
                        sum += u64::from(g);
                        count += 1;
                    }
                }
            }
        }

        if count > 0 {
            sum as f32 / count as f32
        } else {
            0.0
        }
    }
}
