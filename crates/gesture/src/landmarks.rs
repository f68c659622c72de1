//! Hand landmark types

use serde::{Deserialize, Serialize};

/// Hand landmark indices (MediaPipe hand landmark model convention)
#[allow(dead_code)]
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Number of points in a hand landmark set
pub const HAND_POINTS: usize = 21;

/// Normalized image point (0.0 to 1.0, y grows downwards)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Hand recognizer output for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandLandmarks {
    /// Top category from the recognizer's fixed vocabulary, or "None"
    pub category: String,
    /// Confidence score (0.0 to 1.0)
    pub score: f32,
    /// All 21 hand landmarks
    pub points: [Point2; HAND_POINTS],
}

impl HandLandmarks {
    pub fn new(category: impl Into<String>, score: f32, points: [Point2; HAND_POINTS]) -> Self {
        Self {
            category: category.into(),
            score,
            points,
        }
    }

    pub fn point(&self, idx: usize) -> Point2 {
        self.points[idx]
    }

    pub fn wrist(&self) -> Point2 {
        self.points[index::WRIST]
    }
}

/// Recognizer categories plus the ones this crate synthesizes
pub mod category {
    pub const NONE: &str = "None";
    pub const OPEN_PALM: &str = "Open_Palm";
    pub const CLOSED_FIST: &str = "Closed_Fist";
    pub const THUMB_UP: &str = "Thumb_Up";
    pub const THUMB_DOWN: &str = "Thumb_Down";
    pub const POINTING_UP: &str = "Pointing_Up";
    pub const VICTORY: &str = "Victory";
    pub const I_LOVE_YOU: &str = "ILoveYou";

    pub const POINTING_DOWN: &str = "Pointing_Down";
    pub const TWO_FINGERS_UP: &str = "Two_Fingers_Up";
    pub const TWO_FINGERS_LEFT: &str = "Two_Fingers_Left";
    pub const TWO_FINGERS_RIGHT: &str = "Two_Fingers_Right";
    pub const SWIPE_LEFT: &str = "Swipe_Left";
    pub const SWIPE_RIGHT: &str = "Swipe_Right";
    pub const PINCH: &str = "Pinch";

    pub const WAKE_UP: &str = "WAKE UP";
    pub const POSSIBLE_WAKE: &str = "Possible Wake";
    pub const SLEEPING: &str = "SLEEPING";
}
