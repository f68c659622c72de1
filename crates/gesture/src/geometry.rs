//! Geometric category overrides
//!
//! The recognizer's own vocabulary has no directional gestures; these are
//! derived from finger vectors normalized by palm size.

use crate::landmarks::{category, index, HandLandmarks, Point2};
use tracing::debug;

/// Finger must be at least this many palm lengths long to count as extended
const EXTENSION_RATIO: f32 = 1.0;
/// Minimum index displacement, in palm lengths, for a direction
const DIRECTION_RATIO: f32 = 0.4;
/// Index tip must hang this far below its base for Pointing_Down
const POINTING_DOWN_MARGIN: f32 = 0.05;

/// Wrist to index MCP distance
pub fn palm_size(hand: &HandLandmarks) -> f32 {
    hand.wrist().distance(&hand.point(index::INDEX_FINGER_MCP))
}

/// Tip above its MCP in image coordinates
fn is_up(hand: &HandLandmarks, tip: usize, mcp: usize) -> bool {
    hand.point(tip).y < hand.point(mcp).y
}

fn finger_vector(hand: &HandLandmarks, tip: usize, mcp: usize) -> Point2 {
    let t = hand.point(tip);
    let m = hand.point(mcp);
    Point2::new(t.x - m.x, t.y - m.y)
}

/// Directional override for the hand, if any applies.
///
/// A closed fist with a raised thumb never matches: its folded fingers are
/// shorter than the extension threshold.
pub fn directional_override(hand: &HandLandmarks) -> Option<&'static str> {
    let palm = palm_size(hand);
    let extension = palm * EXTENSION_RATIO;

    let idx = finger_vector(hand, index::INDEX_FINGER_TIP, index::INDEX_FINGER_MCP);
    let mid = finger_vector(hand, index::MIDDLE_FINGER_TIP, index::MIDDLE_FINGER_MCP);
    let idx_len = Point2::default().distance(&idx);
    let mid_len = Point2::default().distance(&mid);

    let index_extended = idx_len > extension;
    let middle_extended = mid_len > extension;
    let ring_up = is_up(hand, index::RING_FINGER_TIP, index::RING_FINGER_MCP);
    let pinky_up = is_up(hand, index::PINKY_TIP, index::PINKY_MCP);
    let middle_up = is_up(hand, index::MIDDLE_FINGER_TIP, index::MIDDLE_FINGER_MCP);

    let found = if index_extended && middle_extended && !ring_up && !pinky_up {
        let threshold = palm * DIRECTION_RATIO;
        if idx.x.abs() > idx.y.abs() {
            if idx.x > threshold {
                Some(category::TWO_FINGERS_LEFT)
            } else if idx.x < -threshold {
                Some(category::TWO_FINGERS_RIGHT)
            } else {
                None
            }
        } else if idx.y < -threshold {
            Some(category::TWO_FINGERS_UP)
        } else {
            None
        }
    } else {
        let tip = hand.point(index::INDEX_FINGER_TIP);
        let mcp = hand.point(index::INDEX_FINGER_MCP);
        if tip.y > mcp.y + POINTING_DOWN_MARGIN && !middle_up && index_extended {
            Some(category::POINTING_DOWN)
        } else {
            None
        }
    };

    if let Some(name) = found {
        debug!("Override: {}", name);
    }
    found
}

/// Thumb tip to index tip distance
pub fn pinch_distance(hand: &HandLandmarks) -> f32 {
    hand.point(index::THUMB_TIP)
        .distance(&hand.point(index::INDEX_FINGER_TIP))
}
