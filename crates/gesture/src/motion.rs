//! Wrist motion history: swipe and static-hand detection

use crate::landmarks::category;
use ring_buffer::{RingBuffer, Sample};
use std::time::Instant;

/// Hand history length
pub const HISTORY_SIZE: usize = 10;
/// Samples required before motion is judged
pub const MIN_SAMPLES: usize = 5;

/// Bounded (time, wrist-x) history
#[derive(Debug)]
pub struct MotionTracker {
    history: RingBuffer<Sample<f32>>,
}

impl MotionTracker {
    pub fn new() -> Self {
        Self {
            history: RingBuffer::new(HISTORY_SIZE),
        }
    }

    pub fn record(&mut self, now: Instant, wrist_x: f32) {
        self.history.push(Sample::new(now, wrist_x));
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn endpoints(&self) -> Option<(&Sample<f32>, &Sample<f32>)> {
        if self.history.len() < MIN_SAMPLES {
            return None;
        }
        Some((self.history.front()?, self.history.back()?))
    }

    /// Horizontal displacement across the whole history is below `max_dx`
    pub fn is_static(&self, max_dx: f32) -> bool {
        self.endpoints()
            .map_or(false, |(first, last)| (last.value - first.value).abs() < max_dx)
    }

    /// Wrist x velocity in normalized units per second
    pub fn velocity(&self) -> Option<f32> {
        let (first, last) = self.endpoints()?;
        let elapsed = self.history.span_secs() as f32;
        if elapsed > 0.0 {
            Some((last.value - first.value) / elapsed)
        } else {
            Some(0.0)
        }
    }

    /// Swipe category when the wrist moves faster than `min_velocity`.
    ///
    /// Positive image-x velocity is reported as Swipe_Right.
    pub fn swipe(&self, min_velocity: f32) -> Option<&'static str> {
        let v = self.velocity()?;
        if v.abs() <= min_velocity {
            None
        } else if v > 0.0 {
            Some(category::SWIPE_RIGHT)
        } else {
            Some(category::SWIPE_LEFT)
        }
    }
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self::new()
    }
}
