//! Bounded Sample History
//!
//! Provides a fixed-capacity FIFO ring buffer used for the hand position
//! history (swipe and static-hand detection) and the rPPG signal window.
//! The oldest entry is evicted on overflow; the buffer never grows past its
//! capacity.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};

use std::time::Instant;

/// A value tagged with the instant it was observed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub timestamp: Instant,
    pub value: T,
}

impl<T> Sample<T> {
    pub fn new(timestamp: Instant, value: T) -> Self {
        Self { timestamp, value }
    }
}

impl<T> RingBuffer<Sample<T>> {
    /// Seconds elapsed between the oldest and newest sample
    pub fn span_secs(&self) -> f64 {
        match (self.front(), self.back()) {
            (Some(first), Some(last)) => last
                .timestamp
                .saturating_duration_since(first.timestamp)
                .as_secs_f64(),
            _ => 0.0,
        }
    }
}
