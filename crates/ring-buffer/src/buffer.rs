//! Ring Buffer Implementation

use std::collections::VecDeque;

/// Default buffer capacity (150 samples = ~5 s at 30 Hz)
pub const DEFAULT_CAPACITY: usize = 150;

/// Fixed-capacity FIFO buffer.
///
/// Owned by exactly one component and mutated only from the processing
/// context, so no interior synchronisation is needed.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Stored entries, oldest at the front
    storage: VecDeque<T>,
    /// Maximum number of entries
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            storage: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an entry, returning the evicted oldest entry if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.storage.len() >= self.capacity {
            self.storage.pop_front()
        } else {
            None
        };
        self.storage.push_back(item);
        evicted
    }

    /// Get the number of entries currently in the buffer
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest entry
    pub fn front(&self) -> Option<&T> {
        self.storage.front()
    }

    /// Newest entry
    pub fn back(&self) -> Option<&T> {
        self.storage.back()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.storage.iter()
    }
}
