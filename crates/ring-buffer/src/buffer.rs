//! Rolling Window Implementation

use crate::BufferError;

/// Trailing window holding the most recent `capacity` samples.
///
/// Pushing into a full window overwrites the oldest sample. Statistics are
/// computed over however many samples are present, so a fresh window yields
/// partial-window results instead of failing.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Pre-allocated storage
    storage: Box<[f64]>,
    /// Next write position
    head: usize,
    /// Number of valid samples
    len: usize,
}

impl RollingWindow {
    /// Create a window with the given capacity
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            storage: vec![0.0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        })
    }

    /// Push a sample, evicting the oldest when full
    pub fn push(&mut self, value: f64) {
        let capacity = self.storage.len();
        self.storage[self.head] = value;
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Number of samples currently in the window
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate samples oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let capacity = self.storage.len();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.storage[(start + i) % capacity])
    }

    /// Most recent sample
    pub fn last(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        let capacity = self.storage.len();
        Some(self.storage[(self.head + capacity - 1) % capacity])
    }

    /// Mean of the samples in the window, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.len as f64)
    }

    /// Drop all samples, e.g. when moving to the next device
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
