//! # Moving average filter
//!
//! Sliding window average of the lane midpoint estimates.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mean of the last `capacity` samples.
///
/// The sum is kept as a running total so adding a sample is O(1). The total is recomputed from
/// the window once every `capacity` insertions to stop floating point drift building up, and on
/// every insertion while it is not finite.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    samples: VecDeque<f64>,
    capacity: usize,
    sum: f64,
    since_resync: usize
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MovingAverage {
    /// Create an empty filter. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
            since_resync: 0
        }
    }

    /// Push a sample into the window, evicting the oldest one if the window is full.
    pub fn add_sample(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= oldest;
            }
        }

        self.samples.push_back(sample);
        self.sum += sample;

        // A non-finite sample leaving the window cannot be subtracted back out (inf - inf), so
        // while the total is non-finite it is rebuilt from the window on every sample.
        self.since_resync += 1;
        if self.since_resync >= self.capacity || !self.sum.is_finite() {
            self.sum = self.samples.iter().sum();
            self.since_resync = 0;
        }
    }

    /// Mean of the samples currently in the window.
    ///
    /// Before the window fills this is the mean of the samples seen so far, and `0.0` if there
    /// are none.
    pub fn get_result(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        }
        else {
            self.sum / self.samples.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
