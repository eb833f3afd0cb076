//! Running statistics for evaluation reports.

use serde::{Deserialize, Serialize};

/// Running sum and sum of squares of a sample.
///
/// The standard deviation is the population one, `sqrt(E[x^2] - mean^2)`.
/// An empty sample yields NaN rather than an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMoments {
    pub count: u64,
    pub sum: f64,
    pub sum_squares: f64,
}

impl RunningMoments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_squares += value * value;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let variance = self.sum_squares / self.count as f64 - mean * mean;
        // Rounding can leave a tiny negative variance for identical samples.
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }
}

/// Mean and standard deviation of a finished sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningMoments> for Summary {
    fn from(moments: &RunningMoments) -> Self {
        Self {
            mean: moments.mean(),
            std_dev: moments.std_dev(),
        }
    }
}
