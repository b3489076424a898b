//! Running descriptive statistics over a stream of samples.

use anyhow::{bail, Result};

/// Online min/mean/std/max accumulator.
///
/// Mean and variance use Welford's algorithm, so every update is O(1) and
/// numerically stable regardless of sample count. Standard deviation is the
/// population form (divide by `n`): a single-sample group reports `std = 0.0`
/// instead of an undefined value.
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Reset to the empty state for reuse by the next group.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn add_value(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> Result<f64> {
        self.require_samples()?;
        Ok(self.min)
    }

    pub fn mean(&self) -> Result<f64> {
        self.require_samples()?;
        Ok(self.mean)
    }

    pub fn std(&self) -> Result<f64> {
        self.require_samples()?;
        Ok((self.m2 / self.count as f64).sqrt())
    }

    pub fn max(&self) -> Result<f64> {
        self.require_samples()?;
        Ok(self.max)
    }

    fn require_samples(&self) -> Result<()> {
        if self.count == 0 {
            bail!("statistics requested before any sample was accumulated");
        }
        Ok(())
    }
}
