//! Write performance aggregation

/// Latency samples collected from `get_write_perf`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerfStats {
    samples: Vec<f64>,
}

/// Aggregate of collected samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSummary {
    /// Number of samples
    pub samples: usize,
    /// Arithmetic mean, in the board's unit (microseconds)
    pub mean: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
}

impl PerfStats {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append samples
    pub fn extend(&mut self, samples: impl IntoIterator<Item = f64>) {
        self.samples.extend(samples);
    }

    /// All samples in collection order
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Mean and range, or `None` when nothing was collected
    pub fn summary(&self) -> Option<PerfSummary> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().sum();
        let min = self.samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(PerfSummary {
            samples: self.samples.len(),
            mean: sum / self.samples.len() as f64,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        let mut stats = PerfStats::new();
        stats.extend([1000.0, 1400.0]);
        stats.extend([1600.0]);
        let summary = stats.summary().unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.mean, 1333.3333333333333);
        assert_eq!(summary.min, 1000.0);
        assert_eq!(summary.max, 1600.0);
    }

    #[test]
    fn test_empty_has_no_summary() {
        let mut stats = PerfStats::new();
        stats.extend(Vec::new());
        assert_eq!(stats.summary(), None);
    }
}
