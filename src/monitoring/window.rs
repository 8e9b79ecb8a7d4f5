//! Bounded rolling window and percentile computation

use std::collections::VecDeque;

/// Fixed-capacity FIFO sample window
///
/// Append-then-trim semantics: once capacity is exceeded the oldest entries
/// are discarded. Owners guard it with their own lock; reads snapshot.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RollingWindow<T> {
    /// Create a window retaining at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be non-zero");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if the window is full
    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Declared capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy out the retained samples in append order
    pub fn snapshot(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }

    /// The most recent `n` samples in append order
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).cloned().collect()
    }

    /// Mutable access to the newest sample
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.samples.back_mut()
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Percentile of a sample set using the index `ceil(p/100 * n) - 1`
///
/// The exact tie-break of the original reporting pipeline; consumers depend
/// on it for compatibility. Returns 0.0 for an empty set.
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let index = ((p / 100.0) * n as f64).ceil() as usize;
    let index = index.clamp(1, n) - 1;
    sorted[index]
}

/// Arithmetic mean, 0.0 for an empty set
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut window = RollingWindow::new(1000);
        for i in 0..5000 {
            window.push(i as f64);
        }
        assert_eq!(window.len(), 1000);
        // The last 1000 appended values are exactly what's retained
        let snapshot = window.snapshot();
        assert_eq!(snapshot[0], 4000.0);
        assert_eq!(snapshot[999], 4999.0);
    }

    #[test]
    fn test_window_preserves_append_order() {
        let mut window = RollingWindow::new(3);
        for v in [1, 2, 3, 4] {
            window.push(v);
        }
        assert_eq!(window.snapshot(), vec![2, 3, 4]);
        assert_eq!(window.tail(2), vec![3, 4]);
        assert_eq!(window.tail(10), vec![2, 3, 4]);
    }

    #[test]
    fn test_percentile_exact_tie_break() {
        let samples: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        // ceil(50/100 * 100) - 1 = index 49 -> value 50
        assert_eq!(percentile(&samples, 50.0), 50.0);
        assert_eq!(percentile(&samples, 95.0), 95.0);
        assert_eq!(percentile(&samples, 99.0), 99.0);
        assert_eq!(percentile(&samples, 100.0), 100.0);
    }

    #[test]
    fn test_percentile_ordering_invariant() {
        let cases: Vec<Vec<f64>> = vec![
            vec![42.0],
            vec![5.0, 5.0, 5.0],
            vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0],
            (0..1000).map(|v| (v % 37) as f64).collect(),
        ];
        for samples in cases {
            let p50 = percentile(&samples, 50.0);
            let p95 = percentile(&samples, 95.0);
            let p99 = percentile(&samples, 99.0);
            assert!(p50 <= p95, "p50 {} > p95 {}", p50, p95);
            assert!(p95 <= p99, "p95 {} > p99 {}", p95, p99);
        }
    }

    #[test]
    fn test_percentile_empty_and_single() {
        assert_eq!(percentile(&[], 95.0), 0.0);
        assert_eq!(percentile(&[7.0], 50.0), 7.0);
        assert_eq!(percentile(&[7.0], 99.0), 7.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }
}
