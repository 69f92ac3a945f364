use std::time::{Duration, Instant};

/// Runs `f` and returns its value together with how long it took.
pub fn measure<T, F: FnOnce() -> T>(f: F) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

pub fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Pipeline time accumulated over one run. Only timed items are recorded;
/// warm-up items and I/O never reach it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunAccumulator {
    total: Duration,
    count: usize,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.count += 1;
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` until at least one item has been recorded.
    pub fn mean(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        Some(match u32::try_from(self.count) {
            Ok(count) => self.total / count,
            Err(_) => self.total.div_f64(self.count as f64),
        })
    }

    pub fn mean_millis(&self) -> Option<f64> {
        self.mean().map(millis)
    }

    /// Items per second of pipeline time; `None` when nothing was timed.
    pub fn mean_fps(&self) -> Option<f64> {
        let seconds = self.total.as_secs_f64();
        if self.count == 0 || seconds == 0.0 {
            return None;
        }
        Some(self.count as f64 / seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_reports_no_data() {
        let acc = RunAccumulator::new();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.mean_millis(), None);
        assert_eq!(acc.mean_fps(), None);
    }

    #[test]
    fn mean_over_recorded_items() {
        let mut acc = RunAccumulator::new();
        acc.record(Duration::from_millis(10));
        acc.record(Duration::from_millis(30));
        assert_eq!(acc.count(), 2);
        assert_eq!(acc.total(), Duration::from_millis(40));
        assert_eq!(acc.mean(), Some(Duration::from_millis(20)));
        let fps = acc.mean_fps().unwrap();
        assert!((fps - 50.0).abs() < 1e-9);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn mean_survives_counts_beyond_u32() {
        let count = u32::MAX as usize + 1;
        let acc = RunAccumulator {
            total: Duration::from_secs(count as u64 * 2),
            count,
        };
        let mean = acc.mean().unwrap();
        assert!((mean.as_secs_f64() - 2.0).abs() < 1e-6, "{mean:?}");
    }

    #[test]
    fn measure_returns_value() {
        let (value, elapsed) = measure(|| 6 * 7);
        assert_eq!(value, 42);
        assert!(elapsed < Duration::from_secs(1));
    }
}
