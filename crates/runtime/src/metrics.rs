// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference profiling metrics.
//!
//! [`InferenceMetrics`] aggregates per-call latency for one runtime. Calls
//! are only recorded when `benchmark.enable_profile` is set, and the first
//! `benchmark.warmup` calls are skipped.

use std::time::Duration;

/// Aggregate latency for a runtime's inference calls.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct InferenceMetrics {
    /// Number of recorded calls.
    pub runs: usize,
    /// Calls skipped as warmup.
    pub warmup_runs: usize,
    /// Sum of recorded call durations.
    pub total_duration: Duration,
    pub min_duration: Option<Duration>,
    pub max_duration: Duration,
    pub last_duration: Duration,
}

impl InferenceMetrics {
    /// Creates an empty metrics container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one inference call.
    pub fn record(&mut self, elapsed: Duration) {
        self.runs += 1;
        self.total_duration += elapsed;
        self.last_duration = elapsed;
        self.max_duration = self.max_duration.max(elapsed);
        self.min_duration = Some(match self.min_duration {
            Some(min) => min.min(elapsed),
            None => elapsed,
        });
    }

    /// Counts a call that was excluded as warmup.
    pub fn record_warmup(&mut self) {
        self.warmup_runs += 1;
    }

    /// Clears all recorded calls.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mean latency over recorded calls.
    pub fn mean_duration(&self) -> Duration {
        if self.runs == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_duration.as_nanos() / self.runs as u128;
        let secs = u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX);
        Duration::new(secs, (nanos % 1_000_000_000) as u32)
    }

    /// Returns calls per second throughput.
    pub fn runs_per_second(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs <= 0.0 || self.runs == 0 {
            return 0.0;
        }
        self.runs as f64 / secs
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        format!(
            "Inference: {} runs ({} warmup skipped), mean {:.3}ms, \
             min {:.3}ms, max {:.3}ms, {:.1} runs/s",
            self.runs,
            self.warmup_runs,
            ms(self.mean_duration()),
            ms(self.min_duration.unwrap_or_default()),
            ms(self.max_duration),
            self.runs_per_second(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics() {
        let m = InferenceMetrics::new();
        assert_eq!(m.runs_per_second(), 0.0);
        assert_eq!(m.mean_duration(), Duration::ZERO);
        assert!(m.min_duration.is_none());
    }

    #[test]
    fn test_record() {
        let mut m = InferenceMetrics::new();
        m.record(Duration::from_millis(10));
        m.record(Duration::from_millis(30));
        m.record(Duration::from_millis(20));

        assert_eq!(m.runs, 3);
        assert_eq!(m.total_duration, Duration::from_millis(60));
        assert_eq!(m.mean_duration(), Duration::from_millis(20));
        assert_eq!(m.min_duration, Some(Duration::from_millis(10)));
        assert_eq!(m.max_duration, Duration::from_millis(30));
        assert_eq!(m.last_duration, Duration::from_millis(20));
        assert!((m.runs_per_second() - 50.0).abs() < 0.01);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_mean_beyond_u32_runs() {
        let runs = 1usize << 33;
        let m = InferenceMetrics {
            runs,
            total_duration: Duration::from_secs(runs as u64),
            ..Default::default()
        };
        assert_eq!(m.mean_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_summary_format() {
        let mut m = InferenceMetrics::new();
        m.record_warmup();
        m.record(Duration::from_millis(5));
        let s = m.summary();
        assert!(s.contains("Inference:"));
        assert!(s.contains("1 runs"));
        assert!(s.contains("1 warmup skipped"));
    }

    #[test]
    fn test_reset() {
        let mut m = InferenceMetrics::new();
        m.record(Duration::from_millis(5));
        m.reset();
        assert_eq!(m.runs, 0);
        assert_eq!(m.total_duration, Duration::ZERO);
    }
}
