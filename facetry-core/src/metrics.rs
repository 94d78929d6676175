//! Loader metrics
//!
//! Counters for cache effectiveness and introspection cost of a
//! [`SpecificationLoader`](crate::loader::SpecificationLoader).

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct LoaderMetrics {
    /// Lookups answered from the cache
    pub hit_count: AtomicU64,

    /// Lookups that had to introspect
    pub miss_count: AtomicU64,

    /// Completed introspections
    pub introspection_count: AtomicU64,

    /// Total time spent introspecting (nanoseconds)
    pub total_introspection_time_ns: AtomicU64,

    /// Factory errors and panics recorded during introspection
    pub factory_failure_count: AtomicU64,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hit_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.miss_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_introspection(&self, duration: Duration) {
        self.introspection_count.fetch_add(1, Ordering::Relaxed);
        self.total_introspection_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_factory_failure(&self) {
        self.factory_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    pub fn reset(&self) {
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
        self.introspection_count.store(0, Ordering::Relaxed);
        self.total_introspection_time_ns.store(0, Ordering::Relaxed);
        self.factory_failure_count.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            introspections: self.introspection_count.load(Ordering::Relaxed),
            total_time_ns: self.total_introspection_time_ns.load(Ordering::Relaxed),
            factory_failures: self.factory_failure_count.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the loader counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub introspections: u64,
    pub total_time_ns: u64,
    pub factory_failures: u64,
}

impl MetricsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn avg_introspection_time(&self) -> Duration {
        if self.introspections == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_time_ns / self.introspections)
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "  Hits: {} | Misses: {} | Hit Rate: {:.1}%",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )?;
        writeln!(
            f,
            "  Introspections: {} | Factory Failures: {}",
            self.introspections, self.factory_failures
        )?;
        writeln!(
            f,
            "  Avg Time: {:.2}ms | Total Time: {:.2}ms",
            self.avg_introspection_time().as_secs_f64() * 1000.0,
            Duration::from_nanos(self.total_time_ns).as_secs_f64() * 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_basic() {
        let metrics = LoaderMetrics::new();

        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();

        assert_eq!(metrics.hit_count.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.miss_count.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.hit_rate(), 2.0 / 3.0);
    }

    #[test]
    fn test_introspection_time() {
        let metrics = LoaderMetrics::new();

        metrics.record_introspection(Duration::from_millis(10));
        metrics.record_introspection(Duration::from_millis(20));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.introspections, 2);
        assert_eq!(snapshot.avg_introspection_time(), Duration::from_millis(15));
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = LoaderMetrics::new();

        metrics.record_hit();
        metrics.record_factory_failure();
        metrics.reset();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.factory_failures, 0);
        assert_eq!(snapshot.hit_rate(), 0.0);
    }
}
