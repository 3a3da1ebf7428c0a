//! Pipeline metrics helpers.
//!
//! Thin wrappers over the `metrics` facade plus an online statistics
//! accumulator for run summaries. All exported series carry the
//! `metric_tagger_` prefix so they group together in Prometheus.

use metrics::{counter, gauge, histogram};

/// Record one ingested record, labelled by source kind
///
/// Call this once per record as it enters the pipeline.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_record_ingested;
///
/// for record in source {
///     record_record_ingested("stdin");
///     enricher.enqueue(record).await?;
/// }
/// ```
pub fn record_record_ingested(source: &str) {
    counter!(
        "metric_tagger_records_ingested_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record how long one enqueue call waited, in milliseconds
///
/// The wait grows when the dispatcher is saturated and enqueue blocks
/// on a free slot.
pub fn record_enqueue_wait_ms(wait_ms: f64) {
    histogram!("metric_tagger_enqueue_wait_ms").record(wait_ms);
}

/// Record dispatcher depth gauges
pub fn record_dispatch_depth(queue_len: usize, buffer_len: usize) {
    gauge!("metric_tagger_dispatch_queue_len").set(queue_len as f64);
    gauge!("metric_tagger_dispatch_buffer_len").set(buffer_len as f64);
}

/// Record the outcome of one metadata lookup
///
/// Status is `"ok"` or `"error"`.
pub fn record_lookup(field: &str, status: &str) {
    counter!(
        "metric_tagger_lookups_total",
        "field" => field.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record how long one metadata lookup took, in milliseconds
pub fn record_lookup_latency_ms(field: &str, latency_ms: f64) {
    histogram!(
        "metric_tagger_lookup_latency_ms",
        "field" => field.to_string()
    )
    .record(latency_ms);
}

/// Record one record written by a sink
pub fn record_sink_write(sink: &str) {
    counter!(
        "metric_tagger_sink_writes_total",
        "sink" => sink.to_string()
    )
    .increment(1);
}

/// Record one record dropped at a full sink queue
pub fn record_sink_drop(sink: &str) {
    counter!(
        "metric_tagger_sink_drops_total",
        "sink" => sink.to_string()
    )
    .increment(1);
}

/// Point-in-time summary of a [`RunningStats`]
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics accumulator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Fold one observation into the accumulator
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Smallest observation
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest observation
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_running_stats_single_value() {
        let mut stats = RunningStats::default();
        stats.push(42.0);

        assert_eq!(stats.count(), 1);
        assert!((stats.mean() - 42.0).abs() < 1e-10);
        assert_eq!(stats.variance(), 0.0);
    }

    #[test]
    fn test_running_stats_empty_mean() {
        let stats = RunningStats::default();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.mean(), 0.0);
    }

    #[test]
    fn test_stats_summary_display() {
        let mut stats = RunningStats::default();
        stats.push(10.0);
        stats.push(20.0);

        let summary = StatsSummary::from(&stats);
        let output = format!("{}", summary);
        assert!(output.contains("min=10.000"));
        assert!(output.contains("max=20.000"));
        assert!(output.contains("mean=15.000"));
        assert!(output.contains("n=2"));
    }

    #[test]
    fn test_stats_summary_display_empty() {
        let summary = StatsSummary::default();
        assert_eq!(format!("{}", summary), "N/A");
    }
}
