//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::{RunningStats, StatsSummary};
use router::SinkSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total records read from the source
    pub records_ingested: u64,

    /// Total records released by the dispatcher
    pub records_released: u64,

    /// Total records handed to the sinks
    pub records_emitted: u64,

    /// Total enrichment calls that failed outright
    pub enrich_failures: u64,

    /// Input lines that failed to parse
    pub records_malformed: u64,

    /// Peak reorder buffer occupancy over the run
    pub buffer_peak: usize,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of configured sinks
    pub active_sinks: usize,

    /// Enqueue wait statistics in milliseconds
    pub enqueue_wait: RunningStats,

    /// Final per-sink metrics
    pub sinks: Vec<(String, SinkSnapshot)>,
}

impl PipelineStats {
    /// Records ingested per second
    pub fn records_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.records_ingested as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of emitted records dropped across all sinks, as a percentage
    #[allow(dead_code)]
    pub fn drop_rate(&self) -> f64 {
        let dropped: u64 = self.sinks.iter().map(|(_, s)| s.dropped).sum();
        if self.records_emitted > 0 {
            (dropped as f64 / self.records_emitted as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Records ingested: {}", self.records_ingested);
        println!("   ├─ Records released: {}", self.records_released);
        println!("   ├─ Records emitted: {}", self.records_emitted);
        println!("   ├─ Failed enrichments: {}", self.enrich_failures);
        println!("   ├─ Malformed input lines: {}", self.records_malformed);
        println!("   ├─ Peak reorder buffer: {}", self.buffer_peak);
        println!("   ├─ Throughput: {:.2} records/s", self.records_per_sec());
        println!("   └─ Active sinks: {}", self.active_sinks);

        println!("\n⏱  Enqueue Wait (ms)");
        println!("   └─ {}", StatsSummary::from(&self.enqueue_wait));

        if !self.sinks.is_empty() {
            println!("\n📤 Sink Outcomes");
            for (i, (name, snapshot)) in self.sinks.iter().enumerate() {
                let is_last = i == self.sinks.len() - 1;
                let prefix = if is_last { "└─" } else { "├─" };
                println!(
                    "   {} {}: written={}, failed={}, dropped={}",
                    prefix, name, snapshot.written, snapshot.failed, snapshot.dropped
                );
            }
        }

        println!();
    }
}
