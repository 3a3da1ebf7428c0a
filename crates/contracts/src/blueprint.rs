//! PipelineBlueprint - Config Loader output
//!
//! Describes the complete pipeline configuration: record source, enrichment
//! policy, output routing. Every section is optional; an empty document is a
//! valid configuration running with defaults.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Metadata fields the enricher knows how to resolve
pub const PERMITTED_TAGS: [&str; 4] = ["zone", "tags", "name", "hostname"];

/// Whether a configured allow-list entry names a resolvable field
pub fn is_tag_permitted(tag: &str) -> bool {
    PERMITTED_TAGS.contains(&tag)
}

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Record source
    #[serde(default)]
    pub source: SourceConfig,

    /// Enrichment policy
    #[serde(default)]
    pub enrich: EnrichConfig,

    /// Output routing configuration
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind
    #[serde(default)]
    pub kind: SourceKind,

    /// Input path (file kind only)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Records to generate (synthetic kind only)
    #[serde(default = "default_synthetic_count")]
    pub count: u64,

    /// Interval between generated records in ms (synthetic kind only)
    #[serde(default = "default_synthetic_interval_ms")]
    pub interval_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            path: None,
            count: default_synthetic_count(),
            interval_ms: default_synthetic_interval_ms(),
        }
    }
}

fn default_synthetic_count() -> u64 {
    100
}

fn default_synthetic_interval_ms() -> u64 {
    10
}

/// Source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// NDJSON records on standard input
    #[default]
    Stdin,
    /// NDJSON records from a file
    File,
    /// Generated records, no external input
    Synthetic,
}

/// Enrichment policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Metadata fields to attach as tags; each must be a permitted field
    #[serde(default)]
    pub allow_tags: Vec<String>,

    /// Per-lookup timeout in milliseconds
    #[serde(default = "default_lookup_timeout_ms")]
    pub timeout_ms: u64,

    /// Release records in arrival order instead of completion order
    #[serde(default)]
    pub ordered: bool,

    /// Simultaneous metadata lookups permitted
    #[serde(default = "default_max_parallel_calls")]
    pub max_parallel_calls: usize,

    /// Reorder buffer bound (ordered mode only)
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            allow_tags: Vec::new(),
            timeout_ms: default_lookup_timeout_ms(),
            ordered: false,
            max_parallel_calls: default_max_parallel_calls(),
            max_queue_size: default_max_queue_size(),
        }
    }
}

fn default_lookup_timeout_ms() -> u64 {
    10_000
}

fn default_max_parallel_calls() -> usize {
    10
}

fn default_max_queue_size() -> usize {
    10_000
}

impl EnrichConfig {
    /// Per-lookup timeout as a [`Duration`]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Deduplicated allow-list in a stable order
    pub fn allow_set(&self) -> BTreeSet<String> {
        self.allow_tags.iter().cloned().collect()
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink kind
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Kind-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// File output (NDJSON)
    File,
    /// Network output (UDP)
    Network,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_a_valid_blueprint() {
        let blueprint: PipelineBlueprint = serde_json::from_str("{}").unwrap();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert_eq!(blueprint.source.kind, SourceKind::Stdin);
        assert!(blueprint.enrich.allow_tags.is_empty());
        assert!(blueprint.sinks.is_empty());
    }

    #[test]
    fn enrich_defaults_match_documented_values() {
        let enrich = EnrichConfig::default();
        assert_eq!(enrich.timeout_ms, 10_000);
        assert_eq!(enrich.max_parallel_calls, 10);
        assert_eq!(enrich.max_queue_size, 10_000);
        assert!(!enrich.ordered);
        assert_eq!(enrich.lookup_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn allow_set_deduplicates() {
        let enrich = EnrichConfig {
            allow_tags: vec!["zone".into(), "tags".into(), "zone".into()],
            ..EnrichConfig::default()
        };
        let set = enrich.allow_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains("zone"));
    }

    #[test]
    fn permitted_tags_cover_the_documented_fields() {
        for tag in ["zone", "tags", "name", "hostname"] {
            assert!(is_tag_permitted(tag));
        }
        assert!(!is_tag_permitted("region"));
        assert!(!is_tag_permitted(""));
    }

    #[test]
    fn sink_config_defaults_queue_capacity() {
        let sink: SinkConfig =
            serde_json::from_str(r#"{"name":"out","sink_type":"log"}"#).unwrap();
        assert_eq!(sink.queue_capacity, 100);
        assert!(sink.params.is_empty());
    }
}
