//! Metadata enricher - allow-list validation and dispatcher lifecycle

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use contracts::{is_tag_permitted, ContractError, Emitter, EnrichConfig, Record};
use dispatcher::{
    Dispatch, DispatchMetrics, DispatchSnapshot, OrderedDispatcher, UnorderedDispatcher,
};
use metadata_client::MetadataClient;
use observability::{record_lookup, record_lookup_latency_ms};

use crate::error::EnricherError;
use crate::tags::lookup_tag;

/// Enriches records with instance metadata tags before passing them on
///
/// Construction validates the configured allow list against the permitted
/// tag set and fails fast on anything else. `start` spawns the dispatcher
/// for the configured release mode; records then flow through `enqueue`
/// until `stop` drains everything in flight.
pub struct MetadataEnricher<C: MetadataClient> {
    client: Arc<C>,
    allow_tags: Arc<BTreeSet<String>>,
    lookup_timeout: Duration,
    ordered: bool,
    max_parallel_calls: usize,
    max_queue_size: usize,
    dispatch: Option<Box<dyn Dispatch<Record>>>,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl<C: MetadataClient> fmt::Debug for MetadataEnricher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataEnricher")
            .field("allow_tags", &self.allow_tags)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("ordered", &self.ordered)
            .field("max_parallel_calls", &self.max_parallel_calls)
            .field("max_queue_size", &self.max_queue_size)
            .field("started", &self.dispatch.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: MetadataClient> MetadataEnricher<C> {
    /// Validate the allow list and build a stopped enricher
    ///
    /// # Errors
    ///
    /// Returns [`EnricherError::UnpermittedTag`] if the configuration asks
    /// for a tag outside the permitted set.
    pub fn new(client: C, config: &EnrichConfig) -> Result<Self, EnricherError> {
        for tag in &config.allow_tags {
            if !is_tag_permitted(tag) {
                return Err(EnricherError::unpermitted_tag(tag));
            }
        }

        Ok(Self {
            client: Arc::new(client),
            allow_tags: Arc::new(config.allow_set()),
            lookup_timeout: config.lookup_timeout(),
            ordered: config.ordered,
            max_parallel_calls: config.max_parallel_calls,
            max_queue_size: config.max_queue_size,
            dispatch: None,
            metrics: None,
        })
    }

    /// True between a successful `start` and the next `stop`
    pub fn is_started(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Spawn the dispatcher feeding enriched records to `emitter`
    pub fn start<E>(&mut self, emitter: E) -> Result<(), EnricherError>
    where
        E: Emitter<Record> + 'static,
    {
        if self.dispatch.is_some() {
            return Err(EnricherError::AlreadyStarted);
        }

        let client = Arc::clone(&self.client);
        let allow_tags = Arc::clone(&self.allow_tags);
        let lookup_timeout = self.lookup_timeout;
        let enrich = move |record: Record| {
            let client = Arc::clone(&client);
            let allow_tags = Arc::clone(&allow_tags);
            async move {
                let enriched =
                    enrich_record(client.as_ref(), &allow_tags, lookup_timeout, record).await;
                Ok::<Vec<Record>, ContractError>(vec![enriched])
            }
        };

        let (dispatch, metrics): (Box<dyn Dispatch<Record>>, Arc<DispatchMetrics>) =
            if self.ordered {
                let dispatcher = OrderedDispatcher::new(
                    emitter,
                    enrich,
                    self.max_queue_size,
                    self.max_parallel_calls,
                );
                let metrics = Arc::clone(dispatcher.metrics());
                (Box::new(dispatcher), metrics)
            } else {
                let dispatcher = UnorderedDispatcher::new(emitter, enrich, self.max_parallel_calls);
                let metrics = Arc::clone(dispatcher.metrics());
                (Box::new(dispatcher), metrics)
            };

        info!(
            ordered = self.ordered,
            max_parallel_calls = self.max_parallel_calls,
            max_queue_size = self.max_queue_size,
            allow_tags = ?self.allow_tags,
            "Enricher started"
        );

        self.dispatch = Some(dispatch);
        self.metrics = Some(metrics);
        Ok(())
    }

    /// Submit one record for enrichment
    ///
    /// Inherits the dispatcher's backpressure: suspends instead of
    /// dropping when the pipeline is saturated.
    pub async fn enqueue(&self, record: Record) -> Result<(), EnricherError> {
        let dispatch = self.dispatch.as_ref().ok_or(EnricherError::NotStarted)?;
        dispatch.enqueue(record).await?;
        Ok(())
    }

    /// Stop the dispatcher and wait for every in-flight record to release
    pub async fn stop(&mut self) -> Result<DispatchSnapshot, EnricherError> {
        let dispatch = self.dispatch.take().ok_or(EnricherError::StopBeforeStart)?;
        let metrics = self.metrics.take().ok_or(EnricherError::StopBeforeStart)?;

        dispatch.stop().await;
        let snapshot = metrics.snapshot();

        info!(
            enqueued = snapshot.enqueued,
            released = snapshot.released,
            failed = snapshot.failed,
            "Enricher stopped"
        );

        Ok(snapshot)
    }

    /// Snapshot of the dispatch counters, if started
    pub fn snapshot(&self) -> Option<DispatchSnapshot> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }
}

/// Look up every allowed tag and attach the values to the record
///
/// A failed lookup logs a warning and the record moves on without that
/// tag. One unreachable field must not hold the whole pipeline hostage.
async fn enrich_record<C: MetadataClient>(
    client: &C,
    allow_tags: &BTreeSet<String>,
    lookup_timeout: Duration,
    mut record: Record,
) -> Record {
    for field in allow_tags.iter() {
        let started = Instant::now();
        let outcome = lookup_tag(client, field, lookup_timeout).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(Some(value)) => {
                record_lookup(field, "ok");
                record_lookup_latency_ms(field, latency_ms);
                record.add_tag(field.clone(), value);
            }
            Ok(None) => {}
            Err(e) => {
                record_lookup(field, "error");
                record_lookup_latency_ms(field, latency_ms);
                warn!(field = %field, error = %e, "Metadata lookup failed, tag skipped");
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_client::{MockMetadataClient, MockMetadataConfig};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordCollector {
        records: Mutex<Vec<Record>>,
    }

    impl RecordCollector {
        fn records(&self) -> Vec<Record> {
            self.records.lock().unwrap().clone()
        }
    }

    impl Emitter<Record> for RecordCollector {
        fn emit(&self, record: Record) {
            self.records.lock().unwrap().push(record);
        }
    }

    fn enrich_config(allow_tags: &[&str]) -> EnrichConfig {
        EnrichConfig {
            allow_tags: allow_tags.iter().map(|t| t.to_string()).collect(),
            ..EnrichConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_unpermitted_tag() {
        let err = MetadataEnricher::new(
            MockMetadataClient::new(),
            &enrich_config(&["zone", "region"]),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "un-permitted metadata tag specified in configuration: region"
        );
    }

    #[tokio::test]
    async fn test_enqueue_before_start_rejected() {
        let enricher =
            MetadataEnricher::new(MockMetadataClient::new(), &enrich_config(&["zone"])).unwrap();

        let err = enricher.enqueue(Record::new("cpu")).await.unwrap_err();
        assert!(matches!(err, EnricherError::NotStarted));
    }

    #[tokio::test]
    async fn test_stop_before_start_rejected() {
        let mut enricher =
            MetadataEnricher::new(MockMetadataClient::new(), &enrich_config(&["zone"])).unwrap();

        let err = enricher.stop().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "trying to stop an enricher that was never started"
        );
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let mut enricher =
            MetadataEnricher::new(MockMetadataClient::new(), &enrich_config(&["zone"])).unwrap();

        enricher.start(Arc::new(RecordCollector::default())).unwrap();
        let err = enricher
            .start(Arc::new(RecordCollector::default()))
            .unwrap_err();
        assert!(matches!(err, EnricherError::AlreadyStarted));

        enricher.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_enriches_with_all_allowed_tags() {
        let collector = Arc::new(RecordCollector::default());
        let mut enricher = MetadataEnricher::new(
            MockMetadataClient::new(),
            &enrich_config(&["zone", "tags", "name", "hostname"]),
        )
        .unwrap();

        enricher.start(Arc::clone(&collector)).unwrap();
        enricher.enqueue(Record::new("cpu")).await.unwrap();
        let snapshot = enricher.stop().await.unwrap();

        assert_eq!(snapshot.released, 1);
        let records = collector.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag("zone"), Some("us-central1-a"));
        assert_eq!(records[0].tag("tags"), Some("telemetry,mock"));
        assert_eq!(records[0].tag("name"), Some("mock-instance"));
        assert_eq!(
            records[0].tag("hostname"),
            Some("mock-instance.c.mock-project.internal")
        );
    }

    #[tokio::test]
    async fn test_failed_lookup_propagates_record_without_tag() {
        let collector = Arc::new(RecordCollector::default());
        let client = MockMetadataClient::with_config(MockMetadataConfig {
            fail_fields: vec!["zone".into()],
            ..MockMetadataConfig::default()
        });
        let mut enricher =
            MetadataEnricher::new(client, &enrich_config(&["zone", "name"])).unwrap();

        enricher.start(Arc::clone(&collector)).unwrap();
        enricher.enqueue(Record::new("cpu")).await.unwrap();
        let snapshot = enricher.stop().await.unwrap();

        assert_eq!(snapshot.released, 1);
        let records = collector.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].has_tag("zone"));
        assert_eq!(records[0].tag("name"), Some("mock-instance"));
    }

    #[tokio::test]
    async fn test_ordered_mode_releases_in_enqueue_order() {
        let collector = Arc::new(RecordCollector::default());
        let config = EnrichConfig {
            allow_tags: vec!["name".into()],
            ordered: true,
            max_parallel_calls: 4,
            max_queue_size: 16,
            ..EnrichConfig::default()
        };
        let client = MockMetadataClient::with_config(MockMetadataConfig {
            delay: Some(Duration::from_millis(2)),
            ..MockMetadataConfig::default()
        });
        let mut enricher = MetadataEnricher::new(client, &config).unwrap();

        enricher.start(Arc::clone(&collector)).unwrap();
        for i in 0..10 {
            enricher
                .enqueue(Record::new(format!("record-{i}")))
                .await
                .unwrap();
        }
        enricher.stop().await.unwrap();

        let names: Vec<String> = collector
            .records()
            .iter()
            .map(|r| r.name.clone())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("record-{i}")).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let collector = Arc::new(RecordCollector::default());
        let mut enricher =
            MetadataEnricher::new(MockMetadataClient::new(), &enrich_config(&["name"])).unwrap();

        enricher.start(Arc::clone(&collector)).unwrap();
        enricher.enqueue(Record::new("first")).await.unwrap();
        enricher.stop().await.unwrap();
        assert!(!enricher.is_started());

        enricher.start(Arc::clone(&collector)).unwrap();
        enricher.enqueue(Record::new("second")).await.unwrap();
        enricher.stop().await.unwrap();

        assert_eq!(collector.records().len(), 2);
    }
}
