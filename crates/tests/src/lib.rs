//! # Integration Tests
//!
//! End-to-end tests wiring the full pipeline together.
//!
//! Covers:
//! - Contract snapshot checks
//! - Config file to running pipeline wiring
//! - Release ordering and drain guarantees under concurrent enrichment

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::Record;
    use dispatcher::DispatchSnapshot;
    use enricher::MetadataEnricher;
    use metadata_client::{MockMetadataClient, MockMetadataConfig};
    use router::RecordRouter;

    fn file_pipeline_config(out_path: &Path, ordered: bool) -> String {
        format!(
            r#"
[enrich]
allow_tags = ["zone", "name"]
timeout_ms = 2000
ordered = {ordered}
max_parallel_calls = 4
max_queue_size = 16

[[sinks]]
name = "archive"
sink_type = "file"
queue_capacity = 100

[sinks.params]
path = "{}"
"#,
            out_path.display()
        )
    }

    fn delayed_client(delay_ms: u64) -> MockMetadataClient {
        MockMetadataClient::with_config(MockMetadataConfig {
            delay: Some(Duration::from_millis(delay_ms)),
            ..MockMetadataConfig::default()
        })
    }

    /// Drive records through config -> router -> enricher -> file sink,
    /// then read the NDJSON output back.
    async fn run_file_pipeline(
        config_toml: &str,
        out_path: &Path,
        client: MockMetadataClient,
        records: Vec<Record>,
    ) -> (DispatchSnapshot, Vec<Record>) {
        let blueprint = ConfigLoader::load_from_str(config_toml, ConfigFormat::Toml).unwrap();

        let router = Arc::new(RecordRouter::from_configs(&blueprint.sinks).await.unwrap());
        let mut enricher = MetadataEnricher::new(client, &blueprint.enrich).unwrap();
        enricher.start(Arc::clone(&router)).unwrap();

        for record in records {
            enricher.enqueue(record).await.unwrap();
        }

        let snapshot = enricher.stop().await.unwrap();

        let router = Arc::try_unwrap(router)
            .unwrap_or_else(|_| panic!("router still referenced after enricher stop"));
        router.shutdown().await;

        let contents = std::fs::read_to_string(out_path).unwrap();
        let parsed = contents
            .lines()
            .map(|line| serde_json::from_str::<Record>(line).unwrap())
            .collect();

        (snapshot, parsed)
    }

    /// End-to-end test: config -> enricher (ordered) -> file sink
    ///
    /// Verifies the complete flow:
    /// 1. ConfigLoader parses the pipeline blueprint
    /// 2. Records release in enqueue order despite concurrent lookups
    /// 3. The file sink receives every enriched record
    #[tokio::test]
    async fn test_ordered_pipeline_preserves_enqueue_order() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.ndjson");
        let config = file_pipeline_config(&out_path, true);

        let records: Vec<Record> = (0..25).map(|i| Record::new(format!("rec-{i:02}"))).collect();
        let (snapshot, written) =
            run_file_pipeline(&config, &out_path, delayed_client(3), records).await;

        assert_eq!(snapshot.enqueued, 25);
        assert_eq!(snapshot.released, 25);
        assert_eq!(written.len(), 25);

        let names: Vec<&str> = written.iter().map(|r| r.name.as_str()).collect();
        let expected: Vec<String> = (0..25).map(|i| format!("rec-{i:02}")).collect();
        assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());

        // Metadata tags attached along the way
        assert_eq!(written[0].tag("zone"), Some("us-central1-a"));
        assert_eq!(written[0].tag("name"), Some("mock-instance"));
    }

    /// Unordered mode delivers the full record set, order not guaranteed
    #[tokio::test]
    async fn test_unordered_pipeline_delivers_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.ndjson");
        let config = file_pipeline_config(&out_path, false);

        let records: Vec<Record> = (0..30).map(|i| Record::new(format!("rec-{i:02}"))).collect();
        let (snapshot, written) =
            run_file_pipeline(&config, &out_path, delayed_client(2), records).await;

        assert_eq!(snapshot.emitted, 30);
        assert_eq!(written.len(), 30);

        let mut names: Vec<String> = written.iter().map(|r| r.name.clone()).collect();
        names.sort();
        let expected: Vec<String> = (0..30).map(|i| format!("rec-{i:02}")).collect();
        assert_eq!(names, expected);
    }

    /// A failing metadata field must not stall ordered release: every
    /// record still arrives, in position, just without the failed tag.
    #[tokio::test]
    async fn test_failed_lookups_release_in_position() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.ndjson");
        let config = file_pipeline_config(&out_path, true);

        let client = MockMetadataClient::with_config(MockMetadataConfig {
            fail_fields: vec!["zone".into()],
            delay: Some(Duration::from_millis(2)),
            ..MockMetadataConfig::default()
        });

        let records: Vec<Record> = (0..10).map(|i| Record::new(format!("rec-{i:02}"))).collect();
        let (snapshot, written) = run_file_pipeline(&config, &out_path, client, records).await;

        assert_eq!(snapshot.released, 10);
        assert_eq!(written.len(), 10);

        for (i, record) in written.iter().enumerate() {
            assert_eq!(record.name, format!("rec-{i:02}"));
            assert!(!record.has_tag("zone"));
            assert_eq!(record.tag("name"), Some("mock-instance"));
        }
    }

    /// Stop must drain everything already admitted before returning
    #[tokio::test]
    async fn test_stop_drains_through_log_sink() {
        let config = r#"
[enrich]
allow_tags = ["name"]
timeout_ms = 2000
ordered = true
max_parallel_calls = 4
max_queue_size = 64

[[sinks]]
name = "console"
sink_type = "log"
queue_capacity = 100
"#;
        let blueprint = ConfigLoader::load_from_str(config, ConfigFormat::Toml).unwrap();

        let router = Arc::new(RecordRouter::from_configs(&blueprint.sinks).await.unwrap());
        let mut enricher = MetadataEnricher::new(delayed_client(2), &blueprint.enrich).unwrap();
        enricher.start(Arc::clone(&router)).unwrap();

        for i in 0..40 {
            enricher.enqueue(Record::new(format!("rec-{i}"))).await.unwrap();
        }

        // Stop immediately; most records are still in flight
        let snapshot = enricher.stop().await.unwrap();
        assert_eq!(snapshot.released, 40);
        assert_eq!(snapshot.buffer_len, 0);

        let router = Arc::try_unwrap(router)
            .unwrap_or_else(|_| panic!("router still referenced after enricher stop"));
        let finals = router.shutdown().await;
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].1.written, 40);
        assert_eq!(finals[0].1.dropped, 0);
    }
}
