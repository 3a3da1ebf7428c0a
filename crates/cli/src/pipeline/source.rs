//! Record sources feeding the pipeline.
//!
//! Each source runs as its own task and hands parsed records over a
//! bounded channel, so backpressure from the enricher reaches the
//! reader without any buffering surprises in between.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use contracts::{Record, SourceConfig, SourceKind};

/// Stable label for a source kind, used in metric labels
pub fn source_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Stdin => "stdin",
        SourceKind::File => "file",
        SourceKind::Synthetic => "synthetic",
    }
}

/// A running record source task and its output channel
#[derive(Debug)]
pub struct SourceHandle {
    rx: mpsc::Receiver<Record>,
    malformed: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl SourceHandle {
    /// Receive the next record; `None` when the source is exhausted
    pub async fn recv(&mut self) -> Option<Record> {
        self.rx.recv().await
    }

    /// Input lines that failed to parse so far
    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    /// Stop the reader task
    ///
    /// The reader may be parked on a quiet stdin, so it is aborted
    /// rather than awaited.
    pub async fn shutdown(self) {
        drop(self.rx);
        self.task.abort();
        let _ = self.task.await;
    }
}

/// Spawn the reader task for the configured source
pub async fn spawn_source(config: &SourceConfig, capacity: usize) -> Result<SourceHandle> {
    let (tx, rx) = mpsc::channel(capacity);
    let malformed = Arc::new(AtomicU64::new(0));

    let task = match config.kind {
        SourceKind::Stdin => {
            info!("Reading NDJSON records from stdin");
            let counter = Arc::clone(&malformed);
            tokio::spawn(async move {
                let reader = BufReader::new(tokio::io::stdin());
                read_lines(reader, tx, counter).await;
            })
        }
        SourceKind::File => {
            let path = config.path.clone().context("file source requires a path")?;
            info!(path = %path.display(), "Reading NDJSON records from file");
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            let counter = Arc::clone(&malformed);
            tokio::spawn(async move {
                let reader = BufReader::new(file);
                read_lines(reader, tx, counter).await;
            })
        }
        SourceKind::Synthetic => {
            let count = config.count;
            let interval = Duration::from_millis(config.interval_ms);
            info!(
                count,
                interval_ms = config.interval_ms,
                "Generating synthetic records"
            );
            tokio::spawn(async move {
                generate_records(count, interval, tx).await;
            })
        }
    };

    Ok(SourceHandle {
        rx,
        malformed,
        task,
    })
}

/// Parse NDJSON lines into records until EOF or channel close
async fn read_lines<R>(reader: BufReader<R>, tx: mpsc::Sender<Record>, malformed: Arc<AtomicU64>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match Record::from_json_line(line) {
                    Ok(record) => {
                        if tx.send(record).await.is_err() {
                            debug!("Record channel closed, stopping reader");
                            break;
                        }
                    }
                    Err(e) => {
                        malformed.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "Skipping malformed record line");
                    }
                }
            }
            Ok(None) => {
                debug!("Record source reached end of input");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Record source read error");
                break;
            }
        }
    }
}

/// Emit `count` generated records at a fixed interval
async fn generate_records(count: u64, interval: Duration, tx: mpsc::Sender<Record>) {
    for i in 0..count {
        let record = Record::new(format!("synthetic-{i}"))
            .with_tag("origin", "generator")
            .with_field("seq", i)
            .with_field("value", (i % 100) as f64 / 100.0);

        if tx.send(record).await.is_err() {
            debug!("Record channel closed, stopping generator");
            break;
        }

        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
}
