//! FileSink - appends records to an NDJSON file

use contracts::{ContractError, Record, RecordSink};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file path
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;

        Ok(Self { path })
    }
}

/// Sink that appends records to disk, one JSON document per line
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new FileSink, appending to the file at `config.path`
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            path: config.path,
            writer: BufWriter::new(file),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = FileSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_write(&name, e))?;

        Ok(Self::new(name, config)?)
    }

    fn append_record(&mut self, record: &Record) -> std::io::Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    fn persist_record(&mut self, record: &Record) -> Result<(), ContractError> {
        self.append_record(record).map_err(|e| {
            error!(sink = %self.name, record = %record.name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, record),
        fields(sink = %self.name, record = %record.name)
    )]
    async fn write(&mut self, record: &Record) -> Result<(), ContractError> {
        self.persist_record(record)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, path = %self.path.display(), "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_appends_ndjson() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.ndjson");
        let config = FileSinkConfig { path: path.clone() };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.write(&Record::new("cpu").with_tag("zone", "us-central1-a"))
            .await
            .unwrap();
        sink.write(&Record::new("mem")).await.unwrap();
        sink.flush().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Record = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.name, "cpu");
        assert_eq!(first.tag("zone"), Some("us-central1-a"));
    }

    #[tokio::test]
    async fn test_file_sink_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out").join("records.ndjson");
        let config = FileSinkConfig { path: path.clone() };

        let mut sink = FileSink::new("nested", config).unwrap();
        sink.write(&Record::new("cpu")).await.unwrap();
        sink.close().await.unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_from_params_requires_path() {
        let err = FileSinkConfig::from_params(&HashMap::new()).unwrap_err();
        assert!(err.contains("path"));
    }
}
