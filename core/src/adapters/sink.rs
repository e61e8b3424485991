//! Result stream adapters.

use std::path::Path;

use parking_lot::RwLock;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::domain::PortScanResult;
use crate::error::{Error, Result};
use crate::ports::ResultSink;

/// Writes each result as one JSON line to an async writer.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesSink<tokio::io::Stdout> {
    /// Stream results to standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl JsonLinesSink<tokio::fs::File> {
    /// Append results to the file at `path`, creating it if needed.
    pub async fn append_to(path: impl AsRef<Path>) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await
            .map_err(|e| {
                Error::Dependency(format!(
                    "Failed to open result stream {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
        Ok(Self::new(file))
    }
}

impl<W: AsyncWrite + Unpin + Send> ResultSink for JsonLinesSink<W> {
    async fn publish(&self, result: &PortScanResult) -> Result<()> {
        let mut line = serde_json::to_vec(result)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| Error::Dependency(format!("Failed to write result: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::Dependency(format!("Failed to flush result stream: {}", e)))
    }
}

/// Collects results in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    results: RwLock<Vec<PortScanResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in arrival order.
    pub fn results(&self) -> Vec<PortScanResult> {
        self.results.read().clone()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

impl ResultSink for MemorySink {
    async fn publish(&self, result: &PortScanResult) -> Result<()> {
        self.results.write().push(result.clone());
        Ok(())
    }
}
