//! Stdout sink - human-readable output
//!
//! Prints one line per record: timestamp, tag, source address, payload. Not
//! intended for production throughput; it exists so a freshly built relay
//! shows data end-to-end without a backend.

use async_trait::async_trait;
use relay_pipeline::{IngestSink, SinkError};
use relay_protocol::LogRecord;
use tokio::io::AsyncWriteExt;

/// Sink that writes records to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    /// Create a new stdout sink
    pub fn new() -> Self {
        Self
    }

    /// Render one record as an output line
    fn format_record(record: &LogRecord) -> String {
        format!(
            "{} tag:{} {} {}\n",
            record.timestamp().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.tag(),
            record.source_ip(),
            String::from_utf8_lossy(record.payload()),
        )
    }
}

#[async_trait]
impl IngestSink for StdoutSink {
    async fn submit(&self, batch: Vec<LogRecord>) -> Result<(), SinkError> {
        // One buffered write per batch keeps interleaving sane when the
        // relay is flushing quickly.
        let mut out = String::with_capacity(batch.iter().map(|r| r.len() + 48).sum());
        for record in &batch {
            out.push_str(&Self::format_record(record));
        }

        let mut stdout = tokio::io::stdout();
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}
