//! Record construction and queue dispatch
//!
//! The [`RecordDispatcher`] turns a trimmed frame plus listener metadata
//! into a [`LogRecord`] and submits it to the relay queue. One dispatcher is
//! built per connection (TCP) or per socket task (UDP), so the timestamp
//! extractor's pattern table is compiled once, not per message.

use std::net::IpAddr;

use chrono::Utc;
use relay_protocol::{LogRecord, Tag};
use relay_timestamp::{TimeExtractor, TimeExtractorConfig};
use tokio::sync::mpsc;

use crate::common::{ListenerConfig, SourceError};

/// Builds records and submits them to the relay queue
///
/// Timestamp policy: with extraction disabled every record gets ingestion
/// time; otherwise the payload is searched for an embedded timestamp and
/// ingestion time is the fallback. Submission blocks when the queue is full
/// (backpressure) and reports a closed queue as the terminal
/// [`SourceError::RelayClosed`], which the calling decoder must treat as
/// "stop reading and release the connection".
pub struct RecordDispatcher {
    tag: Tag,
    extractor: Option<TimeExtractor>,
    tx: mpsc::Sender<LogRecord>,
}

impl RecordDispatcher {
    /// Build a dispatcher for one listener's records
    pub fn new(config: &ListenerConfig, tx: mpsc::Sender<LogRecord>) -> Self {
        let extractor = if config.ignore_timestamps {
            None
        } else {
            Some(TimeExtractor::new(TimeExtractorConfig {
                assume_local_timezone: config.assume_local_timezone,
            }))
        };

        Self {
            tag: config.tag,
            extractor,
            tx,
        }
    }

    /// Construct one record and submit it
    ///
    /// `payload` must already be trimmed and non-empty; `source_ip` is the
    /// resolved source for this message (override or peer).
    pub async fn dispatch(&self, payload: Vec<u8>, source_ip: IpAddr) -> Result<(), SourceError> {
        let timestamp = match &self.extractor {
            Some(extractor) => extractor.extract(&payload).unwrap_or_else(Utc::now),
            None => Utc::now(),
        };

        let record = LogRecord::new(self.tag, source_ip, timestamp, payload);
        self.tx
            .send(record)
            .await
            .map_err(|_| SourceError::RelayClosed)
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;
