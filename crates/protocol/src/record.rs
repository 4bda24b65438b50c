//! Log record types
//!
//! A [`LogRecord`] is the immutable unit handed from a listener to the relay
//! queue. Records are constructed once, never mutated, and owned by the queue
//! and then the batch until the downstream sink takes them.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};

/// Numeric tag classifying which logical log stream a record belongs to
///
/// Tags are small integers resolved from listener tag names at configuration
/// load time (first distinct name gets 0, and so on).
///
/// # Example
///
/// ```
/// use relay_protocol::Tag;
///
/// let tag = Tag::new(3);
/// assert_eq!(tag.as_u16(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(u16);

impl Tag {
    /// Create a tag from its numeric value
    #[inline]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the numeric tag value
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Tag {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self(0)
    }
}

/// One framed log message with its ingestion metadata
///
/// # Invariants
///
/// - `payload` is trimmed of surrounding `\n`, `\r`, `\t` and space and is
///   never empty - empty candidates are dropped by the decoders before a
///   record is ever constructed.
/// - A record is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    tag: Tag,
    source_ip: IpAddr,
    timestamp: DateTime<Utc>,
    payload: Vec<u8>,
}

impl LogRecord {
    /// Create a new record
    ///
    /// Callers are expected to pass an already-trimmed, non-empty payload;
    /// see [`trim_frame`].
    pub fn new(tag: Tag, source_ip: IpAddr, timestamp: DateTime<Utc>, payload: Vec<u8>) -> Self {
        debug_assert!(!payload.is_empty(), "records must carry a payload");
        Self {
            tag,
            source_ip,
            timestamp,
            payload,
        }
    }

    /// Get the stream tag
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Get the resolved source address
    #[inline]
    pub fn source_ip(&self) -> IpAddr {
        self.source_ip
    }

    /// Get the record timestamp (extracted or ingestion time)
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the raw message bytes
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// A record never has an empty payload, so this is always false; provided
    /// for completeness alongside `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Trim surrounding `\n`, `\r`, `\t` and space bytes from a frame
///
/// Every decoder applies this before deciding whether a candidate message is
/// worth forwarding; a frame that trims to nothing is dropped, not an error.
#[inline]
pub fn trim_frame(data: &[u8]) -> &[u8] {
    let is_trim = |b: u8| matches!(b, b'\n' | b'\r' | b'\t' | b' ');

    let mut start = 0;
    let mut end = data.len();

    while start < end && is_trim(data[start]) {
        start += 1;
    }
    while end > start && is_trim(data[end - 1]) {
        end -= 1;
    }

    &data[start..end]
}

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;
