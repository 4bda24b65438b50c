//! Global configuration settings

use std::time::Duration;

use serde::Deserialize;

/// Global tunables that apply across all components
///
/// All fields have defaults; only specify what you want to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Record queue capacity between listeners and the relay
    ///
    /// A full queue blocks listeners (backpressure) rather than growing
    /// memory. Default: 2048
    pub queue_size: usize,

    /// Records per batch before an immediate flush
    /// Default: 512
    pub batch_size: usize,

    /// Interval for time-triggered flushes of partial batches
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// How long shutdown waits for listeners to unwind before proceeding
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// How long startup waits for the sink to accept data
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub sink_ready_timeout: Duration,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            queue_size: 2048,
            batch_size: 512,
            flush_interval: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(1),
            sink_ready_timeout: Duration::from_secs(10),
        }
    }
}
