//! Configuration error types

use thiserror::Error;

/// Errors raised while loading or validating configuration
///
/// These all occur before the relay starts and are fatal to startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the configuration file
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No listeners declared - the relay would have nothing to do
    #[error("no listeners configured")]
    NoListeners,

    /// A listener has no usable port
    #[error("listener {listener}: port is required")]
    InvalidPort { listener: String },

    /// A listener's source override is not an IP address
    #[error("listener {listener}: invalid source_override {value:?}")]
    InvalidSourceOverride { listener: String, value: String },
}
