//! Relay - Configuration
//!
//! TOML configuration for the relay: global tunables, listener declarations
//! and the downstream sink selection. All fields have defaults; a config
//! only needs to say what it changes. Durations are humantime strings
//! (`"1s"`, `"250ms"`).
//!
//! # Example
//!
//! ```toml
//! [global]
//! batch_size = 512
//! flush_interval = "1s"
//!
//! [[listener]]
//! transport = "udp"
//! framing = "syslog"
//! port = 1514
//! tag = "syslog"
//!
//! [[listener]]
//! transport = "tcp"
//! framing = "line"
//! port = 7777
//! tag = "apps"
//! ignore_timestamps = true
//!
//! [sink]
//! type = "stdout"
//! ```

mod error;
mod global;
mod listeners;
mod sink;

use std::path::Path;

use serde::Deserialize;

pub use error::ConfigError;
pub use global::GlobalConfig;
pub use listeners::{Framing, ListenerDecl, Transport};
pub use sink::SinkConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global tunables
    pub global: GlobalConfig,

    /// Listener declarations (`[[listener]]` tables)
    #[serde(rename = "listener")]
    pub listeners: Vec<ListenerDecl>,

    /// Downstream sink selection
    pub sink: SinkConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse and validate a TOML string
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the type system cannot: at least one listener, valid
    /// ports, parseable source overrides
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listeners.is_empty() {
            return Err(ConfigError::NoListeners);
        }
        for listener in &self.listeners {
            listener.validate()?;
        }
        Ok(())
    }

    /// Distinct tag names across all listeners, in first-seen order
    ///
    /// The position of a name in this list is its numeric tag value.
    pub fn tag_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for listener in &self.listeners {
            if !names.contains(&listener.tag.as_str()) {
                names.push(&listener.tag);
            }
        }
        names
    }

    /// Resolve a tag name to its numeric value
    pub fn tag_index(&self, name: &str) -> Option<u16> {
        self.tag_names()
            .iter()
            .position(|&n| n == name)
            .map(|i| i as u16)
    }
}
