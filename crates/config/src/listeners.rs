//! Listener configuration types

use std::net::IpAddr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Transport a listener binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    /// Lowercase name for logs and derived listener IDs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// Framing family a listener decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Newline-delimited raw text
    Line,
    /// `<PRI>`-framed syslog
    Syslog,
}

impl Framing {
    /// Lowercase name for logs and derived listener IDs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Syslog => "syslog",
        }
    }
}

/// One `[[listener]]` declaration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerDecl {
    /// Listener name for logs; derived from transport/framing/port when empty
    pub name: String,

    /// Transport to bind
    pub transport: Transport,

    /// Framing family to decode
    pub framing: Framing,

    /// Bind address
    /// Default: "0.0.0.0"
    pub address: String,

    /// Listen port (required - no sensible default)
    pub port: u16,

    /// Tag name; distinct names across listeners become numeric tags
    /// Default: "default"
    pub tag: String,

    /// Stamp records with ingestion time instead of extracting embedded
    /// timestamps
    pub ignore_timestamps: bool,

    /// Interpret zone-less embedded timestamps as local time
    pub assume_local_timezone: bool,

    /// Keep the `<NNN>` prefix on syslog payloads instead of stripping it
    pub keep_priority: bool,

    /// Record this IP address instead of the peer address
    pub source_override: Option<String>,
}

impl Default for ListenerDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            transport: Transport::Tcp,
            framing: Framing::Line,
            address: "0.0.0.0".into(),
            port: 0,
            tag: "default".into(),
            ignore_timestamps: false,
            assume_local_timezone: false,
            keep_priority: false,
            source_override: None,
        }
    }
}

impl ListenerDecl {
    /// Listener identifier: the configured name, or one derived from the
    /// listener's shape
    pub fn effective_name(&self) -> String {
        if self.name.is_empty() {
            format!(
                "{}_{}_{}",
                self.framing.as_str(),
                self.transport.as_str(),
                self.port
            )
        } else {
            self.name.clone()
        }
    }

    /// Parse the source override, if declared
    pub fn parsed_source_override(&self) -> Result<Option<IpAddr>, ConfigError> {
        match &self.source_override {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidSourceOverride {
                    listener: self.effective_name(),
                    value: raw.clone(),
                }),
        }
    }

    /// Validate this declaration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort {
                listener: self.effective_name(),
            });
        }
        self.parsed_source_override()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_name_derivation() {
        let decl = ListenerDecl {
            transport: Transport::Udp,
            framing: Framing::Syslog,
            port: 1514,
            ..Default::default()
        };
        assert_eq!(decl.effective_name(), "syslog_udp_1514");

        let named = ListenerDecl {
            name: "edge".into(),
            ..decl
        };
        assert_eq!(named.effective_name(), "edge");
    }

    #[test]
    fn test_source_override_parses_v4_and_v6() {
        let decl = ListenerDecl {
            port: 1,
            source_override: Some("192.0.2.1".into()),
            ..Default::default()
        };
        assert!(decl.parsed_source_override().unwrap().unwrap().is_ipv4());

        let decl = ListenerDecl {
            port: 1,
            source_override: Some("2001:db8::1".into()),
            ..Default::default()
        };
        assert!(decl.parsed_source_override().unwrap().unwrap().is_ipv6());
    }

    #[test]
    fn test_validate_rejects_bad_override() {
        let decl = ListenerDecl {
            port: 1,
            source_override: Some("256.1.1.1".into()),
            ..Default::default()
        };
        assert!(decl.validate().is_err());
    }
}
