//! Sink configuration types

use serde::Deserialize;

/// Downstream sink selection
///
/// The development sinks ship in-tree; a production backend transport plugs
/// in behind the same trait without touching this config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Print records to standard output
    #[default]
    Stdout,

    /// Count and discard records (benchmarking, routing tests)
    Null,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        sink: SinkConfig,
    }

    #[test]
    fn test_deserialize_variants() {
        let w: Wrapper = toml::from_str("[sink]\ntype = \"stdout\"").unwrap();
        assert!(matches!(w.sink, SinkConfig::Stdout));

        let w: Wrapper = toml::from_str("[sink]\ntype = \"null\"").unwrap();
        assert!(matches!(w.sink, SinkConfig::Null));
    }
}
