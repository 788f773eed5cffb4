//! Host-side broker configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is valid.
//!
//! ```toml
//! log_filter = "ctxbroker=debug"
//! compiler_lookups_gated = true
//!
//! [[topology.links]]
//! from = 2
//! to = 1
//! bidirectional = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::PluginId;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// `tracing` filter directive used by the binary when `RUST_LOG` is unset
    pub log_filter: String,
    /// Gate compiler-context lookups behind the permission check as well.
    /// Off by default: compiler contexts are readable by any plugin.
    pub compiler_lookups_gated: bool,
    /// Static plugin topology
    pub topology: TopologyConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            compiler_lookups_gated: false,
            topology: TopologyConfig::default(),
        }
    }
}

/// Plugin connections declared by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub links: Vec<LinkConfig>,
}

/// One connection: `from` may access contexts owned by `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub from: PluginId,
    pub to: PluginId,
    /// Also allow `to` to access contexts owned by `from`
    #[serde(default)]
    pub bidirectional: bool,
}

impl BrokerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            path = %path.display(),
            links = config.topology.links.len(),
            "Loaded broker config"
        );
        Ok(config)
    }

    /// Platform config location, e.g. `~/.config/ctxbroker/broker.toml`.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "ctxbroker").map_or_else(
            || PathBuf::from("broker.toml"),
            |dirs| dirs.config_dir().join("broker.toml"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_config_uses_defaults() {
        let config = BrokerConfig::from_toml_str("").unwrap();
        assert_eq!(config, BrokerConfig::default());
        assert_eq!(config.log_filter, "info");
        assert!(!config.compiler_lookups_gated);
        assert!(config.topology.links.is_empty());
    }

    #[test]
    fn config_parses_links() {
        let config = BrokerConfig::from_toml_str(
            r#"
            compiler_lookups_gated = true

            [[topology.links]]
            from = 2
            to = 1
            bidirectional = true

            [[topology.links]]
            from = 3
            to = 1
            "#,
        )
        .unwrap();
        assert!(config.compiler_lookups_gated);
        assert_eq!(
            config.topology.links,
            vec![
                LinkConfig {
                    from: PluginId(2),
                    to: PluginId(1),
                    bidirectional: true
                },
                LinkConfig {
                    from: PluginId(3),
                    to: PluginId(1),
                    bidirectional: false
                },
            ]
        );
    }

    #[test]
    fn load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_filter = \"ctxbroker=trace\"").unwrap();
        let config = BrokerConfig::load(file.path()).unwrap();
        assert_eq!(config.log_filter, "ctxbroker=trace");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = BrokerConfig::load(Path::new("/nonexistent/broker.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "compiler_lookups_gated = \"yes\"").unwrap();
        let err = BrokerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
