//! Configuration file loading
//!
//! A config file names remote instances by alias and carries default call
//! options:
//!
//! ```toml
//! [aliases]
//! reporting = "neo4j+s://reader@reports.internal:7687"
//!
//! [defaults]
//! readOnly = true
//!
//! [defaults.driverConfig]
//! connectionTimeoutMillis = 2000
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bridge::BridgeConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::remote_url::{scrub, RemoteUrl};

/// Workspace-level configuration: URL aliases and default call options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Alias name to remote URL
    pub aliases: BTreeMap<String, String>,
    /// Options applied before per-call options
    pub defaults: BridgeConfig,
}

impl TetherConfig {
    /// Turn a caller-supplied URL or alias into a parsed remote URL.
    ///
    /// Input containing `://` is parsed as a URL, anything else is looked up
    /// as an alias.
    pub fn resolve_url(&self, input: &str) -> ConfigResult<RemoteUrl> {
        let input = input.trim();
        if input.contains("://") {
            return RemoteUrl::parse(input);
        }

        let target = self
            .aliases
            .get(input)
            .ok_or_else(|| ConfigError::UnknownAlias(input.to_string()))?;
        debug!(alias = %input, url = %scrub(target), "Resolved remote alias");
        RemoteUrl::parse(target)
    }

    /// Check every alias parses and every default is consistent
    pub fn validate(&self) -> ConfigResult<()> {
        for target in self.aliases.values() {
            let url = RemoteUrl::parse(target)?;
            self.defaults.driver.validate_for(&url)?;
        }
        Ok(())
    }
}

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (requires the `toml` feature)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Loads [`TetherConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a config file. The format follows the file extension.
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<TetherConfig> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::load_from_str(&content, format).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        info!(
            path = %path.display(),
            aliases = config.aliases.len(),
            "Loaded remote configuration"
        );
        Ok(config)
    }

    /// Parse and validate config text in the given format
    pub fn load_from_str(content: &str, format: ConfigFormat) -> ConfigResult<TetherConfig> {
        let config: TetherConfig = match format {
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            #[cfg(not(feature = "toml"))]
            ConfigFormat::Toml => {
                return Err(ConfigError::UnsupportedFormat(std::path::PathBuf::from(
                    "*.toml",
                )))
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_error(message: String) -> ConfigError {
    ConfigError::Parse {
        path: Default::default(),
        message,
    }
}
