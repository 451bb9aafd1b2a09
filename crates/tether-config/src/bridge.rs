//! Per-call options for remote queries
//!
//! Options arrive as a loose JSON map. Known keys are type-checked and unknown
//! keys are ignored so callers can pass options meant for newer versions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::driver::DriverConfig;
use crate::error::{ConfigError, ConfigResult};

/// Options recognized by `load`, `execute` and `load_from_local`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Materialize nodes and relationships as virtual graph entities instead of maps
    #[serde(rename = "virtual")]
    pub virtual_entities: bool,
    /// Attach full endpoint node properties to virtual relationships
    pub with_relationship_node_properties: bool,
    /// Report write counters instead of rows (`execute` and `load_from_local`)
    pub statistics: bool,
    /// Open the remote session in read access mode
    pub read_only: bool,
    /// Treat local rows as a stream of statement texts to replay remotely
    pub stream_statements: bool,
    /// Target database on the remote instance; the server default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    /// Pass-through driver tuning
    #[serde(rename = "driverConfig")]
    pub driver: DriverConfig,
}

impl BridgeConfig {
    /// Build options from a caller-supplied JSON value. `null` yields the defaults.
    pub fn from_json(options: &Value) -> ConfigResult<Self> {
        Self::default().overlay(options)
    }

    /// Apply per-call options on top of these ones.
    ///
    /// Scalar options replace the current value, `driverConfig` is merged key by key.
    pub fn overlay(&self, options: &Value) -> ConfigResult<Self> {
        let mut merged = self.clone();

        let options = match options {
            Value::Null => return Ok(merged),
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::invalid_option(
                    "config",
                    format!("expected a map of options, got {}", json_kind(other)),
                ))
            }
        };

        for (key, raw) in options {
            match key.as_str() {
                "virtual" => merged.virtual_entities = flag(key, raw)?,
                "withRelationshipNodeProperties" => {
                    merged.with_relationship_node_properties = flag(key, raw)?
                }
                "statistics" => merged.statistics = flag(key, raw)?,
                "readOnly" => merged.read_only = flag(key, raw)?,
                "streamStatements" => merged.stream_statements = flag(key, raw)?,
                "databaseName" => {
                    merged.database_name = match raw {
                        Value::Null => None,
                        Value::String(name) => Some(name.clone()),
                        other => {
                            return Err(ConfigError::invalid_option(
                                key,
                                format!("expected a string, got {}", json_kind(other)),
                            ))
                        }
                    }
                }
                "driverConfig" => merged.driver = merge_driver(&merged.driver, raw)?,
                _ => debug!(key = %key, "Ignoring unrecognized option"),
            }
        }

        Ok(merged)
    }

    /// Whether the remote session should be opened in read access mode
    pub fn access_mode_is_read(&self) -> bool {
        self.read_only
    }
}

fn flag(key: &str, raw: &Value) -> ConfigResult<bool> {
    match raw {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        other => Err(ConfigError::invalid_option(
            key,
            format!("expected a boolean, got {}", json_kind(other)),
        )),
    }
}

fn merge_driver(current: &DriverConfig, raw: &Value) -> ConfigResult<DriverConfig> {
    let overrides = match raw {
        Value::Null => return Ok(current.clone()),
        Value::Object(map) => map,
        other => {
            return Err(ConfigError::invalid_option(
                "driverConfig",
                format!("expected a map, got {}", json_kind(other)),
            ))
        }
    };

    let mut merged = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }

    serde_json::from_value(Value::Object(merged))
        .map_err(|e| ConfigError::invalid_option("driverConfig", e))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
