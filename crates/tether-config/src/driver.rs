//! Pass-through tuning for the wire-protocol driver
//!
//! None of these settings are interpreted by the materialization engine.
//! They are validated, exposed as typed accessors and handed to the driver
//! collaborator when a session is requested.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};
use crate::remote_url::RemoteUrl;

/// Driver connection tuning (`driverConfig` option)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_leaked_sessions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_idle_connection_pool_size: Option<u32>,
    /// Milliseconds; a negative value disables the liveness check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_time_before_connection_test: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_failure_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_retry_delay_millis: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_timeout_millis: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retry_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_strategy: Option<TrustStrategy>,
}

impl DriverConfig {
    /// Idle time after which a pooled connection is tested before reuse.
    ///
    /// `None` when unset or negative (liveness check disabled).
    pub fn idle_time_before_connection_test(&self) -> Option<Duration> {
        self.idle_time_before_connection_test
            .filter(|ms| *ms >= 0)
            .map(|ms| Duration::from_millis(ms as u64))
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        self.connection_timeout_millis.map(Duration::from_millis)
    }

    pub fn routing_retry_delay(&self) -> Option<Duration> {
        self.routing_retry_delay_millis.map(Duration::from_millis)
    }

    pub fn max_retry_time(&self) -> Option<Duration> {
        self.max_retry_time_ms.map(Duration::from_millis)
    }

    /// Whether abandoned sessions should be reported loudly
    pub fn log_leaked_sessions(&self) -> bool {
        self.log_leaked_sessions.unwrap_or(false)
    }

    /// Check the settings against the URL scheme they will be used with
    pub fn validate_for(&self, url: &RemoteUrl) -> ConfigResult<()> {
        match self.encryption {
            Some(false) if url.scheme().is_encrypted() => Err(ConfigError::Conflict(format!(
                "encryption is disabled but the '{}' scheme requires it",
                url.scheme()
            ))),
            Some(true) if !url.scheme().is_encrypted() => Err(ConfigError::Conflict(format!(
                "encryption is enabled but the '{}' scheme is plain text; use '{}+s' instead",
                url.scheme(),
                url.scheme()
            ))),
            _ => Ok(()),
        }
    }
}

/// Driver log verbosity, using the level names of the reference driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Severe,
    Warning,
    Info,
    Fine,
    All,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Severe => "SEVERE",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Fine => "FINE",
            Self::All => "ALL",
        }
    }

    /// Equivalent `tracing` filter
    pub fn level_filter(&self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        match self {
            Self::Off => LevelFilter::OFF,
            Self::Severe => LevelFilter::ERROR,
            Self::Warning => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Fine => LevelFilter::DEBUG,
            Self::All => LevelFilter::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OFF" | "NONE" => Ok(Self::Off),
            "SEVERE" | "ERROR" => Ok(Self::Severe),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "INFO" => Ok(Self::Info),
            "FINE" | "DEBUG" => Ok(Self::Fine),
            "ALL" | "TRACE" => Ok(Self::All),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// How the driver decides whether to trust the server certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustStrategy {
    TrustAllCertificates,
    TrustSystemCaSignedCertificates,
    /// Any other value is a path to a CA certificate file
    TrustCustomCaSignedCertificates(PathBuf),
}

impl TrustStrategy {
    const ALL: &'static str = "TRUST_ALL_CERTIFICATES";
    const SYSTEM: &'static str = "TRUST_SYSTEM_CA_SIGNED_CERTIFICATES";

    fn from_raw(raw: &str) -> Self {
        match raw {
            Self::ALL => Self::TrustAllCertificates,
            Self::SYSTEM => Self::TrustSystemCaSignedCertificates,
            path => Self::TrustCustomCaSignedCertificates(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for TrustStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrustAllCertificates => f.write_str(Self::ALL),
            Self::TrustSystemCaSignedCertificates => f.write_str(Self::SYSTEM),
            Self::TrustCustomCaSignedCertificates(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Serialize for TrustStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TrustStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TrustVisitor;

        impl Visitor<'_> for TrustVisitor {
            type Value = TrustStrategy;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a trust strategy name or a certificate path")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v.trim().is_empty() {
                    return Err(E::custom("trust strategy must not be empty"));
                }
                Ok(TrustStrategy::from_raw(v))
            }
        }

        deserializer.deserialize_str(TrustVisitor)
    }
}
