//! # Tether Configuration
//!
//! Options and connection settings for querying a remote graph database.
//!
//! ## Features
//!
//! - Per-call options (`virtual`, `withRelationshipNodeProperties`, `statistics`,
//!   `readOnly`, `streamStatements`, `driverConfig`) parsed from loose JSON
//! - Remote URL parsing with credential scrubbing for logs and errors
//! - Named remote aliases and default options from TOML or JSON files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tether_config::{BridgeConfig, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("tether.toml").await?;
//!     let url = config.resolve_url("reporting")?;
//!     let options = config.defaults.overlay(&serde_json::json!({ "virtual": true }))?;
//!     println!("{} virtual={}", url, options.virtual_entities);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

mod bridge;
mod driver;
mod error;
mod loader;
mod remote_url;

pub use bridge::BridgeConfig;
pub use driver::{DriverConfig, LogLevel, TrustStrategy};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, TetherConfig};
pub use remote_url::{scrub, RemoteUrl, Scheme};
