//! Hub configuration — TOML file, environment variables, CLI args, defaults
//!
//! ## Loading Order
//!
//! Later sources override earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config` or `GASDYN_CONFIG`)
//! 3. Environment variables (`DATABASE_URL`, `GASDYN_*`)
//! 4. CLI arguments (database URL, bind address, port)
//!
//! ```toml
//! database_url = "postgres://postgres@localhost:5432/gasdynamicdb"
//! bind_address = "0.0.0.0:8000"
//! passphrase = "change-me"
//! state_tolerance = 0.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Passphrase used in debug builds when none is configured.
const DEV_PASSPHRASE: &str = "gasdyn-dev-passphrase";

/// Hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Bind address (e.g., "0.0.0.0:8000")
    pub bind_address: String,
    /// Maximum request body size in bytes (default: 1 MB)
    pub max_payload_size: usize,
    /// Shared service passphrase expected as the Bearer token
    pub passphrase: String,
    /// Largest depth/pressure difference still treated as "unchanged" when
    /// deciding whether a new well state is needed (default: 0.0, exact)
    pub state_tolerance: f64,
    /// Connection pool size
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    pub acquire_timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_address: "0.0.0.0:8000".to_string(),
            max_payload_size: 1_048_576, // 1 MB
            passphrase: String::new(),
            state_tolerance: 0.0,
            max_connections: 20,
            acquire_timeout_secs: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl HubConfig {
    /// Load a TOML file; absent keys keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Loaded hub config file");
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("GASDYN_BIND_ADDRESS") {
            self.bind_address = v;
        }
        if let Some(v) = lookup("GASDYN_PASSPHRASE") {
            self.passphrase = v;
        }
        if let Some(v) = lookup("GASDYN_MAX_PAYLOAD_SIZE") {
            self.max_payload_size = parse_var("GASDYN_MAX_PAYLOAD_SIZE", &v)?;
        }
        if let Some(v) = lookup("GASDYN_STATE_TOLERANCE") {
            self.state_tolerance = parse_var("GASDYN_STATE_TOLERANCE", &v)?;
        }
        if let Some(v) = lookup("GASDYN_MAX_CONNECTIONS") {
            self.max_connections = parse_var("GASDYN_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("GASDYN_ACQUIRE_TIMEOUT_SECS") {
            self.acquire_timeout_secs = parse_var("GASDYN_ACQUIRE_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    /// Apply CLI overrides. `bind_address` wins over `port`.
    pub fn apply_cli(
        &mut self,
        database_url: Option<String>,
        bind_address: Option<String>,
        port: Option<u16>,
    ) {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(addr) = bind_address {
            self.bind_address = addr;
        } else if let Some(p) = port {
            self.bind_address = format!("0.0.0.0:{p}");
        }
    }

    /// Full load: defaults, file, process environment, CLI; then validation.
    ///
    /// A missing passphrase is fatal in release builds; debug builds fall back
    /// to a development passphrase with a warning.
    pub fn from_env(
        config_path: Option<PathBuf>,
        database_url: Option<String>,
        bind_address: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let path = config_path.or_else(|| std::env::var("GASDYN_CONFIG").ok().map(PathBuf::from));
        let mut config = match path {
            Some(p) => Self::load_from_file(&p)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_cli(database_url, bind_address, port);

        if config.passphrase.is_empty() {
            if cfg!(debug_assertions) {
                warn!("GASDYN_PASSPHRASE not set, using default dev passphrase — do NOT use in production");
                config.passphrase = DEV_PASSPHRASE.to_string();
            } else {
                return Err(ConfigError::Validation(vec![
                    "GASDYN_PASSPHRASE must be set".to_string(),
                ]));
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !self.state_tolerance.is_finite() || self.state_tolerance < 0.0 {
            errors.push(format!(
                "state_tolerance must be a non-negative number (got {})",
                self.state_tolerance
            ));
        }
        if self.max_connections == 0 {
            errors.push("max_connections must be at least 1".to_string());
        }
        if self.max_payload_size == 0 {
            errors.push("max_payload_size must be at least 1".to_string());
        }
        if self.bind_address.trim().is_empty() {
            errors.push("bind_address must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
