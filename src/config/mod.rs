use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::utils::error::TelemetryError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: SqliteConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub database_path: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
    pub enable_wal: bool,
    pub cache_size_kb: u32,
    pub sync_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: SqliteConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: "data/telemetry.db".to_string(),
            max_connections: 5,
            busy_timeout_ms: 30000,
            enable_wal: true,
            cache_size_kb: 1000,
            sync_mode: "NORMAL".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    /// Loads the TOML config at `path`, writing out the defaults on first run.
    pub fn load_or_create(path: &Path) -> Result<Self, TelemetryError> {
        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)
                .map_err(|e| TelemetryError::Config(format!("failed to parse {}: {}", path.display(), e)))
        } else {
            let config = Self::default();
            config.save(path)?;
            info!("Created default configuration at {}", path.display());
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), TelemetryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| TelemetryError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}
