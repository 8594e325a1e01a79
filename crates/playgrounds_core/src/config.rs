use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::connection::DEFAULT_ATLAS_EXECUTABLE;
use crate::snapshot::DEFAULT_SNAPSHOT_BASE_URL;

pub const DEFAULT_CONFIG_FILENAME: &str = ".playgrounds.toml";
pub const DEFAULT_DATABASE_NAME: &str = "playground";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PlaygroundConfig {
    #[serde(default)]
    pub snapshot: SnapshotSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub atlas: AtlasSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SnapshotSection {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct DatabaseSection {
    pub name: Option<String>,
    pub connect_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AtlasSection {
    pub executable: Option<String>,
}

/// Values the import pipeline runs with, after env and file overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub snapshot_base_url: String,
    pub http_timeout: Duration,
    pub database_name: String,
    pub connect_timeout: Duration,
    pub atlas_executable: String,
}

impl PlaygroundConfig {
    pub fn settings(&self) -> ImportSettings {
        self.settings_with_lookup(|key| env::var(key).ok())
    }

    fn settings_with_lookup<F>(&self, lookup_env: F) -> ImportSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup_env(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let lookup_ms = |key: &str| lookup(key).and_then(|value| value.parse::<u64>().ok());

        ImportSettings {
            snapshot_base_url: lookup("PLAYGROUND_SNAPSHOT_BASE_URL")
                .or_else(|| self.snapshot.base_url.clone())
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_BASE_URL.to_string()),
            http_timeout: Duration::from_millis(
                lookup_ms("PLAYGROUND_HTTP_TIMEOUT_MS")
                    .or(self.snapshot.timeout_ms)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_MS),
            ),
            database_name: lookup("PLAYGROUND_DATABASE")
                .or_else(|| self.database.name.clone())
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            connect_timeout: Duration::from_millis(
                lookup_ms("PLAYGROUND_CONNECT_TIMEOUT_MS")
                    .or(self.database.connect_timeout_ms)
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            ),
            atlas_executable: lookup("ATLAS_CLI_EXECUTABLE")
                .or_else(|| self.atlas.executable.clone())
                .unwrap_or_else(|| DEFAULT_ATLAS_EXECUTABLE.to_string()),
        }
    }
}

/// Load and parse a PlaygroundConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<PlaygroundConfig> {
    if !config_path.exists() {
        return Ok(PlaygroundConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: PlaygroundConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}
