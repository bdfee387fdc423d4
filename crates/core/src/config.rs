//! Application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name under the platform config/data directories.
pub const APP_DIR: &str = "gamevault";
/// Configuration file name.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides, e.g. `GAMEVAULT__STORAGE_KEY`.
pub const ENV_PREFIX: &str = "GAMEVAULT";

const DEFAULT_CONFIG: &str = r#"# gamevault configuration
#
# Every key is optional; the values below are the built-in defaults.
# Environment variables override this file, e.g. GAMEVAULT__STORAGE_KEY=games.

# Directory holding the collection file and logs.
# data_dir = "~/.local/share/gamevault"

storage_key = "games"
seed_on_first_run = true

[catalog]
endpoints = [
  "https://api.steampowered.com/ISteamApps/GetAppList/v2/",
  "https://api.steampowered.com/ISteamApps/GetAppList/v0002/",
  "https://api.steampowered.com/ISteamApps/GetAppList/v1/",
]
timeout_secs = 5
max_results = 15
cover_url_template = "https://shared.akamai.steamstatic.com/store_item_assets/steam/apps/{appid}/library_600x900_2x.jpg"
"#;

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory of the file storage backend.
    pub data_dir: PathBuf,
    /// Storage key holding the whole collection.
    pub storage_key: String,
    /// Write the example collection when storage is empty.
    pub seed_on_first_run: bool,
    /// Catalog lookup settings.
    pub catalog: CatalogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".gamevault")),
            storage_key: crate::store::DEFAULT_STORAGE_KEY.to_string(),
            seed_on_first_run: true,
            catalog: CatalogConfig::default(),
        }
    }
}

/// Settings for the remote cover-art catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Alternate app-list endpoints, tried in order.
    pub endpoints: Vec<String>,
    /// Timeout for each endpoint attempt.
    pub timeout_secs: u64,
    /// Maximum candidates returned by a search.
    pub max_results: usize,
    /// Cover URL with an `{appid}` placeholder.
    pub cover_url_template: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://api.steampowered.com/ISteamApps/GetAppList/v2/".to_string(),
                "https://api.steampowered.com/ISteamApps/GetAppList/v0002/".to_string(),
                "https://api.steampowered.com/ISteamApps/GetAppList/v1/".to_string(),
            ],
            timeout_secs: 5,
            max_results: 15,
            cover_url_template: "https://shared.akamai.steamstatic.com/store_item_assets/steam/apps/{appid}/library_600x900_2x.jpg".to_string(),
        }
    }
}

impl AppConfig {
    /// Default location of the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// Load from the default path plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load from `path` (optional) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Write the commented default configuration if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::config_path();
    write_default_config(&path)?;
    Ok(path)
}

/// Write the default configuration to `path` unless the file exists.
/// Returns whether a file was written.
pub fn write_default_config(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(true)
}
