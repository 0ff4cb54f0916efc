//! Configuration file management for wayfarer.
//!
//! Provides a TOML-based config file at `~/.config/wayfarer/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use wayfarer_core::ai::GeminiConfig;
use wayfarer_core::share::DEFAULT_BASE_URL;
use wayfarer_core::SessionConfig;
use wayfarer_store::config::StoreConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub ai: AiSection,
    pub share: ShareSection,
    pub storage: StorageSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSection {
    pub model: String,
    pub endpoint: String,
    /// Upper bound on one generation request, in seconds.
    pub timeout_secs: u64,
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            model: GeminiConfig::DEFAULT_MODEL.to_string(),
            endpoint: GeminiConfig::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: SessionConfig::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareSection {
    /// Page address share links are built on.
    pub base_url: String,
}

impl Default for ShareSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the wayfarer config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/wayfarer` or
/// `~/.config/wayfarer`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("wayfarer");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("wayfarer")
}

/// Return the path to the wayfarer config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Like [`load_config`], but a missing file is `None` rather than an error.
/// A file that exists and fails to parse is still an error.
fn load_optional_config() -> Result<Option<ConfigFile>> {
    if config_path().exists() {
        load_config().map(Some)
    } else {
        Ok(None)
    }
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides<'a> {
    pub data_dir: Option<&'a Path>,
    pub model: Option<&'a str>,
    pub base_url: Option<&'a str>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct WayfarerConfig {
    pub store_config: StoreConfig,
    pub gemini: GeminiConfig,
    pub base_url: Url,
    pub timeout: Duration,
    /// Key from `WAYFARER_API_KEY`; replaces the stored key when set.
    pub api_key: Option<String>,
}

impl WayfarerConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Data dir: `--data-dir` > `WAYFARER_DATA_DIR` > `storage.data_dir` > XDG data dir
    /// - Model: `--model` > `WAYFARER_MODEL` > `ai.model` > `GeminiConfig::DEFAULT_MODEL`
    /// - Endpoint: `WAYFARER_ENDPOINT` > `ai.endpoint` > `GeminiConfig::DEFAULT_ENDPOINT`
    /// - Base URL: `--base-url` > `WAYFARER_BASE_URL` > `share.base_url` > `DEFAULT_BASE_URL`
    pub fn resolve(overrides: Overrides<'_>) -> Result<Self> {
        let file = load_optional_config()?.unwrap_or_default();

        let data_dir = overrides
            .data_dir
            .map(Path::to_path_buf)
            .or_else(|| env_value("WAYFARER_DATA_DIR").map(PathBuf::from))
            .or(file.storage.data_dir)
            .unwrap_or_else(StoreConfig::default_data_dir);

        let model = pick(overrides.model, "WAYFARER_MODEL", file.ai.model);
        let endpoint = pick(None, "WAYFARER_ENDPOINT", file.ai.endpoint);
        let base_url = pick(overrides.base_url, "WAYFARER_BASE_URL", file.share.base_url);
        let base_url =
            Url::parse(&base_url).with_context(|| format!("invalid base URL: {base_url:?}"))?;

        let timeout = Duration::from_secs(file.ai.timeout_secs.max(1));

        Ok(Self {
            store_config: StoreConfig::new(data_dir),
            gemini: GeminiConfig {
                endpoint,
                model,
                timeout,
            },
            base_url,
            timeout,
            api_key: env_value("WAYFARER_API_KEY"),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
        }
    }
}

/// A set, non-blank environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn pick(cli: Option<&str>, env_name: &str, file_value: String) -> String {
    cli.map(str::to_string)
        .or_else(|| env_value(env_name))
        .filter(|v| !v.is_empty())
        .unwrap_or(file_value)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
