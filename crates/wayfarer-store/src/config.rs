use std::env;
use std::path::{Path, PathBuf};

/// Storage configuration.
///
/// Reads from the `WAYFARER_DATA_DIR` environment variable, falling back to
/// `$XDG_DATA_HOME/wayfarer` or `~/.local/share/wayfarer` when unset.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the key-value store file.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// File name of the key-value store inside `data_dir`.
    pub const STORE_FILE: &str = "store.json";

    /// Build a config from the environment.
    ///
    /// Priority: `WAYFARER_DATA_DIR` env var, then the XDG default.
    pub fn from_env() -> Self {
        let data_dir = env::var("WAYFARER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_data_dir());
        Self { data_dir }
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The default data directory, always in XDG layout.
    pub fn default_data_dir() -> PathBuf {
        if let Ok(xdg) = env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("wayfarer");
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("share")
            .join("wayfarer")
    }

    /// Full path of the store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(Self::STORE_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
