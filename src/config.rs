// Application configuration: defaults, optional JSON file, env overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::downloader::errors::ConfigError;

const APP_DIR: &str = "playlist-downloader";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory for downloads; relative paths resolve against the cwd
    pub output_dir: PathBuf,
    /// Explicit yt-dlp executable, skips auto-detection
    pub ytdlp_path: Option<String>,
    pub retries: u32,
    pub fragment_retries: u32,
    pub metadata_timeout_secs: u64,
    /// Proxy URL passed through to yt-dlp (e.g. "socks5h://127.0.0.1:1080")
    pub proxy: Option<String>,
    pub open_folder_on_success: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            ytdlp_path: None,
            retries: 3,
            fragment_retries: 3,
            metadata_timeout_secs: 30,
            proxy: None,
            open_folder_on_success: true,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/playlist-downloader/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config file if there is one, then apply environment overrides.
    /// A broken file is logged and ignored.
    pub fn load() -> Self {
        let mut config = match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "using default configuration");
                Self::default()
            }),
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Recognised variables: `YTDLP_PATH`, `PLAYLIST_DL_OUTPUT_DIR`, `PLAYLIST_DL_PROXY`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("YTDLP_PATH") {
            self.ytdlp_path = Some(path);
        }
        if let Some(dir) = non_empty("PLAYLIST_DL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(proxy) = non_empty("PLAYLIST_DL_PROXY") {
            self.proxy = Some(proxy);
        }
    }

    /// Output directory as an absolute path
    pub fn resolved_output_dir(&self) -> PathBuf {
        absolute(&self.output_dir)
    }
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
