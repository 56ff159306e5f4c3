//! Configuration management for courier.
//!
//! Settings come from an optional TOML file plus `COURIER_*` environment
//! overrides; command-line flags win over both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "courier.toml";

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Read-buffer size for streaming downloads.
    pub chunk_size: usize,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Delay applied after each HTTP request, in milliseconds.
    pub request_delay_ms: u64,
    /// User agent override for HTTP retrieval.
    pub user_agent: Option<String>,
    /// Default directory downloads are written to.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            request_timeout_secs: 30,
            request_delay_ms: 0,
            user_agent: None,
            output_dir: PathBuf::from("downloads"),
        }
    }
}

impl Settings {
    /// Load settings from the given file (or the default location), then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut settings = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            debug!("No settings file at {}, using defaults", path.display());
            Self::default()
        };

        settings.apply_env();
        settings.output_dir = expand_path(&settings.output_dir);
        Ok(settings)
    }

    /// Apply `COURIER_*` environment variable overrides.
    fn apply_env(&mut self) {
        if let Some(v) = env_parse("COURIER_CHUNK_SIZE") {
            self.chunk_size = v;
        }
        if let Some(v) = env_parse("COURIER_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_parse("COURIER_REQUEST_DELAY_MS") {
            self.request_delay_ms = v;
        }
        if let Ok(v) = std::env::var("COURIER_USER_AGENT") {
            if !v.is_empty() {
                self.user_agent = Some(v);
            }
        }
        if let Ok(v) = std::env::var("COURIER_OUTPUT_DIR") {
            if !v.is_empty() {
                self.output_dir = PathBuf::from(v);
            }
        }
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Post-request delay.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Expand `~` and environment variables in a configured path.
fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => {
            let expanded = shellexpand::full(s)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| s.to_string());
            PathBuf::from(expanded)
        }
        None => path.to_path_buf(),
    }
}
