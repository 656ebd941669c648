//! Configuration types for Tervis components.
//!
//! Configuration is layered: compiled defaults, then an optional
//! `tervis.toml` file, then environment variables and CLI flags applied by
//! the binary. Every section of the file is optional, and so is every key
//! inside a section.
//!
//! ```toml
//! [search]
//! max_results = 12
//!
//! [throttle]
//! text_daily_limit = 20
//! voice_daily_limit = 10
//!
//! [ai]
//! model = "gemini-2.0-flash"
//! timeout_secs = 8
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

/// Database connection pool configuration.
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

/// HTTP client configuration for outbound calls (news, translation).
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Bounds applied by the suggestion service and the directory filter.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum professionals returned by one search.
    pub max_results: usize,
    /// Maximum location suggestions returned by one typeahead call.
    pub max_suggestions: usize,
    /// Suggestion queries shorter than this (in characters) never reach the store.
    pub min_suggestion_chars: usize,
    /// Professional descriptions are cut to this many characters.
    pub description_max_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 12,
            max_suggestions: 20,
            min_suggestion_chars: 2,
            description_max_chars: 160,
        }
    }
}

/// Daily ceilings enforced by the usage throttle.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThrottleConfig {
    pub text_daily_limit: u32,
    pub voice_daily_limit: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            text_daily_limit: 20,
            voice_daily_limit: 10,
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    /// Upper bound for one generateContent round trip.
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 8,
        }
    }
}

/// Health news aggregation settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NewsConfig {
    pub source_url: String,
    pub max_articles: usize,
    /// Number of article pages fetched at the same time.
    pub concurrency: usize,
    pub translate: bool,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            source_url: "https://healthnews.today/".to_string(),
            max_articles: 10,
            concurrency: 4,
            translate: true,
        }
    }
}

/// Root of `tervis.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    pub search: SearchConfig,
    pub throttle: ThrottleConfig,
    pub ai: AiConfig,
    pub news: NewsConfig,
}

/// Returns `$XDG_CONFIG_HOME/tervis/tervis.toml` (or the platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tervis").join("tervis.toml"))
}

/// Loads the service configuration.
///
/// A missing file yields the defaults; a file that exists but cannot be read
/// or parsed is an error, so typos are not silently ignored.
pub fn load_service_config(path: Option<&Path>) -> Result<ServiceConfig, AppError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(ServiceConfig::default()),
        },
    };

    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(ServiceConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;

    toml::from_str(&raw).map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))
}
