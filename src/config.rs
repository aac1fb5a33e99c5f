//! Provider configuration
//!
//! Everything that may drift with the catalog's wording (server location,
//! heuristic patterns, the watermark marker) lives here instead of being
//! hard-coded in the pipeline. A [`ProviderConfig`] can be read from a TOML
//! file; credentials may also come from the environment.

use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::archive::NameFilter;

/// Archives kept in memory per provider unless configured otherwise
pub const DEFAULT_ARCHIVE_MEMO_CAPACITY: usize = 32;

/// Environment variable overriding the configured username
pub const USERNAME_ENV: &str = "LEGENDASTV_USERNAME";
/// Environment variable overriding the configured password
pub const PASSWORD_ENV: &str = "LEGENDASTV_PASSWORD";

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Only one of username and password was given
    #[error("Username and password must be specified together")]
    Credentials,

    /// One of the heuristic patterns does not compile
    #[error("Invalid {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        source: regex::Error,
    },
}

/// Heuristic patterns used while normalizing and scraping catalog data
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Season number inside a localized title, e.g. "Breaking Bad - 4ª Temporada"
    pub season: String,
    /// IMDB id, bare or prefixed with `t`/`tt`
    pub imdb_id: String,
    /// Download count and rating, e.g. "12345 downloads, nota 10"
    pub rating: String,
    /// Last update, e.g. "25/12/2014 - 19:25"
    pub timestamp: String,
    /// Marker in front of pack names, e.g. "(p)Breaking.Bad.S05"
    pub pack_marker: String,
    /// Subtitle id inside a download link, e.g. "/download/560014472eb4d/foo/bar"
    pub download_link: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            season: r"(?i).*? - (\d{1,2}).*?((emporada)|(Season))".to_string(),
            imdb_id: r"t{0,2}(\d+)".to_string(),
            rating: r"(\d*) downloads, nota (\d{0,2})".to_string(),
            timestamp: r"(\d{1,2}/\d{1,2}/\d{2,4} - \d{1,2}:\d{1,2})".to_string(),
            pack_marker: r"^\(p\)".to_string(),
            download_link: r"/download/(\w+)/.+".to_string(),
        }
    }
}

/// Compiled form of [`PatternConfig`]
#[derive(Debug, Clone)]
pub struct Patterns {
    pub season: Regex,
    pub imdb_id: Regex,
    pub rating: Regex,
    pub timestamp: Regex,
    pub pack_marker: Regex,
    pub download_link: Regex,
}

impl PatternConfig {
    /// Compiles every pattern, naming the first one that fails
    pub fn compile(&self) -> Result<Patterns, ConfigError> {
        fn compile(name: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
            Regex::new(pattern).map_err(|source| ConfigError::Pattern { name, source })
        }

        Ok(Patterns {
            season: compile("season", &self.season)?,
            imdb_id: compile("imdb_id", &self.imdb_id)?,
            rating: compile("rating", &self.rating)?,
            timestamp: compile("timestamp", &self.timestamp)?,
            pack_marker: compile("pack_marker", &self.pack_marker)?,
            download_link: compile("download_link", &self.download_link)?,
        })
    }
}

impl Default for Patterns {
    fn default() -> Self {
        PatternConfig::default()
            .compile()
            .expect("built-in patterns compile")
    }
}

/// Configuration for the legendas.tv provider
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the catalog, without trailing slash
    pub server_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Deadline applied to every single request
    pub timeout_secs: u64,
    /// How long candidate search results stay cached; `None` disables caching
    pub candidate_cache_ttl_secs: Option<u64>,
    /// How many downloaded archives a provider keeps in memory; 0 disables reuse
    pub archive_memo_capacity: usize,
    /// File extensions (with leading dot) that count as subtitles
    pub subtitle_extensions: Vec<String>,
    /// Archive members containing this marker are site signatures, not subtitles
    pub watermark: String,
    pub patterns: PatternConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let filter = NameFilter::default();
        Self {
            server_url: "http://legendas.tv".to_string(),
            username: None,
            password: None,
            timeout_secs: 10,
            // Three weeks
            candidate_cache_ttl_secs: Some(21 * 24 * 60 * 60),
            archive_memo_capacity: DEFAULT_ARCHIVE_MEMO_CAPACITY,
            subtitle_extensions: filter.extensions,
            watermark: filter.watermark,
            patterns: PatternConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Parses a configuration from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Lets `LEGENDASTV_USERNAME` / `LEGENDASTV_PASSWORD` override the credentials
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(username) = env::var(USERNAME_ENV) {
            self.username = Some(username);
        }
        if let Ok(password) = env::var(PASSWORD_ENV) {
            self.password = Some(password);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn candidate_cache_ttl(&self) -> Option<Duration> {
        self.candidate_cache_ttl_secs.map(Duration::from_secs)
    }

    /// Returns the credentials to log in with, if any
    ///
    /// Fails when only one half of the credentials is configured.
    pub fn credentials(&self) -> Result<Option<(&str, &str)>, ConfigError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Some((username, password))),
            (None, None) => Ok(None),
            _ => Err(ConfigError::Credentials),
        }
    }

    /// Validates the configuration and compiles it into runtime settings
    pub fn settings(&self) -> Result<ProviderSettings, ConfigError> {
        self.credentials()?;
        Ok(ProviderSettings {
            server_url: self.server_url.trim_end_matches('/').to_string(),
            patterns: self.patterns.compile()?,
            archive_memo_capacity: self.archive_memo_capacity,
            name_filter: NameFilter {
                extensions: self
                    .subtitle_extensions
                    .iter()
                    .map(|ext| ext.to_lowercase())
                    .collect(),
                watermark: self.watermark.to_lowercase(),
            },
        })
    }
}

/// Validated, compiled settings consumed by the pipeline
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub server_url: String,
    pub patterns: Patterns,
    pub name_filter: NameFilter,
    pub archive_memo_capacity: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            server_url: ProviderConfig::default().server_url,
            patterns: Patterns::default(),
            name_filter: NameFilter::default(),
            archive_memo_capacity: DEFAULT_ARCHIVE_MEMO_CAPACITY,
        }
    }
}
