//! legendastv - Find subtitles on legendas.tv
//!
//! This library searches the legendas.tv catalog for the subtitles of a movie
//! or TV episode. A query narrows down in stages, each filtered by the same
//! metadata matcher: catalog candidates, their listing entries and finally the
//! subtitle files inside the downloaded archives.

mod archive;
mod cache;
mod candidates;
mod catalog;
mod config;
mod guess;
mod language;
mod listing;
mod matcher;
mod provider;
mod subtitle;
mod temp;
mod video;

#[cfg(test)]
mod fake;

// Re-export error types
pub use archive::ArchiveError;
pub use cache::CacheError;
pub use catalog::CatalogError;
pub use config::ConfigError;
pub use language::UnsupportedLanguage;

pub use archive::{
    ArchiveFormat, NameFilter, SUBTITLE_EXTENSIONS, WATERMARK, detect_format, extract_subtitle,
    fix_line_endings, list_subtitle_names,
};
pub use cache::CacheStorage;
pub use candidates::{Candidate, media_type_from_code, normalize_candidates, parse_candidate};
pub use catalog::{CatalogClient, LegendasTvClient};
pub use config::{
    DEFAULT_ARCHIVE_MEMO_CAPACITY, PatternConfig, Patterns, ProviderConfig, ProviderSettings,
};
pub use guess::{MetadataGuesser, ReleaseNameGuesser};
pub use language::Language;
pub use listing::{Listing, ListingEntry, ListingPage, listing_url, parse_listing_page};
pub use matcher::{MediaMetadata, MediaType, QueryDescriptor, matches, sanitize, sanitized_equal};
pub use provider::{LegendasTvProvider, rank};
pub use subtitle::{MatchProperty, SubtitleRecord};
pub use video::Video;

use thiserror::Error;
use tracing::{debug, warn};

/// Name of the on-disk candidate cache
const CANDIDATE_CACHE_NAME: &str = "candidates";

/// Top-level error type for legendastv operations
#[derive(Debug, Error)]
pub enum LegendasTvError {
    /// Error while talking to the catalog
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error while reading an archive
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Sets up a provider talking to legendas.tv
///
/// Validates the configuration, logs in when credentials are configured and
/// attaches the on-disk candidate cache when a TTL is set. A cache directory
/// that cannot be created only disables caching.
///
/// # Examples
///
/// ```no_run
/// use legendastv::{Language, ProviderConfig, connect};
///
/// let config = ProviderConfig::default().with_env_overrides();
/// let mut provider = connect(&config).unwrap();
///
/// let subtitles = provider
///     .query(Language::BrazilianPortuguese, "Breaking Bad", Some(4), Some(3), None)
///     .unwrap();
///
/// if let Some(best) = subtitles.first() {
///     let content = provider.extract(best).unwrap();
///     println!("{}: {:?} bytes", best.name, content.map(|c| c.len()));
/// }
///
/// provider.terminate().unwrap();
/// ```
pub fn connect(config: &ProviderConfig) -> Result<LegendasTvProvider<LegendasTvClient>, LegendasTvError> {
    let settings = config.settings()?;

    let mut client = LegendasTvClient::new(config)?;
    if let Some((username, password)) = config.credentials()? {
        client.login(username, password)?;
    }

    let mut provider = LegendasTvProvider::new(client, settings);

    if let Some(ttl) = config.candidate_cache_ttl() {
        match CacheStorage::<Vec<Candidate>>::open(CANDIDATE_CACHE_NAME, Some(ttl)) {
            Ok(cache) => {
                debug!("Caching candidates in {}", cache.cache_dir().display());
                provider = provider.with_candidate_cache(cache);
            }
            Err(e) => warn!("Candidate cache disabled: {}", e),
        }
    }

    Ok(provider)
}
