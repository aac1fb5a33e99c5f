//! Catalog access
//!
//! This module defines the contract the pipeline needs from the legendas.tv
//! catalog (search suggestions, listing pages and archive downloads) and a
//! blocking HTTP implementation of it.

mod legendastv;

pub use legendastv::LegendasTvClient;

use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while talking to the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request could not be sent or timed out
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body could not be parsed
    #[error("Failed to parse catalog response: {0}")]
    ParseError(String),

    /// The login was rejected
    #[error("Invalid username or password for {0}")]
    AuthenticationFailed(String),
}

/// Trait for catalog backends
///
/// Every call blocks until the response arrives or the backend's deadline
/// expires. Implementations do not retry.
pub trait CatalogClient {
    /// Returns the raw suggestion records for a keyword
    ///
    /// Records are returned untouched; their schema is not guaranteed.
    fn search(&self, keyword: &str) -> Result<Vec<serde_json::Value>, CatalogError>;

    /// Fetches an HTML page by absolute URL
    fn fetch_page(&self, url: &str) -> Result<String, CatalogError>;

    /// Downloads the compressed archive behind a subtitle id
    fn download_archive(&self, subtitle_id: &str) -> Result<Bytes, CatalogError>;
}
