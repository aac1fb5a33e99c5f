//! Candidate normalization
//!
//! The catalog's search suggestions are loosely structured: a mix of movies,
//! series seasons and collections, with numbers stored as strings and season
//! information sometimes only present inside the localized title. This module
//! resolves all of that once, at the ingestion boundary, into [`Candidate`]s
//! and keeps only those that plausibly match the query.

mod raw_types;

use crate::config::Patterns;
use crate::matcher::{self, MediaMetadata, MediaType, QueryDescriptor};
use raw_types::RawSearchHit;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A catalog movie or series season that may hold the wanted subtitles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Catalog id
    pub id: String,
    pub media_type: MediaType,
    /// Original title
    pub title: String,
    /// Localized (Brazilian) title
    pub title_br: String,
    pub season: Option<u32>,
    pub year: Option<u32>,
    pub imdb_id: Option<u32>,
}

impl Candidate {
    /// Candidate data in the shape the matcher compares
    pub fn metadata(&self) -> MediaMetadata {
        MediaMetadata {
            title: Some(self.title.clone()).filter(|title| !title.is_empty()),
            media_type: self.media_type,
            season: self.season,
            episode: None,
            year: self.year,
            release_group: None,
        }
    }
}

/// Maps the catalog's type code; unknown codes are treated as movies
pub fn media_type_from_code(code: Option<&str>) -> MediaType {
    match code {
        Some("S") | Some("C") => MediaType::Episode,
        _ => MediaType::Movie,
    }
}

/// Parses text made only of ASCII digits; anything else is `None`
pub(crate) fn parse_digits(text: Option<&str>) -> Option<u32> {
    text.filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|t| t.parse().ok())
}

/// Converts one raw suggestion into a candidate
///
/// Returns `None` if the record lacks the fields every candidate needs.
pub fn parse_candidate(hit: &Value, patterns: &Patterns) -> Option<Candidate> {
    let hit = match RawSearchHit::deserialize(hit) {
        Ok(hit) => hit,
        Err(e) => {
            debug!("Skipping malformed search result: {}", e);
            return None;
        }
    };
    let source = hit.source;

    let Some(id) = source.id_filme.filter(|id| !id.is_empty()) else {
        debug!("Skipping search result without id");
        return None;
    };

    let imdb_id = source
        .id_imdb
        .as_deref()
        .and_then(|text| patterns.imdb_id.captures(text))
        .and_then(|caps| parse_digits(caps.get(1).map(|m| m.as_str())));

    let title_br = source.dsc_nome_br.unwrap_or_default();

    // Season information is often only part of the localized title
    let season_text = match source.temporada.filter(|season| !season.is_empty()) {
        Some(season) => Some(season),
        None => patterns
            .season
            .captures(&title_br)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
    };

    Some(Candidate {
        id,
        media_type: media_type_from_code(source.tipo.as_deref()),
        title: source.dsc_nome.unwrap_or_default(),
        title_br,
        season: parse_digits(season_text.as_deref()),
        year: parse_digits(source.dsc_data_lancamento.as_deref()),
        imdb_id,
    })
}

/// Normalizes raw suggestions and keeps the ones matching the query
///
/// Only movie/season information is compared at this stage, so the episode
/// number is ignored.
pub fn normalize_candidates(
    hits: &[Value],
    query: &QueryDescriptor,
    patterns: &Patterns,
) -> Vec<Candidate> {
    let candidates: Vec<Candidate> = hits
        .iter()
        .filter_map(|hit| parse_candidate(hit, patterns))
        .filter(|candidate| matcher::matches(&candidate.metadata(), query, true))
        .collect();

    debug!("Titles found: {:?}", candidates);
    candidates
}
