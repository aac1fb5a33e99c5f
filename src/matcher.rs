//! Metadata matching module
//!
//! One predicate decides whether some "actual" metadata (a catalog candidate,
//! a guessed listing name or a guessed archive member name) describes the
//! movie or episode the user asked for. The same predicate runs at every
//! filtering stage; only the `ignore_episode` strictness flag changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// The two kinds of media the catalog knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A feature film
    Movie,
    /// A single episode (or a season, at the catalog level) of a series
    Episode,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Episode => write!(f, "episode"),
        }
    }
}

/// Metadata describing what a catalog entry or release name actually is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Movie title or series name
    pub title: Option<String>,
    /// Movie or episode
    pub media_type: MediaType,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub year: Option<u32>,
    /// Release group, already stripped of bracketed tokens
    pub release_group: Option<String>,
}

impl MediaMetadata {
    /// Creates metadata of the given type with nothing else known
    pub fn new(media_type: MediaType) -> Self {
        Self {
            title: None,
            media_type,
            season: None,
            episode: None,
            year: None,
            release_group: None,
        }
    }
}

/// What the user is looking for
///
/// Built once per search and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub year: Option<u32>,
}

impl QueryDescriptor {
    pub fn new(
        title: impl Into<String>,
        season: Option<u32>,
        episode: Option<u32>,
        year: Option<u32>,
    ) -> Self {
        Self {
            title: title.into(),
            season,
            episode,
            year,
        }
    }

    /// A query asks for an episode exactly when it names a (non-zero) season
    pub fn media_type(&self) -> MediaType {
        match self.season {
            Some(season) if season > 0 => MediaType::Episode,
            _ => MediaType::Movie,
        }
    }
}

/// Normalizes a title for fuzzy comparison
///
/// Decomposes the string, drops diacritics, lowercases it and keeps only
/// alphanumeric characters, so "Pokémon: O Filme" becomes "pokemonofilme".
pub fn sanitize(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Compares two titles after sanitizing them
///
/// With `allow_partial`, one sanitized string containing the other also
/// counts as equal. Titles that sanitize to nothing never match.
pub fn sanitized_equal(first: &str, second: &str, allow_partial: bool) -> bool {
    let first = sanitize(first);
    let second = sanitize(second);

    if first.is_empty() || second.is_empty() {
        return false;
    }

    if allow_partial {
        first.contains(&second) || second.contains(&first)
    } else {
        first == second
    }
}

/// Decides whether `actual` describes what `expected` asks for
///
/// Movies:
/// - the type must be movie
/// - the title must match, partially
/// - years that are both known must be equal; if either is unknown the
///   title must match exactly instead
///
/// Episodes:
/// - the type must be episode
/// - the series title must match, partially
/// - the season must be equal
/// - the episode must be equal, unless `ignore_episode` is set
pub fn matches(actual: &MediaMetadata, expected: &QueryDescriptor, ignore_episode: bool) -> bool {
    let expected_type = expected.media_type();
    if actual.media_type != expected_type {
        return false;
    }

    let Some(actual_title) = actual.title.as_deref() else {
        return false;
    };

    if !sanitized_equal(&expected.title, actual_title, true) {
        return false;
    }

    match expected_type {
        MediaType::Movie => match (expected.year, actual.year) {
            (Some(expected_year), Some(actual_year)) => expected_year == actual_year,
            _ => sanitized_equal(&expected.title, actual_title, false),
        },
        MediaType::Episode => {
            if actual.season != expected.season {
                return false;
            }
            ignore_episode || actual.episode == expected.episode
        }
    }
}
