//! Release name guessing
//!
//! Listing entries and archive members only carry a free-text release name
//! such as `Breaking.Bad.S05E03.HDTV.x264-ASAP`. A [`MetadataGuesser`] turns
//! such a name into [`MediaMetadata`] so it can be matched against a query.

use crate::matcher::{MediaMetadata, MediaType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Trait for extracting structured metadata out of a release name
///
/// Implementors must treat `type_hint` as authoritative: the catalog already
/// knows whether the entry belongs to a movie or a series.
pub trait MetadataGuesser {
    /// Guesses title, season, episode, year and release group from `name`
    fn guess(&self, name: &str, type_hint: MediaType) -> MediaMetadata;
}

/// S01E02, s1e2, S01 E02
static EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,2}) ?e(\d{1,3})").unwrap());

/// 1x02, 01x02
static CROSS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").unwrap());

/// Season packs: S05, Season 5, Temporada 5
static SEASON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:s(\d{1,2})|(?:season|temporada) ?(\d{1,2}))\b").unwrap()
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").unwrap());

/// Tokens that never belong to a title
static QUALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|720p|576p|480p|hdtv|pdtv|web-?dl|webrip|web|bluray|brrip|bdrip|dvdrip|hdrip|x264|x265|h264|h265|xvid|proper|repack|dublado|legendado)\b",
    )
    .unwrap()
});

static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9\[\]]+)$").unwrap());

/// Bracketed tokens glued to a release group, e.g. `LOL[ettv]`
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\w+\]").unwrap());

/// Regex-based guesser for scene-style release names
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseNameGuesser;

impl MetadataGuesser for ReleaseNameGuesser {
    fn guess(&self, name: &str, type_hint: MediaType) -> MediaMetadata {
        let cleaned = name.replace(['.', '_'], " ");
        let cleaned = cleaned.trim();

        let mut metadata = MediaMetadata::new(type_hint);
        // Byte offset where the title ends, i.e. the first non-title token
        let mut title_end = cleaned.len();

        if let Some(caps) = EPISODE_RE
            .captures(cleaned)
            .or_else(|| CROSS_RE.captures(cleaned))
        {
            metadata.season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            metadata.episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            if let Some(m) = caps.get(0) {
                title_end = title_end.min(m.start());
            }
        } else if let Some(caps) = SEASON_RE.captures(cleaned) {
            metadata.season = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse().ok());
            if let Some(m) = caps.get(0) {
                title_end = title_end.min(m.start());
            }
        }

        // The last year wins so that titles like "Blade Runner 2049" survive
        if let Some(m) = YEAR_RE
            .find_iter(cleaned)
            .filter(|m| m.start() > 0)
            .last()
        {
            metadata.year = m.as_str().parse().ok();
            title_end = title_end.min(m.start());
        }

        if let Some(m) = QUALITY_RE.find(cleaned) {
            title_end = title_end.min(m.start());
        }

        // "WEB-DL" at the very end is a source, not a group
        let ends_with_quality = QUALITY_RE
            .find_iter(cleaned)
            .any(|m| m.end() == cleaned.len());

        // A group only follows some non-title token, so "X-Men" stays a title
        let group = GROUP_RE.captures(cleaned).filter(|caps| {
            !ends_with_quality && caps.get(0).is_some_and(|m| title_end < m.start())
        });

        if let Some(caps) = group {
            let group = BRACKET_RE.replace_all(&caps[1], "").to_string();
            if !group.is_empty() {
                metadata.release_group = Some(group);
            }
            if let Some(m) = caps.get(0) {
                title_end = title_end.min(m.start());
            }
        }

        let title = cleaned[..title_end]
            .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '(' | '['))
            .trim();
        if !title.is_empty() {
            metadata.title = Some(title.to_string());
        }

        metadata
    }
}
