//! Subtitle records produced by a query

use crate::candidates::Candidate;
use crate::guess::MetadataGuesser;
use crate::language::Language;
use crate::listing::ListingEntry;
use crate::matcher::{MediaType, sanitized_equal};
use crate::video::Video;
use bytes::Bytes;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::Path;

/// Properties of a video that a subtitle was found to match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchProperty {
    /// Movie title
    Title,
    /// Series name
    Series,
    Season,
    Episode,
    Year,
    ReleaseGroup,
    ImdbId,
}

/// One subtitle file inside a downloaded archive
///
/// Records coming from the same archive share its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRecord {
    pub language: Language,
    /// Link of the listing entry the archive came from
    pub page_link: String,
    pub subtitle_id: String,
    /// Member name inside the archive
    pub name: String,
    /// The complete downloaded archive
    pub content: Bytes,
    pub media_type: MediaType,
    pub title: String,
    pub title_br: String,
    pub season: Option<u32>,
    pub year: Option<u32>,
    pub imdb_id: Option<u32>,
    pub no_downloads: Option<u32>,
    pub rating: Option<u32>,
    pub timestamp: Option<NaiveDateTime>,
    pub featured: bool,
    pub multiple_episodes: bool,
}

impl SubtitleRecord {
    pub(crate) fn new(
        language: Language,
        candidate: &Candidate,
        entry: &ListingEntry,
        name: String,
        content: Bytes,
    ) -> Self {
        Self {
            language,
            page_link: entry.page_link.clone(),
            subtitle_id: entry.subtitle_id.clone(),
            name,
            content,
            media_type: candidate.media_type,
            title: candidate.title.clone(),
            title_br: candidate.title_br.clone(),
            season: candidate.season,
            year: candidate.year,
            imdb_id: candidate.imdb_id,
            no_downloads: entry.no_downloads,
            rating: entry.rating,
            timestamp: entry.timestamp,
            featured: entry.featured,
            multiple_episodes: entry.multiple_episodes,
        }
    }

    /// Unique id: the subtitle id plus the lowercased member name
    pub fn id(&self) -> String {
        format!("{}-{}", self.subtitle_id, self.name.to_lowercase())
    }

    /// Compares the record's release name with a video
    ///
    /// The release name is the best information available about a subtitle,
    /// so it is guessed and compared property by property. The catalog's IMDB
    /// id is only trusted for movies.
    pub fn matches_video<G>(&self, video: &Video, guesser: &G) -> HashSet<MatchProperty>
    where
        G: MetadataGuesser + ?Sized,
    {
        let guess = guesser.guess(release_name(&self.name), self.media_type);
        let mut matches = HashSet::new();

        let title_matches = guess
            .title
            .as_deref()
            .is_some_and(|title| sanitized_equal(video.title(), title, false));

        match video {
            Video::Episode { .. } => {
                if guess.media_type == MediaType::Episode {
                    if title_matches {
                        matches.insert(MatchProperty::Series);
                    }
                    if guess.season.is_some() && guess.season == video.season() {
                        matches.insert(MatchProperty::Season);
                    }
                    if guess.episode.is_some() && guess.episode == video.episode() {
                        matches.insert(MatchProperty::Episode);
                    }
                }
            }
            Video::Movie { imdb_id, .. } => {
                if title_matches {
                    matches.insert(MatchProperty::Title);
                }
                if self.media_type == MediaType::Movie
                    && imdb_id.is_some()
                    && self.imdb_id == *imdb_id
                {
                    matches.insert(MatchProperty::ImdbId);
                }
            }
        }

        if guess.year.is_some() && guess.year == video.year() {
            matches.insert(MatchProperty::Year);
        }

        if let (Some(guessed), Some(expected)) = (guess.release_group.as_deref(), video.release_group()) {
            if guessed.eq_ignore_ascii_case(expected) {
                matches.insert(MatchProperty::ReleaseGroup);
            }
        }

        matches
    }
}

/// Strips folders and the file extension off an archive member name
pub(crate) fn release_name(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guess::ReleaseNameGuesser;

    fn record(name: &str, media_type: MediaType) -> SubtitleRecord {
        let candidate = Candidate {
            id: "24551".to_string(),
            media_type,
            title: "Breaking Bad".to_string(),
            title_br: "Breaking Bad - 4ª Temporada".to_string(),
            season: Some(4),
            year: Some(2011),
            imdb_id: Some(903747),
        };
        let entry = ListingEntry {
            subtitle_id: "5a1b2c3d4e5f6".to_string(),
            page_link: "/download/5a1b2c3d4e5f6/x/y".to_string(),
            name: "Breaking.Bad.S04.HDTV".to_string(),
            no_downloads: Some(10),
            rating: Some(8),
            timestamp: None,
            featured: false,
            multiple_episodes: true,
        };

        SubtitleRecord::new(
            Language::BrazilianPortuguese,
            &candidate,
            &entry,
            name.to_string(),
            Bytes::from_static(b"archive"),
        )
    }

    #[test]
    fn test_id_lowercases_name() {
        let record = record("Breaking.Bad.S04E03.HDTV.srt", MediaType::Episode);
        assert_eq!(record.id(), "5a1b2c3d4e5f6-breaking.bad.s04e03.hdtv.srt");
    }

    #[test]
    fn test_release_name() {
        assert_eq!(release_name("Breaking.Bad.S04E03.srt"), "Breaking.Bad.S04E03");
        assert_eq!(release_name("Season 4/Breaking.Bad.S04E03.srt"), "Breaking.Bad.S04E03");
    }

    #[test]
    fn test_matches_episode_video() {
        let record = record("Breaking.Bad.S04E03.HDTV.x264-ASAP[ettv].srt", MediaType::Episode);
        let video = Video::Episode {
            series: "Breaking Bad".to_string(),
            season: 4,
            episode: 3,
            year: None,
            release_group: Some("asap".to_string()),
        };

        let matches = record.matches_video(&video, &ReleaseNameGuesser);
        assert_eq!(
            matches,
            HashSet::from([
                MatchProperty::Series,
                MatchProperty::Season,
                MatchProperty::Episode,
                MatchProperty::ReleaseGroup,
            ])
        );
    }

    #[test]
    fn test_matches_movie_video_by_imdb_id() {
        let record = record("Up.2009.720p.BluRay.x264-SPARKS.srt", MediaType::Movie);
        let video = Video::Movie {
            title: "Up".to_string(),
            year: Some(2009),
            imdb_id: Some(903747),
            release_group: None,
        };

        let matches = record.matches_video(&video, &ReleaseNameGuesser);
        assert_eq!(
            matches,
            HashSet::from([MatchProperty::Title, MatchProperty::Year, MatchProperty::ImdbId])
        );
    }
}
