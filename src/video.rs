//! Video descriptors handed in by the caller

/// The video subtitles are searched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Video {
    /// One episode of a series
    Episode {
        series: String,
        season: u32,
        episode: u32,
        year: Option<u32>,
        release_group: Option<String>,
    },
    /// A movie
    Movie {
        title: String,
        year: Option<u32>,
        imdb_id: Option<u32>,
        release_group: Option<String>,
    },
}

impl Video {
    /// Movie title or series name
    pub fn title(&self) -> &str {
        match self {
            Video::Episode { series, .. } => series,
            Video::Movie { title, .. } => title,
        }
    }

    pub fn season(&self) -> Option<u32> {
        match self {
            Video::Episode { season, .. } => Some(*season),
            Video::Movie { .. } => None,
        }
    }

    pub fn episode(&self) -> Option<u32> {
        match self {
            Video::Episode { episode, .. } => Some(*episode),
            Video::Movie { .. } => None,
        }
    }

    pub fn year(&self) -> Option<u32> {
        match self {
            Video::Episode { year, .. } | Video::Movie { year, .. } => *year,
        }
    }

    pub fn release_group(&self) -> Option<&str> {
        match self {
            Video::Episode { release_group, .. } | Video::Movie { release_group, .. } => {
                release_group.as_deref()
            }
        }
    }
}
