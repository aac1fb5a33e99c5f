//! Query orchestration
//!
//! The provider drives the whole funnel for one query: catalog candidates,
//! their listing entries, the archives behind matching entries and finally
//! the subtitle files inside those archives. The same matcher filters at each
//! stage so that archives, the expensive part, are only downloaded for
//! entries that already look right.

use crate::archive;
use crate::cache::CacheStorage;
use crate::candidates::{Candidate, normalize_candidates};
use crate::catalog::{CatalogClient, CatalogError, LegendasTvClient};
use crate::config::ProviderSettings;
use crate::guess::{MetadataGuesser, ReleaseNameGuesser};
use crate::language::Language;
use crate::listing::{Listing, listing_url};
use crate::matcher::{self, QueryDescriptor};
use crate::subtitle::{SubtitleRecord, release_name};
use crate::video::Video;
use crate::LegendasTvError;
use bytes::Bytes;
use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, warn};

/// An archive kept around for as long as its listing timestamp is unchanged
struct DownloadedArchive {
    timestamp: Option<NaiveDateTime>,
    content: Bytes,
}

/// Recently downloaded archives, keyed by subtitle id
///
/// Holds at most `capacity` archives and evicts the oldest download first.
/// A capacity of zero disables the memo.
struct ArchiveMemo {
    capacity: usize,
    archives: HashMap<String, DownloadedArchive>,
    order: VecDeque<String>,
}

impl ArchiveMemo {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            archives: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Returns the archive if it was downloaded for the same timestamp
    fn get(&self, subtitle_id: &str, timestamp: Option<NaiveDateTime>) -> Option<Bytes> {
        self.archives
            .get(subtitle_id)
            .filter(|archive| archive.timestamp == timestamp)
            .map(|archive| archive.content.clone())
    }

    fn insert(&mut self, subtitle_id: &str, timestamp: Option<NaiveDateTime>, content: Bytes) {
        if self.capacity == 0 {
            return;
        }

        if !self.archives.contains_key(subtitle_id) {
            if self.order.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.archives.remove(&oldest);
                }
            }
            self.order.push_back(subtitle_id.to_string());
        }

        self.archives
            .insert(subtitle_id.to_string(), DownloadedArchive { timestamp, content });
    }
}

/// Subtitle provider for legendas.tv
///
/// All requests run sequentially on the calling thread.
pub struct LegendasTvProvider<C, G = ReleaseNameGuesser>
where
    C: CatalogClient,
    G: MetadataGuesser,
{
    client: C,
    guesser: G,
    settings: ProviderSettings,
    candidate_cache: Option<CacheStorage<Vec<Candidate>>>,
    archives: RefCell<ArchiveMemo>,
}

impl<C: CatalogClient> LegendasTvProvider<C> {
    /// Creates a provider using the built-in release name guesser
    pub fn new(client: C, settings: ProviderSettings) -> Self {
        let archives = RefCell::new(ArchiveMemo::new(settings.archive_memo_capacity));
        Self {
            client,
            guesser: ReleaseNameGuesser,
            settings,
            candidate_cache: None,
            archives,
        }
    }
}

impl<C, G> LegendasTvProvider<C, G>
where
    C: CatalogClient,
    G: MetadataGuesser,
{
    /// Replaces the release name guesser
    pub fn with_guesser<H: MetadataGuesser>(self, guesser: H) -> LegendasTvProvider<C, H> {
        LegendasTvProvider {
            client: self.client,
            guesser,
            settings: self.settings,
            candidate_cache: self.candidate_cache,
            archives: self.archives,
        }
    }

    /// Memoizes candidate searches in the given cache
    pub fn with_candidate_cache(mut self, cache: CacheStorage<Vec<Candidate>>) -> Self {
        self.candidate_cache = Some(cache);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Finds the catalog movies or seasons matching the query
    ///
    /// Results are served from the candidate cache when one is configured.
    /// Cache failures are logged and otherwise ignored.
    pub fn search_candidates(&self, query: &QueryDescriptor) -> Result<Vec<Candidate>, CatalogError> {
        let cache_key = candidate_cache_key(query);

        if let Some(cache) = &self.candidate_cache {
            match cache.load(&cache_key) {
                Ok(Some(candidates)) => {
                    debug!("Using cached candidates for {}", query.title);
                    return Ok(candidates);
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring unreadable candidate cache: {}", e),
            }
        }

        let hits = self.client.search(&query.title)?;
        let candidates = normalize_candidates(&hits, query, &self.settings.patterns);

        if let Some(cache) = &self.candidate_cache {
            if let Err(e) = cache.store(&cache_key, &candidates) {
                warn!("Failed to cache candidates: {}", e);
            }
        }

        Ok(candidates)
    }

    /// Returns the subtitles in one language matching the parameters
    ///
    /// 1. look up matching catalog candidates
    /// 2. walk every candidate's listing pages
    /// 3. drop entries whose release name does not match
    /// 4. download the remaining archives and keep the matching files inside,
    ///    since one archive may bundle a whole season
    ///
    /// If a request fails after some subtitles were found, those subtitles
    /// are returned and the failure is logged; otherwise the failure is
    /// returned.
    pub fn query(
        &self,
        language: Language,
        title: &str,
        season: Option<u32>,
        episode: Option<u32>,
        year: Option<u32>,
    ) -> Result<Vec<SubtitleRecord>, LegendasTvError> {
        let query = QueryDescriptor::new(title, season, episode, year);
        let candidates = self.search_candidates(&query)?;

        let mut subtitles = Vec::new();
        for candidate in &candidates {
            if let Err(e) = self.collect_candidate(language, &query, candidate, &mut subtitles) {
                if subtitles.is_empty() {
                    return Err(e);
                }
                warn!(
                    "Stopping search for {} after error, keeping {} subtitle(s): {}",
                    title,
                    subtitles.len(),
                    e
                );
                break;
            }
        }

        rank(&mut subtitles);
        Ok(subtitles)
    }

    /// Returns the subtitles for a video in each of the requested languages
    ///
    /// Languages are searched in order; a failure keeps the subtitles found
    /// for earlier languages, unless none were found yet.
    pub fn list_subtitles(
        &self,
        video: &Video,
        languages: &[Language],
    ) -> Result<Vec<SubtitleRecord>, LegendasTvError> {
        let mut subtitles = Vec::new();

        for &language in languages {
            match self.query(
                language,
                video.title(),
                video.season(),
                video.episode(),
                video.year(),
            ) {
                Ok(found) => subtitles.extend(found),
                Err(e) if subtitles.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        "Stopping at language {} after error, keeping {} subtitle(s): {}",
                        language,
                        subtitles.len(),
                        e
                    );
                    break;
                }
            }
        }

        Ok(subtitles)
    }

    /// Extracts the subtitle file of a record from its archive
    ///
    /// Returns `Ok(None)` if the record's content is not a recognized archive.
    pub fn extract(&self, subtitle: &SubtitleRecord) -> Result<Option<Vec<u8>>, LegendasTvError> {
        Ok(archive::extract_subtitle(&subtitle.content, &subtitle.name)?)
    }

    fn collect_candidate(
        &self,
        language: Language,
        query: &QueryDescriptor,
        candidate: &Candidate,
        subtitles: &mut Vec<SubtitleRecord>,
    ) -> Result<(), LegendasTvError> {
        let base_url = self.settings.server_url.as_str();
        let first_page = listing_url(base_url, &candidate.id, language.legendastv_code());

        for entry in Listing::new(&self.client, base_url, &self.settings.patterns, first_page) {
            let entry = entry?;

            // Wrong type, season, episode or title
            let guess = self.guesser.guess(&entry.name, candidate.media_type);
            if !matcher::matches(&guess, query, entry.multiple_episodes) {
                debug!("Skipping non-matching entry {}", entry.name);
                continue;
            }

            // Release names are only known from inside the archive
            let content = self.download_content(&entry.subtitle_id, entry.timestamp)?;
            let names = match archive::list_subtitle_names(&content, &self.settings.name_filter) {
                Ok(names) => names,
                Err(e) => {
                    warn!("Skipping unreadable archive {}: {}", entry.subtitle_id, e);
                    continue;
                }
            };

            for name in names {
                let guess = self.guesser.guess(release_name(&name), candidate.media_type);
                if !matcher::matches(&guess, query, false) {
                    continue;
                }

                let subtitle = SubtitleRecord::new(language, candidate, &entry, name, content.clone());
                debug!("Found subtitle {}", subtitle.id());
                subtitles.push(subtitle);
            }
        }

        Ok(())
    }

    /// Downloads an archive unless the same version is already at hand
    ///
    /// The site updates archives in place, so a changed listing timestamp
    /// forces a new download.
    fn download_content(
        &self,
        subtitle_id: &str,
        timestamp: Option<NaiveDateTime>,
    ) -> Result<Bytes, CatalogError> {
        if let Some(content) = self.archives.borrow().get(subtitle_id, timestamp) {
            return Ok(content);
        }

        info!("Downloading subtitle_id {}. Last update on {:?}", subtitle_id, timestamp);
        let content = self.client.download_archive(subtitle_id)?;

        self.archives
            .borrow_mut()
            .insert(subtitle_id, timestamp, content.clone());

        Ok(content)
    }
}

impl<G: MetadataGuesser> LegendasTvProvider<LegendasTvClient, G> {
    /// Ends the site session, if one was started
    pub fn terminate(&mut self) -> Result<(), CatalogError> {
        self.client.logout()
    }
}

/// Cache key covering every query parameter
///
/// Hashed, since titles in any script have to survive file name sanitizing.
fn candidate_cache_key(query: &QueryDescriptor) -> String {
    let key = format!(
        "{:?}|{:?}|{:?}|{:?}",
        query.title, query.season, query.episode, query.year
    );

    blake3::hash(key.as_bytes()).to_hex().to_string()
}

/// Orders subtitles so that community-vetted ones come first
///
/// Descending by featured flag, download count and rating, with missing
/// numbers lowest. On a tie, single releases come before packs. The sort is
/// stable, so full ties keep their discovery order.
pub fn rank(subtitles: &mut [SubtitleRecord]) {
    subtitles.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.no_downloads.cmp(&a.no_downloads))
            .then_with(|| b.rating.cmp(&a.rating))
            .then_with(|| a.multiple_episodes.cmp(&b.multiple_episodes))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeCatalog, build_zip};
    use crate::matcher::MediaType;
    use serde_json::{Value, json};

    const BASE_URL: &str = "http://legendas.tv";

    const BREAKING_BAD_PAGE: &str = r#"
        <div class="gallery clearfix list_element">
          <article>
            <div class="destaque">
              <div class="f_left">
                <p><a href="/download/ddddddddddddd/Breaking_Bad/web">Breaking.Bad.S04E03.720p.WEB-DL</a></p>
                <p class="data">10 downloads, nota 5, enviado por <a href="/usuario/a">a</a> em 20/12/2014 - 10:00</p>
              </div>
            </div>
            <div class="">
              <div class="f_left">
                <p><a href="/download/aaaaaaaaaaaaa/Breaking_Bad/asap">Breaking.Bad.S04E03.HDTV.x264-ASAP</a></p>
                <p class="data">4321 downloads, nota 10, enviado por <a href="/usuario/b">b</a> em 25/12/2014 - 19:25</p>
              </div>
              <div class="f_left">
                <p><a href="/download/ccccccccccccc/Breaking_Bad/e05">Breaking.Bad.S04E05.HDTV.x264-LOL</a></p>
                <p class="data">50 downloads, nota 9, enviado por <a href="/usuario/c">c</a> em 26/12/2014 - 08:00</p>
              </div>
            </div>
            <div class="pack">
              <div class="f_left">
                <p><a href="/download/bbbbbbbbbbbbb/Breaking_Bad/pack">Breaking.Bad.S04.HDTV.x264</a></p>
                <p class="data">120 downloads, nota 8, enviado por <a href="/usuario/d">d</a> em 01/02/2015 - 08:05</p>
              </div>
            </div>
          </article>
        </div>
    "#;

    fn breaking_bad_hit(id: &str) -> Value {
        json!({
            "_source": {
                "id_filme": id,
                "id_imdb": "903747",
                "tipo": "S",
                "dsc_nome": "Breaking Bad",
                "dsc_nome_br": "Breaking Bad - 4ª Temporada",
                "temporada": "4",
                "dsc_data_lancamento": "2011"
            }
        })
    }

    fn page_url(candidate_id: &str, language: Language) -> String {
        listing_url(BASE_URL, candidate_id, language.legendastv_code())
    }

    fn breaking_bad_catalog() -> FakeCatalog {
        FakeCatalog::default()
            .with_search_results(vec![breaking_bad_hit("24551")])
            .with_page(&page_url("24551", Language::BrazilianPortuguese), BREAKING_BAD_PAGE)
            .with_archive(
                "ddddddddddddd",
                build_zip(&[("Breaking.Bad.S04E03.720p.WEB-DL.srt", "1\r\nweb\r\n")]),
            )
            .with_archive(
                "aaaaaaaaaaaaa",
                build_zip(&[
                    ("Breaking.Bad.S04E03.HDTV.x264-ASAP.srt", "1\r\nasap\r\n"),
                    ("legendas.tv.txt", "visit us"),
                ]),
            )
            .with_archive(
                "bbbbbbbbbbbbb",
                build_zip(&[
                    ("Breaking.Bad.S04E01.HDTV.x264-LOL.srt", "1"),
                    ("Breaking.Bad.S04E03.720p.HDTV.x264-IMMERSE.srt", "3"),
                    ("Breaking.Bad.S04E04.HDTV.x264-LOL.srt", "4"),
                    ("Legendas.TV.srt", "ad"),
                ]),
            )
    }

    fn query_breaking_bad<C: CatalogClient>(
        provider: &LegendasTvProvider<C>,
    ) -> Result<Vec<SubtitleRecord>, LegendasTvError> {
        provider.query(Language::BrazilianPortuguese, "Breaking Bad", Some(4), Some(3), None)
    }

    fn names(subtitles: &[SubtitleRecord]) -> Vec<&str> {
        subtitles.iter().map(|s| s.name.as_str()).collect()
    }

    fn ranked_record(featured: bool, downloads: u32, rating: u32, multiple_episodes: bool) -> SubtitleRecord {
        SubtitleRecord {
            language: Language::BrazilianPortuguese,
            page_link: String::new(),
            subtitle_id: format!("{featured}-{downloads}-{rating}-{multiple_episodes}"),
            name: "Show.S01E01.srt".to_string(),
            content: Bytes::new(),
            media_type: MediaType::Episode,
            title: "Show".to_string(),
            title_br: "Show".to_string(),
            season: Some(1),
            year: None,
            imdb_id: None,
            no_downloads: Some(downloads),
            rating: Some(rating),
            timestamp: None,
            featured,
            multiple_episodes,
        }
    }

    #[test]
    fn test_query_finds_matching_files_in_ranked_order() {
        let provider = LegendasTvProvider::new(breaking_bad_catalog(), ProviderSettings::default());

        let subtitles = query_breaking_bad(&provider).unwrap();

        assert_eq!(
            names(&subtitles),
            vec![
                "Breaking.Bad.S04E03.720p.WEB-DL.srt",
                "Breaking.Bad.S04E03.HDTV.x264-ASAP.srt",
                "Breaking.Bad.S04E03.720p.HDTV.x264-IMMERSE.srt",
            ]
        );

        let featured = &subtitles[0];
        assert!(featured.featured);
        assert_eq!(featured.subtitle_id, "ddddddddddddd");
        assert_eq!(featured.media_type, MediaType::Episode);
        assert_eq!(featured.title, "Breaking Bad");
        assert_eq!(featured.season, Some(4));
        assert_eq!(featured.imdb_id, Some(903747));

        let pack = &subtitles[2];
        assert!(pack.multiple_episodes);
        assert_eq!(pack.no_downloads, Some(120));
        assert_eq!(pack.rating, Some(8));
        assert_eq!(pack.page_link, "/download/bbbbbbbbbbbbb/Breaking_Bad/pack");
    }

    #[test]
    fn test_only_matching_entries_are_downloaded() {
        let provider = LegendasTvProvider::new(breaking_bad_catalog(), ProviderSettings::default());

        query_breaking_bad(&provider).unwrap();

        assert_eq!(provider.client().searches(), vec!["Breaking Bad"]);
        assert_eq!(
            provider.client().downloads(),
            vec!["ddddddddddddd", "aaaaaaaaaaaaa", "bbbbbbbbbbbbb"]
        );
    }

    #[test]
    fn test_query_is_idempotent_and_reuses_archives() {
        let provider = LegendasTvProvider::new(breaking_bad_catalog(), ProviderSettings::default());

        let first = query_breaking_bad(&provider).unwrap();
        let second = query_breaking_bad(&provider).unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.client().downloads().len(), 3);
    }

    #[test]
    fn test_updated_archive_is_downloaded_again() {
        let mut provider = LegendasTvProvider::new(breaking_bad_catalog(), ProviderSettings::default());
        query_breaking_bad(&provider).unwrap();

        let updated = BREAKING_BAD_PAGE.replace("25/12/2014 - 19:25", "02/01/2015 - 11:00");
        provider
            .client_mut()
            .set_page(&page_url("24551", Language::BrazilianPortuguese), &updated);
        query_breaking_bad(&provider).unwrap();

        assert_eq!(
            provider.client().downloads(),
            vec!["ddddddddddddd", "aaaaaaaaaaaaa", "bbbbbbbbbbbbb", "aaaaaaaaaaaaa"]
        );
    }

    #[test]
    fn test_unreadable_archives_are_skipped() {
        let catalog = breaking_bad_catalog()
            .with_archive("aaaaaaaaaaaaa", b"PK\x03\x04garbage that is not a zip".to_vec())
            .with_archive("bbbbbbbbbbbbb", b"<html>removed</html>".to_vec());
        let provider = LegendasTvProvider::new(catalog, ProviderSettings::default());

        let subtitles = query_breaking_bad(&provider).unwrap();
        assert_eq!(names(&subtitles), vec!["Breaking.Bad.S04E03.720p.WEB-DL.srt"]);
    }

    #[test]
    fn test_error_without_results_is_returned() {
        let catalog = FakeCatalog::default().with_search_results(vec![breaking_bad_hit("24551")]);
        let provider = LegendasTvProvider::new(catalog, ProviderSettings::default());

        let result = query_breaking_bad(&provider);
        assert!(matches!(
            result,
            Err(LegendasTvError::Catalog(CatalogError::HttpStatus { status: 404, .. }))
        ));
    }

    #[test]
    fn test_error_after_results_keeps_them() {
        // The second candidate has no listing page, so fetching it fails
        let catalog = breaking_bad_catalog()
            .with_search_results(vec![breaking_bad_hit("24551"), breaking_bad_hit("24552")]);
        let provider = LegendasTvProvider::new(catalog, ProviderSettings::default());

        let subtitles = query_breaking_bad(&provider).unwrap();
        assert_eq!(subtitles.len(), 3);
        assert_eq!(provider.client().fetched_pages().len(), 2);
    }

    #[test]
    fn test_query_movie() {
        let page = r#"
            <div class="f_left">
              <p><a href="/download/eeeeeeeeeeeee/Up/sparks">Up.2009.720p.BluRay.x264-SPARKS</a></p>
              <p class="data">300 downloads, nota 9, enviado por <a href="/usuario/e">e</a> em 10/10/2010 - 10:10</p>
            </div>
            <div class="f_left">
              <p><a href="/download/fffffffffffff/Up/other">Up.2.2011.DVDRip.XviD-AMIABLE</a></p>
            </div>
        "#;
        let catalog = FakeCatalog::default()
            .with_search_results(vec![
                json!({"_source": {"id_filme": "1", "tipo": "M", "dsc_nome": "Up", "dsc_data_lancamento": "2009"}}),
            ])
            .with_page(&page_url("1", Language::English), page)
            .with_archive(
                "eeeeeeeeeeeee",
                build_zip(&[("Up.2009.720p.BluRay.x264-SPARKS.srt", "1\r\nBalloons\r\n")]),
            );
        let provider = LegendasTvProvider::new(catalog, ProviderSettings::default());

        let subtitles = provider
            .query(Language::English, "Up", None, None, Some(2009))
            .unwrap();

        assert_eq!(names(&subtitles), vec!["Up.2009.720p.BluRay.x264-SPARKS.srt"]);
        assert_eq!(subtitles[0].media_type, MediaType::Movie);
        assert_eq!(subtitles[0].language, Language::English);
        assert_eq!(provider.client().downloads(), vec!["eeeeeeeeeeeee"]);

        let content = provider.extract(&subtitles[0]).unwrap();
        assert_eq!(content.as_deref(), Some(&b"1\nBalloons\n"[..]));
    }

    #[test]
    fn test_list_subtitles_keeps_earlier_languages() {
        // No English listing is registered
        let provider = LegendasTvProvider::new(breaking_bad_catalog(), ProviderSettings::default());
        let video = Video::Episode {
            series: "Breaking Bad".to_string(),
            season: 4,
            episode: 3,
            year: None,
            release_group: None,
        };

        let subtitles = provider
            .list_subtitles(&video, &[Language::BrazilianPortuguese, Language::English])
            .unwrap();

        assert_eq!(subtitles.len(), 3);
        assert!(subtitles.iter().all(|s| s.language == Language::BrazilianPortuguese));
    }

    #[test]
    fn test_candidate_cache_skips_search() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStorage::open_in(dir.path(), "candidates", None).unwrap();
        let provider = LegendasTvProvider::new(breaking_bad_catalog(), ProviderSettings::default())
            .with_candidate_cache(cache);

        let first = query_breaking_bad(&provider).unwrap();
        let second = query_breaking_bad(&provider).unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.client().searches().len(), 1);
    }

    #[test]
    fn test_candidate_cache_separates_non_ascii_titles() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStorage::open_in(dir.path(), "candidates", None).unwrap();
        let catalog = FakeCatalog::default().with_search_results(vec![
            json!({"_source": {"id_filme": "1", "tipo": "M", "dsc_nome": "東京物語"}}),
            json!({"_source": {"id_filme": "2", "tipo": "M", "dsc_nome": "七人の侍"}}),
        ]);
        let provider =
            LegendasTvProvider::new(catalog, ProviderSettings::default()).with_candidate_cache(cache);

        let tokyo = provider
            .search_candidates(&QueryDescriptor::new("東京物語", None, None, None))
            .unwrap();
        let samurai = provider
            .search_candidates(&QueryDescriptor::new("七人の侍", None, None, None))
            .unwrap();

        assert_eq!(tokyo.first().map(|c| c.id.as_str()), Some("1"));
        assert_eq!(samurai.first().map(|c| c.id.as_str()), Some("2"));
        assert_eq!(provider.client().searches(), vec!["東京物語", "七人の侍"]);
    }

    #[test]
    fn test_candidate_cache_key_covers_every_parameter() {
        let keys = [
            candidate_cache_key(&QueryDescriptor::new("Lost", Some(1), Some(2), None)),
            candidate_cache_key(&QueryDescriptor::new("Lost", Some(1), None, Some(2))),
            candidate_cache_key(&QueryDescriptor::new("Lost", Some(12), None, None)),
            candidate_cache_key(&QueryDescriptor::new("Лост", Some(1), Some(2), None)),
            candidate_cache_key(&QueryDescriptor::new("Лист", Some(1), Some(2), None)),
        ];

        let unique: std::collections::HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(
            keys[0],
            candidate_cache_key(&QueryDescriptor::new("Lost", Some(1), Some(2), None))
        );
    }

    #[test]
    fn test_archive_memo_evicts_oldest() {
        let mut memo = ArchiveMemo::new(2);
        memo.insert("a", None, Bytes::from_static(b"a"));
        memo.insert("b", None, Bytes::from_static(b"b"));
        // Replacing an archive does not change its age
        memo.insert("a", None, Bytes::from_static(b"a2"));
        memo.insert("c", None, Bytes::from_static(b"c"));

        assert_eq!(memo.get("a", None), None);
        assert_eq!(memo.get("b", None), Some(Bytes::from_static(b"b")));
        assert_eq!(memo.get("c", None), Some(Bytes::from_static(b"c")));
    }

    #[test]
    fn test_archive_memo_requires_same_timestamp() {
        let timestamp = chrono::NaiveDate::from_ymd_opt(2014, 12, 25).and_then(|d| d.and_hms_opt(19, 25, 0));
        let mut memo = ArchiveMemo::new(2);
        memo.insert("a", timestamp, Bytes::from_static(b"a"));

        assert_eq!(memo.get("a", timestamp), Some(Bytes::from_static(b"a")));
        assert_eq!(memo.get("a", None), None);
    }

    #[test]
    fn test_archive_memo_disabled() {
        let mut memo = ArchiveMemo::new(0);
        memo.insert("a", None, Bytes::from_static(b"a"));

        assert_eq!(memo.get("a", None), None);
    }

    #[test]
    fn test_archive_memo_capacity_bounds_reuse() {
        let settings = ProviderSettings {
            archive_memo_capacity: 2,
            ..ProviderSettings::default()
        };
        let provider = LegendasTvProvider::new(breaking_bad_catalog(), settings);

        let first = query_breaking_bad(&provider).unwrap();
        let second = query_breaking_bad(&provider).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            provider.client().downloads(),
            vec![
                "ddddddddddddd",
                "aaaaaaaaaaaaa",
                "bbbbbbbbbbbbb",
                "ddddddddddddd",
                "aaaaaaaaaaaaa",
                "bbbbbbbbbbbbb",
            ]
        );
    }

    #[test]
    fn test_rank() {
        let mut subtitles = vec![
            ranked_record(false, 0, 0, false),
            ranked_record(true, 10, 8, true),
            ranked_record(false, 100, 10, false),
            ranked_record(true, 10, 8, false),
        ];

        rank(&mut subtitles);

        let order: Vec<(bool, Option<u32>, Option<u32>, bool)> = subtitles
            .iter()
            .map(|s| (s.featured, s.no_downloads, s.rating, s.multiple_episodes))
            .collect();
        assert_eq!(
            order,
            vec![
                (true, Some(10), Some(8), false),
                (true, Some(10), Some(8), true),
                (false, Some(100), Some(10), false),
                (false, Some(0), Some(0), false),
            ]
        );
    }

    #[test]
    fn test_rank_missing_numbers_lowest_and_stable() {
        let mut unknown = ranked_record(false, 0, 0, false);
        unknown.no_downloads = None;
        unknown.rating = None;
        unknown.subtitle_id = "unknown".to_string();

        let mut first_tie = ranked_record(false, 5, 5, false);
        first_tie.subtitle_id = "first".to_string();
        let mut second_tie = ranked_record(false, 5, 5, false);
        second_tie.subtitle_id = "second".to_string();

        let mut subtitles = vec![unknown, first_tie, ranked_record(false, 0, 0, false), second_tie];
        rank(&mut subtitles);

        let ids: Vec<&str> = subtitles.iter().map(|s| s.subtitle_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "false-0-0-false", "unknown"]);
    }
}
