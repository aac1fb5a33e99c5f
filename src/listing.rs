//! Listing pagination
//!
//! For one candidate and language, legendas.tv lists the uploaded subtitle
//! releases over several HTML pages chained by a "carregar mais" (load more)
//! link. [`parse_listing_page`] scrapes one page; [`Listing`] walks the chain
//! lazily and yields entries until no further page is announced.

use crate::candidates::parse_digits;
use crate::catalog::{CatalogClient, CatalogError};
use crate::config::Patterns;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Format of the last update shown in listing blocks, e.g. "25/12/2014 - 19:25"
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y - %H:%M";

/// Text of the link leading to the next listing page
const LOAD_MORE_TEXT: &str = "carregar mais";

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.f_left").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static LOAD_MORE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a.load_more").unwrap());

/// One uploaded subtitle release (or pack) for a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Id used to download the archive
    pub subtitle_id: String,
    pub page_link: String,
    /// Release name, without pack marker and with `/` turned into `.`
    pub name: String,
    pub no_downloads: Option<u32>,
    /// Community rating, 0 to 10
    pub rating: Option<u32>,
    /// Last update of the archive
    pub timestamp: Option<NaiveDateTime>,
    /// Editorially highlighted by the site
    pub featured: bool,
    /// The archive bundles several episodes
    pub multiple_episodes: bool,
}

/// The entries of one listing page and the link to the next one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,
    pub next_url: Option<String>,
}

/// URL of the first listing page for a candidate in a language
pub fn listing_url(base_url: &str, candidate_id: &str, language_code: u8) -> String {
    format!(
        "{}/util/carrega_legendas_busca_filme/{}/{}",
        base_url, candidate_id, language_code
    )
}

/// Scrapes the listing blocks and the next page link out of one page
///
/// Blocks missing the release link or a download id are skipped.
pub fn parse_listing_page(html: &str, base_url: &str, patterns: &Patterns) -> ListingPage {
    let document = Html::parse_document(html);

    let entries = document
        .select(&BLOCK_SELECTOR)
        .filter_map(|block| parse_entry(block, patterns))
        .collect();

    let next_url = document
        .select(&LOAD_MORE_SELECTOR)
        .find(|link| link.text().collect::<String>().trim() == LOAD_MORE_TEXT)
        .and_then(|link| link.value().attr("href"))
        .map(|href| format!("{}{}", base_url, href));

    ListingPage { entries, next_url }
}

fn parse_entry(block: ElementRef<'_>, patterns: &Patterns) -> Option<ListingEntry> {
    let link = block
        .select(&PARAGRAPH_SELECTOR)
        .next()?
        .select(&LINK_SELECTOR)
        .next()?;

    let raw_name = link.text().collect::<String>().trim().to_string();
    let page_link = link.value().attr("href")?.to_string();

    let Some(subtitle_id) = patterns
        .download_link
        .captures(&page_link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
    else {
        debug!("Skipping listing entry without download id: {}", page_link);
        return None;
    };

    // Slashes are a naming habit on the site, not directories
    let name = patterns
        .pack_marker
        .replace(&raw_name, "")
        .replace('/', ".");
    if name.is_empty() {
        return None;
    }

    let multiple_episodes =
        has_ancestor_div(block, "pack") || patterns.pack_marker.is_match(&raw_name);
    let featured = has_ancestor_div(block, "destaque");

    let text = block.text().collect::<String>();

    let (no_downloads, rating) = match patterns.rating.captures(&text) {
        Some(caps) => (
            parse_digits(caps.get(1).map(|m| m.as_str())),
            parse_digits(caps.get(2).map(|m| m.as_str())),
        ),
        None => (None, None),
    };

    let timestamp = patterns
        .timestamp
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| NaiveDateTime::parse_from_str(m.as_str(), TIMESTAMP_FORMAT).ok());

    Some(ListingEntry {
        subtitle_id,
        page_link,
        name,
        no_downloads,
        rating,
        timestamp,
        featured,
        multiple_episodes,
    })
}

/// Returns true if some enclosing `div` carries `class`
fn has_ancestor_div(element: ElementRef<'_>, class: &str) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            ancestor.value().name() == "div" && ancestor.value().classes().any(|c| c == class)
        })
}

/// Lazy producer of listing entries across all pages
///
/// Pages are fetched one at a time, only once the entries of the previous
/// page are consumed. The walk ends when a page has no "load more" link, when
/// a page links back to one already visited, or after the first fetch error.
pub struct Listing<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    base_url: &'a str,
    patterns: &'a Patterns,
    next_url: Option<String>,
    visited: HashSet<String>,
    buffered: VecDeque<ListingEntry>,
}

impl<'a, C: CatalogClient + ?Sized> Listing<'a, C> {
    pub fn new(client: &'a C, base_url: &'a str, patterns: &'a Patterns, first_url: String) -> Self {
        Self {
            client,
            base_url,
            patterns,
            next_url: Some(first_url),
            visited: HashSet::new(),
            buffered: VecDeque::new(),
        }
    }
}

impl<C: CatalogClient + ?Sized> Iterator for Listing<'_, C> {
    type Item = Result<ListingEntry, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffered.pop_front() {
                return Some(Ok(entry));
            }

            let url = self.next_url.take()?;
            if !self.visited.insert(url.clone()) {
                debug!("Listing page {} was already visited", url);
                return None;
            }

            debug!("Fetching listing page {}", url);
            let html = match self.client.fetch_page(&url) {
                Ok(html) => html,
                Err(e) => return Some(Err(e)),
            };

            let page = parse_listing_page(&html, self.base_url, self.patterns);
            self.buffered.extend(page.entries);
            self.next_url = page.next_url;
        }
    }
}
