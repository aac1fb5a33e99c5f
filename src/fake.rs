//! In-memory catalog and archive builders for tests

use crate::catalog::{CatalogClient, CatalogError};
use bytes::Bytes;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Catalog serving canned responses and recording every request
///
/// Unknown pages and archives answer with HTTP 404.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    search_results: Vec<Value>,
    pages: HashMap<String, String>,
    archives: HashMap<String, Bytes>,
    searches: RefCell<Vec<String>>,
    fetched_pages: RefCell<Vec<String>>,
    downloads: RefCell<Vec<String>>,
}

impl FakeCatalog {
    pub(crate) fn with_search_results(mut self, results: Vec<Value>) -> Self {
        self.search_results = results;
        self
    }

    pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
        self.set_page(url, html);
        self
    }

    /// Replaces a page after construction, e.g. to simulate a site update
    pub(crate) fn set_page(&mut self, url: &str, html: &str) {
        self.pages.insert(url.to_string(), html.to_string());
    }

    pub(crate) fn with_archive(mut self, subtitle_id: &str, content: Vec<u8>) -> Self {
        self.archives.insert(subtitle_id.to_string(), Bytes::from(content));
        self
    }

    pub(crate) fn searches(&self) -> Vec<String> {
        self.searches.borrow().clone()
    }

    pub(crate) fn fetched_pages(&self) -> Vec<String> {
        self.fetched_pages.borrow().clone()
    }

    pub(crate) fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

fn not_found(url: &str) -> CatalogError {
    CatalogError::HttpStatus {
        status: 404,
        url: url.to_string(),
    }
}

impl CatalogClient for FakeCatalog {
    fn search(&self, keyword: &str) -> Result<Vec<Value>, CatalogError> {
        self.searches.borrow_mut().push(keyword.to_string());
        Ok(self.search_results.clone())
    }

    fn fetch_page(&self, url: &str) -> Result<String, CatalogError> {
        self.fetched_pages.borrow_mut().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| not_found(url))
    }

    fn download_archive(&self, subtitle_id: &str) -> Result<Bytes, CatalogError> {
        self.downloads.borrow_mut().push(subtitle_id.to_string());
        self.archives
            .get(subtitle_id)
            .cloned()
            .ok_or_else(|| not_found(subtitle_id))
    }
}

/// Builds a ZIP archive holding the given members, in order
pub(crate) fn build_zip(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}
