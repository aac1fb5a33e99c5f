/// legendas.tv catalog client implementation.
use super::{CatalogClient, CatalogError};
use crate::config::ProviderConfig;
use bytes::Bytes;
use reqwest::blocking::{Client, Response};
use scraper::{Html, Selector};
use tracing::{debug, info};

/// Text of the alert shown when a login is rejected
const INVALID_LOGIN_MESSAGE: &str = "Usuário ou senha inválidos";

/// Catalog client for legendas.tv
///
/// Keeps a cookie-backed session so that a login carries over to every
/// following request. Each request is bound by the configured timeout.
pub struct LegendasTvClient {
    client: Client,
    base_url: String,
    logged_in: bool,
}

impl LegendasTvClient {
    /// Creates a client for the configured server, without logging in
    pub fn new(config: &ProviderConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            logged_in: false,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Logs in with the given credentials
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AuthenticationFailed`] if the site rejects the
    /// credentials, or a transport error if the request itself fails.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), CatalogError> {
        info!("Logging in as {}", username);

        let url = format!("{}/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("_method", "POST"),
                ("data[User][username]", username),
                ("data[User][password]", password),
            ])
            .send()
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        let body = ensure_success(response, &url)?
            .text()
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        if is_login_rejected(&body) {
            return Err(CatalogError::AuthenticationFailed(username.to_string()));
        }

        debug!("Logged in");
        self.logged_in = true;
        Ok(())
    }

    /// Ends the session if one was started
    pub fn logout(&mut self) -> Result<(), CatalogError> {
        if !self.logged_in {
            return Ok(());
        }

        info!("Logging out");
        self.get(&format!("{}/users/logout", self.base_url))?;
        debug!("Logged out");
        self.logged_in = false;
        Ok(())
    }

    fn get(&self, url: &str) -> Result<Response, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CatalogError::RequestError(e.to_string()))?;

        ensure_success(response, url)
    }
}

impl CatalogClient for LegendasTvClient {
    fn search(&self, keyword: &str) -> Result<Vec<serde_json::Value>, CatalogError> {
        info!("Searching titles using the keyword {}", keyword);

        let url = format!(
            "{}/legenda/sugestao/{}",
            self.base_url,
            urlencoding::encode(keyword)
        );

        self.get(&url)?
            .json()
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }

    fn fetch_page(&self, url: &str) -> Result<String, CatalogError> {
        self.get(url)?
            .text()
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }

    fn download_archive(&self, subtitle_id: &str) -> Result<Bytes, CatalogError> {
        let url = format!("{}/downloadarquivo/{}", self.base_url, subtitle_id);

        self.get(&url)?
            .bytes()
            .map_err(|e| CatalogError::RequestError(e.to_string()))
    }
}

/// Turns any non-success status into [`CatalogError::HttpStatus`]
fn ensure_success(response: Response, url: &str) -> Result<Response, CatalogError> {
    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

/// Looks for the alert legendas.tv renders after a failed login
fn is_login_rejected(html: &str) -> bool {
    let Ok(selector) = Selector::parse("div.alert-error") else {
        return false;
    };

    Html::parse_document(html)
        .select(&selector)
        .any(|alert| alert.text().collect::<String>().contains(INVALID_LOGIN_MESSAGE))
}
