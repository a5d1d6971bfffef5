//! HTTP access to the platform: short link expansion, feed lookup and media downloads.

use crate::config::{Settings, FEED_PATH};
use crate::tiktok::media::MediaStream;
use crate::tiktok::models::FeedDocument;
use crate::tiktok::TiktokError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client as HttpClient, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Network operations the resolve pipeline depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TiktokApi: Send + Sync {
    /// Reads the redirect target of a shortened link without following it.
    ///
    /// The `Location` header is returned verbatim.
    async fn expand_short_url(&self, url: &str) -> Result<String, TiktokError>;

    /// Queries the public feed endpoint for a single post.
    async fn fetch_post(&self, aweme_id: &str) -> Result<FeedDocument, TiktokError>;

    /// Opens a streaming download of a media URL.
    async fn open_media(&self, url: &str) -> Result<MediaStream, TiktokError>;
}

/// `reqwest`-backed implementation of [`TiktokApi`]
#[derive(Debug, Clone)]
pub struct TiktokClient {
    http: HttpClient,
    no_redirect: HttpClient,
    feed_base_url: String,
}

impl TiktokClient {
    /// Creates the client pair used for all outbound requests.
    ///
    /// # Errors
    ///
    /// Returns `TiktokError::Network` if the TLS backend cannot be initialised
    /// or the configured user agent is not a valid header value.
    pub fn new(settings: &Settings) -> Result<Self, TiktokError> {
        Self::with_options(
            &settings.tiktok_feed_base_url,
            settings.http_timeout(),
            &settings.tiktok_user_agent,
        )
    }

    /// Creates a client against an explicit feed host.
    ///
    /// # Errors
    ///
    /// See [`TiktokClient::new`].
    pub fn with_options(
        feed_base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, TiktokError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| TiktokError::Network(format!("Invalid user agent: {e}")))?,
        );

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers.clone())
            .build()?;
        let no_redirect = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            http,
            no_redirect,
            feed_base_url: feed_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn feed_url(&self) -> String {
        format!("{}{FEED_PATH}", self.feed_base_url)
    }
}

#[async_trait]
impl TiktokApi for TiktokClient {
    async fn expand_short_url(&self, url: &str) -> Result<String, TiktokError> {
        info!(url, "Link is shortened, getting full URL");
        let response = self.no_redirect.get(url).send().await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .filter(|location| !location.is_empty())
            .map(ToString::to_string)
            .ok_or(TiktokError::MissingRedirect)
    }

    async fn fetch_post(&self, aweme_id: &str) -> Result<FeedDocument, TiktokError> {
        let url = self.feed_url();
        info!(url = %url, aweme_id, "Querying the TikTok endpoint");

        let response = self
            .http
            .get(&url)
            .query(&[("aweme_id", aweme_id)])
            .send()
            .await?;
        let response = check_status(response).await?;

        let body = response.bytes().await?;
        let body: Value =
            serde_json::from_slice(&body).map_err(|e| TiktokError::Json(e.to_string()))?;

        FeedDocument::from_body(body)
    }

    async fn open_media(&self, url: &str) -> Result<MediaStream, TiktokError> {
        debug!(url, "Opening media stream");
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(MediaStream::from_response(response))
    }
}

/// Maps a non-success status to `TiktokError::Api`.
async fn check_status(response: Response) -> Result<Response, TiktokError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(TiktokError::Api(format_http_error(status, &error_text)))
}

fn format_http_error(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim_start();
    let is_html = trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<HTML");

    if is_html {
        // Raw HTML is useless in a log line
        return format!("{status} (Server returned HTML error page)");
    }

    if body.chars().count() > 500 {
        format!("{status} - {}... (truncated)", crate::utils::truncate_str(body, 500))
    } else {
        format!("{status} - {body}")
    }
}
