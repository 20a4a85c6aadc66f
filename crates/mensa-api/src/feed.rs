use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use thiserror::Error;
use tracing::{debug, info};

use crate::document::{parse_document, FeedDocument};

pub const DEFAULT_FEED_URL: &str =
    "https://www.studentenwerk-hannover.de/fileadmin/user_upload/Speiseplan/SP-UTF8.xml";
pub const DEFAULT_USER_AGENT: &str = "MensaApp/1.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Upstream returned an empty body")]
    EmptyBody,

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("XML parsing failed: {0}")]
    Xml(String),
}

impl FeedError {
    /// True when the body arrived but could not be read as a feed document.
    /// Every other variant means the fetch itself failed.
    pub fn is_parse(&self) -> bool {
        matches!(self, FeedError::Xml(_))
    }
}

/// Where and how to fetch the feed
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Client for the upstream meal plan feed.
///
/// Makes exactly one request per call. There is no retry here: a failed
/// fetch goes straight back to the caller.
pub struct FeedClient {
    client: reqwest::Client,
    config: FeedClientConfig,
}

impl FeedClient {
    pub fn new(config: FeedClientConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Fetch the raw feed body
    pub async fn fetch_body(&self) -> crate::Result<String> {
        info!("Fetching meal plan from {}", self.config.url);

        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        if body.trim().is_empty() {
            return Err(FeedError::EmptyBody);
        }

        debug!("Received {} bytes of feed data", body.len());
        Ok(body)
    }

    /// Fetch the feed and parse it into rows
    pub async fn fetch_document(&self) -> crate::Result<FeedDocument> {
        let body = self.fetch_body().await?;
        let document = parse_document(&body)?;
        info!("Parsed feed with {} rows", document.rows.len());
        Ok(document)
    }

    fn classify(&self, err: reqwest::Error) -> FeedError {
        if err.is_timeout() {
            FeedError::Timeout(self.config.timeout)
        } else {
            FeedError::Request(err)
        }
    }
}
