//! Source resolution: turn a page source into decodable image bytes.
//!
//! Inline payloads are parsed in place. Remote locators go through an
//! [`ImageFetcher`]; the response body is wrapped in the same
//! [`InlineImage`] form captured pages use, so decoding sees one shape.
//!
//! The fetcher is a trait so tests (and embedders with their own HTTP
//! stack or cache) can supply bytes without a network.

use crate::collection::PageSource;
use crate::config::CompileConfig;
use crate::error::{FetchFailure, PageError, PagebindError};
use crate::payload::{InlineImage, FALLBACK_MIME};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};

/// Raw body and declared type of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Fetch-capable transport for remote page sources.
///
/// Non-success statuses and transport errors are reported as
/// [`FetchFailure`]; they become placeholder pages, never hard errors.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchFailure>;
}

/// [`ImageFetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    pub fn new(config: &CompileConfig) -> Result<Self, PagebindError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PagebindError::Internal(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            timeout_secs: config.fetch_timeout_secs,
        })
    }
}

#[async_trait]
impl ImageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchFailure> {
        info!("Fetching page image: {}", url);

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchFailure::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                FetchFailure::Transport(e.to_string())
            }
        };

        let response = self.client.get(url).send().await.map_err(classify)?;

        if !response.status().is_success() {
            return Err(FetchFailure::Status {
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());

        let bytes = response.bytes().await.map_err(classify)?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// Resolve one entry's source to image bytes.
///
/// `page_num` is the 1-based ordinal used in error reports.
pub async fn resolve_source(
    fetcher: &dyn ImageFetcher,
    source: &PageSource,
    page_num: usize,
) -> Result<InlineImage, PageError> {
    match source {
        PageSource::Inline(data_url) => {
            InlineImage::parse(data_url).map_err(|detail| PageError::InvalidPayload {
                page: page_num,
                detail,
            })
        }
        PageSource::Remote(url) => {
            let fetched = fetcher
                .fetch(url)
                .await
                .map_err(|failure| PageError::FetchFailed {
                    page: page_num,
                    label: source.log_label(page_num),
                    reason: failure.to_string(),
                })?;
            let mime = fetched
                .content_type
                .unwrap_or_else(|| FALLBACK_MIME.to_string());
            Ok(InlineImage::new(mime, fetched.bytes))
        }
    }
}
