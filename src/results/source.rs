use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} returned HTTP {status}")]
    Status { source_name: String, status: u16 },
    #[error("{source_name} returned {len} bytes, expected at least {min}")]
    TooShort {
        source_name: String,
        len: usize,
        min: usize,
    },
}

/// Anything that can hand back the raw scrape document.
#[async_trait]
pub trait ResultSource: Send + Sync {
    async fn fetch_document(&self) -> Result<String>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Scrape source backed by a single HTTP endpoint returning raw wikitext.
pub struct HttpSource {
    http: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("medal-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpSource {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ResultSource for HttpSource {
    fn name(&self) -> &str {
        "wiki"
    }

    async fn fetch_document(&self) -> Result<String> {
        debug!("Fetching results document from {}", self.url);
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("Results source request failed")?;

        if !resp.status().is_success() {
            return Err(SourceError::Status {
                source_name: self.name().to_string(),
                status: resp.status().as_u16(),
            }
            .into());
        }

        resp.text().await.context("Failed to read results document")
    }
}

/// Single best-effort fetch. Any failure, or a document shorter than
/// `min_len`, is logged and yields `None` so callers fall back to the
/// confirmed results alone. No retries.
pub async fn fetch_best_effort(source: &dyn ResultSource, min_len: usize) -> Option<String> {
    let doc = match source.fetch_document().await {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Source '{}' unavailable: {:#}", source.name(), e);
            return None;
        }
    };
    if doc.len() < min_len {
        let e = SourceError::TooShort {
            source_name: source.name().to_string(),
            len: doc.len(),
            min: min_len,
        };
        warn!("Ignoring scrape document: {}", e);
        return None;
    }
    Some(doc)
}
