// Posting source: where job posting text comes from.
// links: the batch's URL list; http: fetch and extract one posting; archive: optional local copy.

pub mod archive;
pub mod http;
pub mod links;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid posting URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Timed out loading {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    Navigation(#[from] reqwest::Error),

    #[error("Posting page returned HTTP {0}")]
    Status(u16),

    #[error("No posting content found on {0}")]
    ContentNotFound(String),
}

/// Fetches the raw text of a single posting.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<String, ScrapeError>;
}
