//! HTTP posting scraper: fetches a posting page and extracts its visible text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::errors::AppError;
use crate::posting::{PageScraper, ScrapeError};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tried in order; the first selector with non-trivial text wins.
const CONTENT_SELECTORS: &[&str] = &[
    // LinkedIn feed post body
    ".attributed-text-segment-list__content",
    ".feed-shared-update-v2__description",
    // LinkedIn job pages
    ".show-more-less-html__markup",
    ".jobs-description__container",
    ".description__text",
    // Generic
    "[class*='job-description']",
    "article",
    "main",
];

const MIN_CONTENT_CHARS: usize = 20;

pub struct HttpPageScraper {
    client: Client,
}

impl HttpPageScraper {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ClientBuild(format!("scraper HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageScraper for HttpPageScraper {
    async fn scrape(&self, url: &str) -> Result<String, ScrapeError> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        info!("Fetching posting: {}", url);

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout(url.to_string())
            } else {
                ScrapeError::Navigation(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout(url.to_string())
            } else {
                ScrapeError::Navigation(e)
            }
        })?;

        let text = extract_posting_text(&html)
            .ok_or_else(|| ScrapeError::ContentNotFound(url.to_string()))?;

        debug!("Extracted {} chars from {}", text.len(), url);
        Ok(text)
    }
}

/// Returns the text of the first content selector that matches with enough text.
fn extract_posting_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = clean_text(&element.text().collect::<String>());
            if text.chars().count() >= MIN_CONTENT_CHARS {
                debug!("Posting text matched selector {}", selector_str);
                return Some(text);
            }
        }
    }
    None
}

/// Collapses runs of spaces within lines and drops empty lines; line breaks survive
/// because postings use them to separate openings.
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
