use async_trait::async_trait;
use brief_core::{Error, ExtractionResult, Result};
use scraper::{Html, Selector};
use url::Url;

pub mod lead;

pub use lead::LeadTextScraper;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns a short name for logs
    fn name(&self) -> &str;

    /// Fetches `url` and extracts its lead text
    async fn scrape(&self, url: &str) -> Result<ExtractionResult>;
}

/// Accepts only absolute `http://` or `https://` URLs.
pub fn validate_url(url: &str) -> Result<Url> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::InvalidUrl(url.to_string()));
    }
    utils::parse_url(url)
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use super::*;

    pub fn parse_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(Error::InvalidUrl(url.to_string()));
        }
        Ok(parsed)
    }

    /// Text of the first `limit` elements matching `selector`, trimmed.
    /// Empty elements still count toward `limit`.
    pub fn extract_texts(document: &Html, selector: &str, limit: usize) -> Result<Vec<String>> {
        let selector = Selector::parse(selector)
            .map_err(|e| Error::External(anyhow::anyhow!("Invalid selector: {}", e)))?;

        Ok(document
            .select(&selector)
            .take(limit)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect())
    }
}
