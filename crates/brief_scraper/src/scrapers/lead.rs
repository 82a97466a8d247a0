use std::fmt;

use async_trait::async_trait;
use brief_core::config::{EmptyTextPolicy, FetchConfig};
use brief_core::types::MAX_PARAGRAPHS;
use brief_core::{Error, ExtractionResult, Result};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, warn};

use super::{utils, validate_url, Scraper};

/// Pages larger than this are cut off before parsing.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Decode `body` with the `charset` named in `content_type`, UTF-8 otherwise.
///
/// A byte order mark overrides the declared charset.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> String {
    let media_type = content_type.and_then(|value| value.parse::<mime::Mime>().ok());
    let encoding = media_type
        .as_ref()
        .and_then(|media_type| media_type.get_param(mime::CHARSET))
        .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!(encoding = used.name(), "Page body contained malformed sequences");
    }
    text.into_owned()
}

/// Pulls the first paragraphs of any page.
#[derive(Clone)]
pub struct LeadTextScraper {
    client: Client,
    empty_text: EmptyTextPolicy,
}

impl fmt::Debug for LeadTextScraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeadTextScraper")
            .field("client", &"<reqwest::Client>")
            .field("empty_text", &self.empty_text)
            .finish()
    }
}

impl LeadTextScraper {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            empty_text: config.empty_text,
        })
    }

    /// GET `url` and return its body as text, capped at [`MAX_BODY_BYTES`].
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let url = validate_url(url)?;

        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchFailed(format!("Timed out fetching {}", url))
            } else {
                Error::FetchFailed(format!("{}: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed(format!("{} returned {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::FetchFailed(format!("{}: {}", url, e)))?
        {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY_BYTES {
                warn!(url = %url, "Page body truncated at {} bytes", MAX_BODY_BYTES);
                body.truncate(MAX_BODY_BYTES);
                break;
            }
        }

        Ok(decode_body(content_type.as_deref(), &body))
    }

    /// First [`MAX_PARAGRAPHS`] `<p>` elements, trimmed, empty ones dropped.
    pub fn extract(&self, url: &str, html: &str) -> Result<ExtractionResult> {
        let document = Html::parse_document(html);
        let paragraphs = utils::extract_texts(&document, "p", MAX_PARAGRAPHS)?;
        let result = ExtractionResult::from_paragraphs(url, paragraphs);

        debug!(url, paragraphs = result.paragraphs.len(), "Extracted lead text");

        if result.has_content() {
            return Ok(result);
        }

        match self.empty_text {
            EmptyTextPolicy::Reject => Err(Error::NoContent(url.to_string())),
            EmptyTextPolicy::Placeholder => {
                warn!(url, "No paragraph text found, using placeholder");
                Ok(result.with_placeholder())
            }
        }
    }
}

#[async_trait]
impl Scraper for LeadTextScraper {
    fn name(&self) -> &str {
        "lead-text"
    }

    async fn scrape(&self, url: &str) -> Result<ExtractionResult> {
        let html = self.fetch(url).await?;
        self.extract(url, &html)
    }
}
