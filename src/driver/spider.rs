//! spider.cloud-backed implementation of [`MapsDriver`].
//!
//! spider.cloud renders the JS-heavy maps pages server-side and hands back
//! markdown, so this driver never touches a local browser. Navigation,
//! waiting and rendering are its problem; ours ends at issuing the request
//! and pulling fields out of the returned text.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tracing::debug;

use crate::config::Settings;
use crate::driver::{extract, MapsDriver, Resolution};
use crate::error::{DriverError, PipelineError};
use crate::model::{PlaceRecord, PlaceSeed, RawReview};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search";

pub struct SpiderDriver {
    spider: Spider,
    timeout: Duration,
}

impl SpiderDriver {
    /// Reads `SPIDER_API_KEY` from the environment.
    pub fn from_env(settings: &Settings) -> Result<Self> {
        let api_key = std::env::var("SPIDER_API_KEY").map_err(|_| PipelineError::MissingApiKey)?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| anyhow::anyhow!("failed to create spider client: {e}"))?;
        Ok(SpiderDriver {
            spider,
            timeout: Duration::from_millis(settings.timeout_ms),
        })
    }

    /// Fetch one rendered page as markdown, bounded by the per-action timeout.
    async fn fetch(&self, url: &str) -> Result<String, DriverError> {
        let params = RequestParams {
            return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Markdown)),
            ..Default::default()
        };

        let start = Instant::now();
        let response = tokio::time::timeout(
            self.timeout,
            self.spider.scrape_url(url, Some(params), "application/json"),
        )
        .await
        .map_err(|_| DriverError::Timeout)?;

        let value = match response {
            Ok(v) => v,
            Err(e) => return Err(classify_message(&e.to_string())),
        };

        // The API sometimes wraps the JSON envelope in a string.
        let parsed: serde_json::Value = match value.as_str() {
            Some(s) => serde_json::from_str(s).unwrap_or(value.clone()),
            None => value,
        };
        let first = parsed.as_array().and_then(|arr| arr.first());

        if let Some(status) = first
            .and_then(|obj| obj.get("status"))
            .and_then(|s| s.as_i64())
        {
            match status {
                200..=299 => {}
                404 => return Err(DriverError::NotFound),
                403 => return Err(DriverError::Blocked),
                429 => return Err(DriverError::RateLimited),
                s => return Err(DriverError::Http(s as u16)),
            }
        }

        let content = first
            .and_then(|obj| obj.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| DriverError::Malformed("response without content".into()))?;

        debug!(url, latency_ms = start.elapsed().as_millis() as u64, "fetched page");
        Ok(strip_images(content))
    }
}

#[async_trait]
impl MapsDriver for SpiderDriver {
    async fn resolve_place(&self, seed: &PlaceSeed) -> Result<Resolution, DriverError> {
        let search_url = format!("{}/{}?hl=id", MAPS_SEARCH_URL, encode_query(&seed.query()));
        let markdown = self.fetch(&search_url).await?;

        let hits = extract::search_hits(&markdown);
        if hits.is_empty() {
            // An exact query answers with the place page itself.
            return match extract::place_from_markdown(seed, &search_url, &markdown) {
                Ok(record) => Ok(Resolution {
                    record,
                    ambiguous: false,
                }),
                Err(DriverError::Malformed(_)) => Err(DriverError::NotFound),
                Err(e) => Err(e),
            };
        }

        let ambiguous = hits.len() > 1;
        let url = &hits[0];
        let page = self.fetch(url).await?;
        let record = extract::place_from_markdown(seed, url, &page)?;
        Ok(Resolution { record, ambiguous })
    }

    async fn fetch_reviews(
        &self,
        place: &PlaceRecord,
        max: usize,
    ) -> Result<Vec<RawReview>, DriverError> {
        // The rendered place page carries the reviews pane; hl=id keeps the
        // relative timestamps in the form the processor knows how to parse.
        let url = format!("{}?hl=id", place.maps_url);
        let markdown = self.fetch(&url).await?;
        Ok(extract::reviews_from_markdown(&markdown, max))
    }
}

/// Map a transport-level error message onto the driver taxonomy, the same
/// signals the retry loop keys on.
fn classify_message(msg: &str) -> DriverError {
    let low = msg.to_lowercase();
    if low.contains("429") || low.contains("rate") {
        DriverError::RateLimited
    } else if low.contains("timeout") || low.contains("timed out") {
        DriverError::Timeout
    } else if low.contains("403") || low.contains("blocked") {
        DriverError::Blocked
    } else if low.contains("500") || low.contains("502") || low.contains("503") {
        DriverError::Http(500)
    } else {
        DriverError::Network(msg.to_string())
    }
}

/// Drop inline image references; they carry no extractable fields and
/// bloat the text the regexes run over.
fn strip_images(markdown: &str) -> String {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
    re.replace_all(markdown, "").to_string()
}

fn encode_query(query: &str) -> String {
    query.trim().replace(' ', "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_classification_matches_retry_taxonomy() {
        assert!(matches!(classify_message("HTTP 429 too many requests"), DriverError::RateLimited));
        assert!(matches!(classify_message("operation timed out"), DriverError::Timeout));
        assert!(matches!(classify_message("503 service unavailable"), DriverError::Http(_)));
        assert!(matches!(classify_message("connection reset"), DriverError::Network(_)));
    }

    #[test]
    fn queries_are_url_safe() {
        assert_eq!(encode_query(" Candi Jiwa Karawang "), "Candi+Jiwa+Karawang");
    }

    #[test]
    fn images_are_stripped() {
        let md = "before ![photo](https://x/y.png) after";
        assert_eq!(strip_images(md), "before  after");
    }
}
