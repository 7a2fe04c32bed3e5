//! Page fetching over HTTP.
//!
//! This module provides the blocking-free HTTP GET used by both the category
//! pool cache and the article parser. Every request carries the descriptive
//! user agent Wikipedia asks scrapers to send, and non-2xx responses are
//! turned into a typed error rather than handed to the HTML parser.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{Result, VitalisError};

/// HTTP client configuration for fetching Wikipedia pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "VitalArticleScraper/1.0 (https://github.com/vitalis-wiki/vitalis)".to_string(),
        }
    }
}

/// Fetches a page and returns the response body as text.
///
/// Performs an HTTP GET, follows redirects, and respects the configured
/// timeout. A non-2xx status is an error; the body is never parsed in that
/// case.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| VitalisError::InvalidUrl(e.to_string()))?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(VitalisError::Http)?;

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                VitalisError::Timeout { timeout: config.timeout }
            } else {
                VitalisError::Http(e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), %url, "fetch returned non-success status");
        return Err(VitalisError::Status { status: status.as_u16(), url: url.to_string() });
    }

    let content = response.text().await?;

    Ok(content)
}
