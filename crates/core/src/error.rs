//! Error types for Vitalis operations.
//!
//! This module defines the main error type [`VitalisError`] which represents
//! all possible errors that can occur while scraping category listings,
//! fetching articles, and rendering output formats.

use thiserror::Error;

use crate::category::Category;

/// Main error type for article acquisition and rendering.
///
/// Fetch-related variants (`Http`, `Status`, `Timeout`, `EmptyPool`,
/// `UnknownCategory`) are the typed form of the "no result" outcomes the
/// service layer reports to clients; callers at the HTTP boundary convert
/// them into the documented null/error JSON payloads instead of propagating
/// them further.
#[derive(Error, Debug)]
pub enum VitalisError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures, connection issues, and other
    /// transport-level problems.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("Unexpected status {status} fetching {url}")]
    Status { status: u16, url: String },

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The caller named a category outside the fixed vital-article set.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// The listing page scrape yielded no usable article links.
    ///
    /// Nothing is cached in this case, so the next pick retries the scrape.
    #[error("No article links found for category {0}")]
    EmptyPool(Category),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),

    /// PDF composition failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// I/O errors from writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for VitalisError.
pub type Result<T> = std::result::Result<T, VitalisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VitalisError::UnknownCategory("astrology".to_string());
        assert!(err.to_string().contains("astrology"));
    }

    #[test]
    fn test_status_error() {
        let err = VitalisError::Status { status: 503, url: "https://en.wikipedia.org/wiki/Atom".to_string() };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Atom"));
    }

    #[test]
    fn test_empty_pool_error() {
        let err = VitalisError::EmptyPool(Category::Physics);
        assert!(err.to_string().contains("physics"));
    }
}
