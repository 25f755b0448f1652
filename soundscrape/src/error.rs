//! Error types for soundscrape.

use std::fmt;

/// Scrape and classification error types.
#[derive(Debug)]
pub enum ScrapeError {
    /// The chrome instance could not be launched.
    Launch(String),
    /// Browser automation fault (CDP level).
    Browser(chromiumoxide::error::CdpError),
    /// HTTP request failed.
    Http(reqwest::Error),
    /// JSON serialization/deserialization error.
    Json(serde_json::Error),
    /// Missing required field in a backend response.
    MissingField(&'static str),
    /// Generative backend error.
    Llm(String),
    /// The profile handle is empty or malformed.
    InvalidHandle(String),
    /// Feature not enabled or configured.
    NotConfigured(&'static str),
    /// IO error (file operations).
    Io(std::io::Error),
    /// Rate limit exceeded.
    RateLimited,
    /// Timeout.
    Timeout,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch(msg) => write!(f, "Launch error: {}", msg),
            Self::Browser(e) => write!(f, "Browser error: {}", e),
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::MissingField(field) => write!(f, "Missing field: {}", field),
            Self::Llm(msg) => write!(f, "LLM error: {}", msg),
            Self::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Self::NotConfigured(what) => write!(f, "Not configured: {}", what),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::RateLimited => write!(f, "Rate limit exceeded"),
            Self::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Browser(e) => Some(e),
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        match e {
            chromiumoxide::error::CdpError::Timeout => Self::Timeout,
            e => Self::Browser(e),
        }
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Result type for scrape operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;
