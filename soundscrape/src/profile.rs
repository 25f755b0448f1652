//! Profile handle validation and URL construction.

use crate::error::{ScrapeError, ScrapeResult};

/// A validated profile target: the normalized handle and its page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTarget {
    handle: String,
    url: String,
}

impl ProfileTarget {
    /// Validate a raw handle and build the profile URL. A leading `@`
    /// and surrounding whitespace are stripped. Handles may only
    /// contain ASCII alphanumerics, underscores, and periods.
    pub fn new(raw: &str) -> ScrapeResult<Self> {
        let handle = raw.trim().trim_start_matches('@');

        if handle.is_empty() {
            return Err(ScrapeError::InvalidHandle(
                "handle cannot be empty".into(),
            ));
        }

        if !handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(ScrapeError::InvalidHandle(format!(
                "handle contains invalid characters: {}",
                handle
            )));
        }

        let url = format!("https://www.tiktok.com/@{}", handle);

        // infallible under the grammar above
        if url::Url::parse(&url).is_err() {
            return Err(ScrapeError::InvalidHandle(format!(
                "handle does not form a valid URL: {}",
                handle
            )));
        }

        Ok(Self {
            handle: handle.to_string(),
            url,
        })
    }

    /// The normalized handle without the `@` prefix.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// The full profile page URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}
