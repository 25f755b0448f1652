//! Runtime configuration for scraping and classification.

use crate::wait::Pacing;
use std::time::Duration;

/// Default desktop user agent presented to the target site.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Selectors probed in order for the audio title of the active video.
pub const MUSIC_SELECTORS: [&str; 5] = [
    r#"a[data-e2e="browse-music"]"#,
    r#"a[data-e2e="video-music"]"#,
    r#"[data-e2e="browse-music-name"]"#,
    r#"div[class*="DivMusicText"]"#,
    r#"div[class*="MusicText"]"#,
];

/// Structure to configure the scraper: browser identity, timeouts,
/// pacing, and the classification batch shape.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Run chrome without a visible window.
    pub headless: bool,
    /// Hard cap on the number of videos visited in one run.
    pub max_videos: usize,
    /// Attempts to get the profile grid to render before giving up.
    pub max_load_attempts: usize,
    /// Timeout for the initial page navigation.
    pub navigation_timeout: Duration,
    /// Timeout waiting for the post grid to appear.
    pub grid_timeout: Duration,
    /// Timeout waiting for the video viewer to open.
    pub viewer_timeout: Duration,
    /// Per-selector timeout when probing for the audio title.
    pub selector_timeout: Duration,
    /// Timeout waiting for the next-video control to become visible.
    pub next_control_timeout: Duration,
    /// Timeout waiting for the title to change after advancing.
    pub title_change_timeout: Duration,
    /// Interval between polls while waiting on any condition.
    pub poll_interval: Duration,
    /// Base unit of the linear backoff between load attempts.
    pub backoff_unit: Duration,
    /// Randomized pause after a navigation settles.
    pub settle: Pacing,
    /// Randomized pause between consecutive videos.
    pub step: Pacing,
    /// Selectors probed in order for the audio title.
    pub music_selectors: Vec<String>,
    /// User agent presented to the site.
    pub user_agent: String,
    /// Browser viewport dimensions.
    pub viewport: (u32, u32),
    /// Browser locale.
    pub locale: String,
    /// Browser timezone id.
    pub timezone: String,
    /// Geolocation override as (latitude, longitude).
    pub geolocation: (f64, f64),
    /// Titles sent to the model per request.
    pub batch_size: usize,
    /// Delay between consecutive model requests.
    pub batch_delay: Duration,
    /// Directory for failure screenshots and page dumps, if any.
    pub diagnostics_dir: Option<std::path::PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            headless: true,
            max_videos: 1000,
            max_load_attempts: 3,
            navigation_timeout: Duration::from_secs(60),
            grid_timeout: Duration::from_secs(15),
            viewer_timeout: Duration::from_secs(15),
            selector_timeout: Duration::from_millis(200),
            next_control_timeout: Duration::from_secs(5),
            title_change_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
            backoff_unit: Duration::from_secs(5),
            settle: Pacing::new(2000, 3000),
            step: Pacing::new(300, 600),
            music_selectors: MUSIC_SELECTORS.iter().map(|s| s.to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.into(),
            viewport: (1920, 1080),
            locale: "en-US".into(),
            timezone: "America/Los_Angeles".into(),
            geolocation: (34.0522, -118.2437),
            batch_size: 20,
            batch_delay: Duration::from_secs(1),
            diagnostics_dir: None,
        }
    }
}

impl Configuration {
    /// Represents the start of the configuration builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Run chrome with a visible window. Helps get past soft blocks
    /// that target headless browsers.
    pub fn with_headless(&mut self, headless: bool) -> &mut Self {
        self.headless = headless;
        self
    }

    /// Cap the number of videos visited in one run.
    pub fn with_max_videos(&mut self, max_videos: usize) -> &mut Self {
        self.max_videos = max_videos.max(1);
        self
    }

    /// Attempts to get the profile grid to render before giving up.
    pub fn with_max_load_attempts(&mut self, attempts: usize) -> &mut Self {
        self.max_load_attempts = attempts.max(1);
        self
    }

    /// Set the user agent presented to the site.
    pub fn with_user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Number of titles sent to the model per request.
    pub fn with_batch_size(&mut self, batch_size: usize) -> &mut Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Delay between consecutive model requests.
    pub fn with_batch_delay(&mut self, delay: Duration) -> &mut Self {
        self.batch_delay = delay;
        self
    }

    /// Directory for failure screenshots and page dumps.
    pub fn with_diagnostics_dir(
        &mut self,
        dir: Option<impl Into<std::path::PathBuf>>,
    ) -> &mut Self {
        self.diagnostics_dir = dir.map(|d| d.into());
        self
    }

    /// Build the configuration by value.
    pub fn build(&self) -> Self {
        self.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert!(config.headless);
        assert_eq!(config.max_videos, 1000);
        assert_eq!(config.max_load_attempts, 3);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.music_selectors.len(), 5);
        assert_eq!(config.viewport, (1920, 1080));
    }

    #[test]
    fn test_builder_chain() {
        let config = Configuration::new()
            .with_headless(false)
            .with_max_videos(50)
            .with_batch_size(10)
            .build();
        assert!(!config.headless);
        assert_eq!(config.max_videos, 50);
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn test_floors() {
        let config = Configuration::new()
            .with_max_videos(0)
            .with_batch_size(0)
            .with_max_load_attempts(0)
            .build();
        assert_eq!(config.max_videos, 1);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_load_attempts, 1);
    }
}
