//! The scrape run: profile load, viewer walk, and title collection.

use crate::browser::{ProfileSurface, Session};
use crate::carousel::{advance, VIEWER_SELECTOR};
use crate::configuration::Configuration;
use crate::diagnostics::DiagnosticsSink;
use crate::error::ScrapeResult;
use crate::extract::extract_title;
use crate::loader::{load_profile, LoadOutcome, GRID_SELECTOR};
use crate::profile::ProfileTarget;
use crate::wait::poll_until;

/// Ordered, deduplicated collection of raw audio titles. Insertion
/// order is first-seen order.
#[derive(Debug, Default, Clone)]
pub struct TitleSet {
    titles: Vec<String>,
    seen: hashbrown::HashSet<String>,
}

impl TitleSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Insert a title. Whitespace is trimmed; empty and duplicate
    /// titles are rejected.
    pub fn insert(&mut self, raw: &str) -> bool {
        let title = raw.trim();
        if title.is_empty() || self.seen.contains(title) {
            return false;
        }
        self.seen.insert(title.to_string());
        self.titles.push(title.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(|s| s.as_str())
    }

    pub fn into_vec(self) -> Vec<String> {
        self.titles
    }
}

/// How a scrape run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeStatus {
    /// The profile was walked to its end or the video cap.
    Completed,
    /// The profile grid never rendered.
    LoadFailed { soft_blocked: bool },
    /// An unexpected fault mid-run. Collected titles are still valid.
    Faulted(String),
}

impl ScrapeStatus {
    /// Human-readable summary of the terminal state.
    pub fn message(&self) -> String {
        match self {
            Self::Completed => "completed".into(),
            Self::LoadFailed { soft_blocked: true } => {
                "profile failed to load (soft block suspected)".into()
            }
            Self::LoadFailed { soft_blocked: false } => "profile failed to load".into(),
            Self::Faulted(msg) => format!("faulted: {}", msg),
        }
    }
}

/// The result of one scrape run. Titles survive partial failures.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    /// Unique raw audio titles in first-seen order.
    pub titles: Vec<String>,
    /// Number of videos visited, counting duplicates.
    pub videos_visited: usize,
    /// Terminal state of the run.
    pub status: ScrapeStatus,
}

/// Walks a profile's videos and collects the audio titles.
#[derive(Debug, Clone)]
pub struct Scraper {
    config: Configuration,
    diagnostics: Option<DiagnosticsSink>,
}

impl Scraper {
    pub fn new(config: Configuration) -> Self {
        let diagnostics = config.diagnostics_dir.clone().map(DiagnosticsSink::new);
        Self {
            config,
            diagnostics,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Launch a browser session, run the scrape, and shut the session
    /// down regardless of how the run ended.
    pub async fn run(&self, target: &ProfileTarget) -> ScrapeResult<ScrapeOutcome> {
        let session = Session::launch(&self.config).await?;
        let surface = session.surface();
        let outcome = self.run_on(&surface, target).await;
        session.close().await;
        Ok(outcome)
    }

    /// Run the scrape against an already prepared surface.
    pub async fn run_on(
        &self,
        surface: &dyn ProfileSurface,
        target: &ProfileTarget,
    ) -> ScrapeOutcome {
        let load = load_profile(surface, target, &self.config, self.diagnostics.as_ref()).await;

        if let LoadOutcome::Failed { soft_blocked, .. } = load {
            return ScrapeOutcome {
                titles: Vec::new(),
                videos_visited: 0,
                status: ScrapeStatus::LoadFailed { soft_blocked },
            };
        }

        if let Err(e) = surface.click(GRID_SELECTOR).await {
            return self
                .fault(surface, target, format!("could not open first video: {}", e))
                .await;
        }

        let viewer_open = poll_until(
            self.config.viewer_timeout,
            self.config.poll_interval,
            move || surface.is_visible(VIEWER_SELECTOR),
        )
        .await;

        if !viewer_open {
            return self
                .fault(surface, target, "video viewer did not open".into())
                .await;
        }

        let mut titles = TitleSet::new();
        let mut visited = 1usize;
        let mut current = extract_title(
            surface,
            &self.config.music_selectors,
            self.config.selector_timeout,
        )
        .await;

        loop {
            match &current {
                Some(title) => {
                    if titles.insert(title) {
                        log::info!("video {}: {}", visited, title);
                    } else {
                        log::debug!("video {}: duplicate audio", visited);
                    }
                }
                None => log::debug!("video {}: no audio title found", visited),
            }

            if visited >= self.config.max_videos {
                log::info!("reached the {} video cap", self.config.max_videos);
                break;
            }

            self.config.step.pause().await;

            let step = advance(surface, &self.config, current.as_deref()).await;
            if !step.moved {
                break;
            }
            visited += 1;
            current = step.title;
        }

        log::info!(
            "@{}: visited {} videos, {} unique titles",
            target.handle(),
            visited,
            titles.len()
        );

        ScrapeOutcome {
            titles: titles.into_vec(),
            videos_visited: visited,
            status: ScrapeStatus::Completed,
        }
    }

    async fn fault(
        &self,
        surface: &dyn ProfileSurface,
        target: &ProfileTarget,
        message: String,
    ) -> ScrapeOutcome {
        log::error!("@{}: {}", target.handle(), message);
        if let Some(sink) = &self.diagnostics {
            sink.capture(surface, &format!("{}_fault", target.handle()))
                .await;
        }
        ScrapeOutcome {
            titles: Vec::new(),
            videos_visited: 0,
            status: ScrapeStatus::Faulted(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedSurface;
    use crate::wait::Pacing;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn fast_scraper() -> Scraper {
        let mut config = Configuration::default();
        config.backoff_unit = Duration::from_millis(1);
        config.grid_timeout = Duration::from_millis(20);
        config.viewer_timeout = Duration::from_millis(20);
        config.next_control_timeout = Duration::from_millis(20);
        config.title_change_timeout = Duration::from_millis(20);
        config.selector_timeout = Duration::from_millis(5);
        config.poll_interval = Duration::from_millis(1);
        config.settle = Pacing::none();
        config.step = Pacing::none();
        Scraper::new(config)
    }

    fn target() -> ProfileTarget {
        ProfileTarget::new("testuser").unwrap()
    }

    #[tokio::test]
    async fn test_collects_unique_titles_in_order() {
        let surface = ScriptedSurface::with_videos(vec![
            Some("Song A - Artist"),
            Some("original sound - testuser"),
            Some("Song A - Artist"),
            Some("Song B - Artist"),
        ]);
        let outcome = fast_scraper().run_on(&surface, &target()).await;

        assert_eq!(outcome.status, ScrapeStatus::Completed);
        assert_eq!(outcome.videos_visited, 4);
        assert_eq!(
            outcome.titles,
            vec![
                "Song A - Artist".to_string(),
                "original sound - testuser".to_string(),
                "Song B - Artist".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_untitled_videos_are_skipped_not_fatal() {
        let surface =
            ScriptedSurface::with_videos(vec![Some("Song A"), None, Some("Song B")]);
        let outcome = fast_scraper().run_on(&surface, &target()).await;

        assert_eq!(outcome.status, ScrapeStatus::Completed);
        assert_eq!(outcome.videos_visited, 3);
        assert_eq!(outcome.titles, vec!["Song A", "Song B"]);
    }

    #[tokio::test]
    async fn test_load_failure_returns_empty() {
        let mut surface = ScriptedSurface::with_videos(vec![]);
        surface.grid_visible_on_attempt = None;
        surface.soft_block = true;
        let outcome = fast_scraper().run_on(&surface, &target()).await;

        assert_eq!(
            outcome.status,
            ScrapeStatus::LoadFailed { soft_blocked: true }
        );
        assert!(outcome.titles.is_empty());
        assert_eq!(outcome.videos_visited, 0);
    }

    #[tokio::test]
    async fn test_viewer_not_opening_is_a_fault() {
        let mut surface = ScriptedSurface::with_videos(vec![Some("Song A")]);
        surface.viewer_visible = false;
        let outcome = fast_scraper().run_on(&surface, &target()).await;

        assert!(matches!(outcome.status, ScrapeStatus::Faulted(_)));
        assert!(outcome.titles.is_empty());
    }

    #[tokio::test]
    async fn test_max_videos_caps_the_walk() {
        let surface = ScriptedSurface::with_videos(vec![
            Some("one"),
            Some("two"),
            Some("three"),
            Some("four"),
        ]);
        let mut scraper = fast_scraper();
        scraper.config.max_videos = 2;
        let outcome = scraper.run_on(&surface, &target()).await;

        assert_eq!(outcome.videos_visited, 2);
        assert_eq!(outcome.titles, vec!["one", "two"]);
        // no click after the cap is reached.
        assert_eq!(surface.clicks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_last_control_ends_the_run() {
        let mut surface = ScriptedSurface::with_videos(vec![Some("one"), Some("two")]);
        surface.next_disabled_at_end = true;
        let outcome = fast_scraper().run_on(&surface, &target()).await;

        assert_eq!(outcome.status, ScrapeStatus::Completed);
        assert_eq!(outcome.videos_visited, 2);
        assert_eq!(outcome.titles, vec!["one", "two"]);
        // the disabled control is never clicked.
        assert_eq!(surface.clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_title_set_rejects_empty_and_duplicates() {
        let mut set = TitleSet::new();
        assert!(set.insert("  Song A  "));
        assert!(!set.insert("Song A"));
        assert!(!set.insert(""));
        assert!(!set.insert("   "));
        assert!(set.insert("Song B"));
        assert_eq!(set.into_vec(), vec!["Song A", "Song B"]);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(ScrapeStatus::Completed.message(), "completed");
        assert!(ScrapeStatus::LoadFailed { soft_blocked: true }
            .message()
            .contains("soft block"));
        assert!(ScrapeStatus::Faulted("boom".into())
            .message()
            .contains("boom"));
    }
}
