//! Profile page loading with retries and soft-block detection.

use crate::browser::ProfileSurface;
use crate::configuration::Configuration;
use crate::diagnostics::DiagnosticsSink;
use crate::profile::ProfileTarget;
use crate::wait::poll_until;
use std::time::Duration;

/// Selector for a post thumbnail in the profile grid.
pub const GRID_SELECTOR: &str = r#"div[data-e2e="user-post-item"]"#;

/// Marker text shown on interstitial block pages.
pub const SOFT_BLOCK_MARKER: &str = "Something went wrong";

/// Result of trying to get the profile grid to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The grid rendered on the given 1-based attempt.
    Loaded { attempts: usize },
    /// All attempts exhausted without a grid.
    Failed { attempts: usize, soft_blocked: bool },
}

/// Linear backoff between load attempts.
pub(crate) fn backoff_delay(attempt: usize, unit: Duration) -> Duration {
    unit * attempt as u32
}

/// Navigate to the profile and wait for the post grid, retrying with a
/// linear backoff. A soft block is reported but never retried harder;
/// the caller decides whether headful mode is worth a second run.
pub async fn load_profile(
    surface: &dyn ProfileSurface,
    target: &ProfileTarget,
    config: &Configuration,
    diagnostics: Option<&DiagnosticsSink>,
) -> LoadOutcome {
    let mut soft_blocked = false;

    for attempt in 1..=config.max_load_attempts {
        log::info!(
            "loading profile @{} (attempt {}/{})",
            target.handle(),
            attempt,
            config.max_load_attempts
        );

        match surface.navigate(target.url(), config.navigation_timeout).await {
            Ok(()) => {
                config.settle.pause().await;

                let grid_rendered =
                    poll_until(config.grid_timeout, config.poll_interval, move || {
                        surface.is_visible(GRID_SELECTOR)
                    })
                    .await;

                if grid_rendered {
                    return LoadOutcome::Loaded { attempts: attempt };
                }

                if let Ok(html) = surface.content().await {
                    if html.contains(SOFT_BLOCK_MARKER) {
                        soft_blocked = true;
                        log::warn!(
                            "@{}: page shows '{}', likely a soft block",
                            target.handle(),
                            SOFT_BLOCK_MARKER
                        );
                    }
                }
            }
            Err(e) => {
                log::warn!("@{}: navigation failed: {}", target.handle(), e);
            }
        }

        if attempt < config.max_load_attempts {
            tokio::time::sleep(backoff_delay(attempt, config.backoff_unit)).await;
        }
    }

    if let Some(sink) = diagnostics {
        sink.capture(surface, &format!("{}_load_failed", target.handle()))
            .await;
    }

    LoadOutcome::Failed {
        attempts: config.max_load_attempts,
        soft_blocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedSurface;
    use std::sync::atomic::Ordering;

    fn fast_config() -> Configuration {
        let mut config = Configuration::default();
        config.backoff_unit = Duration::from_millis(1);
        config.grid_timeout = Duration::from_millis(20);
        config.poll_interval = Duration::from_millis(1);
        config.settle = crate::wait::Pacing::none();
        config
    }

    fn target() -> ProfileTarget {
        ProfileTarget::new("testuser").unwrap()
    }

    #[tokio::test]
    async fn test_loads_first_attempt() {
        let surface = ScriptedSurface::with_videos(vec![Some("song")]);
        let outcome = load_profile(&surface, &target(), &fast_config(), None).await;
        assert_eq!(outcome, LoadOutcome::Loaded { attempts: 1 });
        assert_eq!(surface.navigations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_grid_appears() {
        let mut surface = ScriptedSurface::with_videos(vec![Some("song")]);
        surface.grid_visible_on_attempt = Some(3);
        let outcome = load_profile(&surface, &target(), &fast_config(), None).await;
        assert_eq!(outcome, LoadOutcome::Loaded { attempts: 3 });
        assert_eq!(surface.navigations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_navigation_errors_consume_attempts() {
        let mut surface = ScriptedSurface::with_videos(vec![Some("song")]);
        surface.fail_navigations = 2;
        surface.grid_visible_on_attempt = Some(3);
        let outcome = load_profile(&surface, &target(), &fast_config(), None).await;
        assert_eq!(outcome, LoadOutcome::Loaded { attempts: 3 });
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let mut surface = ScriptedSurface::with_videos(vec![]);
        surface.grid_visible_on_attempt = None;
        let outcome = load_profile(&surface, &target(), &fast_config(), None).await;
        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                attempts: 3,
                soft_blocked: false
            }
        );
        assert_eq!(surface.navigations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_soft_block_detected() {
        let mut surface = ScriptedSurface::with_videos(vec![]);
        surface.grid_visible_on_attempt = None;
        surface.soft_block = true;
        let outcome = load_profile(&surface, &target(), &fast_config(), None).await;
        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                attempts: 3,
                soft_blocked: true
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts_but_not_after_the_last() {
        let mut surface = ScriptedSurface::with_videos(vec![Some("song")]);
        surface.grid_visible_on_attempt = Some(3);

        let mut config = fast_config();
        config.backoff_unit = Duration::from_secs(10);

        let started = tokio::time::Instant::now();
        let outcome = load_profile(&surface, &target(), &config, None).await;

        // success on the third attempt sleeps after attempts 1 and 2
        // only: 10s + 20s of linear backoff, plus a few ms of polling.
        let elapsed = started.elapsed();
        assert_eq!(outcome, LoadOutcome::Loaded { attempts: 3 });
        assert!(elapsed >= Duration::from_secs(30), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(31), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_backoff_is_linear() {
        let unit = Duration::from_secs(5);
        assert_eq!(backoff_delay(1, unit), Duration::from_secs(5));
        assert_eq!(backoff_delay(2, unit), Duration::from_secs(10));
        assert_eq!(backoff_delay(3, unit), Duration::from_secs(15));
    }
}
