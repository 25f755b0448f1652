//! Advancing through the video viewer.

use crate::browser::ProfileSurface;
use crate::configuration::Configuration;
use crate::extract::extract_title;
use crate::wait::{poll_for, poll_until};

/// Selector for the next-video control inside the viewer.
pub const NEXT_SELECTOR: &str = r#"button[data-e2e="arrow-right"]"#;

/// Selector for the open video viewer.
pub const VIEWER_SELECTOR: &str = r#"[data-e2e="browse-video"]"#;

/// Result of one advance step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// Whether the viewer moved to another video.
    pub moved: bool,
    /// The title read after the step settled, when it moved.
    pub title: Option<String>,
}

impl Advance {
    fn stopped() -> Self {
        Self {
            moved: false,
            title: None,
        }
    }
}

/// Try to move to the next video. The control disappearing or carrying
/// `disabled` or `aria-disabled` means the end of the profile. Reads
/// the title after
/// clicking, polling briefly for it to change from `previous` since the
/// viewer swaps content asynchronously.
pub async fn advance(
    surface: &dyn ProfileSurface,
    config: &Configuration,
    previous: Option<&str>,
) -> Advance {
    let control_present = poll_until(config.next_control_timeout, config.poll_interval, move || {
        surface.is_visible(NEXT_SELECTOR)
    })
    .await;

    if !control_present {
        log::debug!("next control not found, end of profile");
        return Advance::stopped();
    }

    if surface.has_attribute(NEXT_SELECTOR, "disabled").await
        || surface.has_attribute(NEXT_SELECTOR, "aria-disabled").await
    {
        log::debug!("next control disabled, end of profile");
        return Advance::stopped();
    }

    if let Err(e) = surface.click(NEXT_SELECTOR).await {
        log::warn!("next click failed: {}", e);
        // one recovery attempt in case the click raced a DOM swap.
        if !surface.is_visible(NEXT_SELECTOR).await {
            return Advance::stopped();
        }
        if let Err(e) = surface.click(NEXT_SELECTOR).await {
            log::warn!("next click retry failed: {}", e);
            return Advance::stopped();
        }
    }

    let selectors = config.music_selectors.as_slice();
    let per_selector = config.selector_timeout;

    let changed = poll_for(
        config.title_change_timeout,
        config.poll_interval,
        move || async move {
            let title = extract_title(surface, selectors, per_selector).await;
            match (title, previous) {
                (Some(current), Some(prev)) if current == prev => None,
                (title, _) => title,
            }
        },
    )
    .await;

    // a timeout here does not mean the viewer is stuck: repost chains
    // can reuse the same audio on consecutive videos.
    match changed {
        Some(title) => Advance {
            moved: true,
            title: Some(title),
        },
        None => Advance {
            moved: true,
            title: extract_title(surface, &config.music_selectors, config.selector_timeout).await,
        },
    }
}
