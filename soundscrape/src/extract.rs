//! Audio title extraction from the open video viewer.

use crate::browser::ProfileSurface;
use std::time::Duration;

/// Probe the selectors in order and return the first non-empty trimmed
/// text. Site markup shifts between data-e2e attributes and hashed
/// class names, so the list runs from most to least specific.
pub async fn extract_title(
    surface: &dyn ProfileSurface,
    selectors: &[String],
    per_selector: Duration,
) -> Option<String> {
    for selector in selectors {
        if let Some(text) = surface.read_text(selector, per_selector).await {
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedSurface;
    use crate::configuration::MUSIC_SELECTORS;

    fn selectors() -> Vec<String> {
        MUSIC_SELECTORS.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_extracts_present_title() {
        let surface = ScriptedSurface::with_videos(vec![Some("original sound - someuser")]);
        let title = extract_title(&surface, &selectors(), Duration::from_millis(10)).await;
        assert_eq!(title.as_deref(), Some("original sound - someuser"));
    }

    #[tokio::test]
    async fn test_missing_title_yields_none() {
        let surface = ScriptedSurface::with_videos(vec![None]);
        let title = extract_title(&surface, &selectors(), Duration::from_millis(10)).await;
        assert_eq!(title, None);
    }

    #[tokio::test]
    async fn test_whitespace_only_title_yields_none() {
        let surface = ScriptedSurface::with_videos(vec![Some("   ")]);
        let title = extract_title(&surface, &selectors(), Duration::from_millis(10)).await;
        assert_eq!(title, None);
    }
}
