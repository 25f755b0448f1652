//! Failure diagnostics: screenshots and page dumps.

use crate::browser::ProfileSurface;
use std::path::PathBuf;

/// Best-effort writer for failure artifacts. Capture failures are
/// logged and never propagate into the scrape result.
#[derive(Debug, Clone)]
pub struct DiagnosticsSink {
    dir: PathBuf,
}

impl DiagnosticsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `{stem}.png` and `{stem}.html` for the current page state.
    pub async fn capture(&self, surface: &dyn ProfileSurface, stem: &str) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            log::warn!("diagnostics dir {}: {}", self.dir.display(), e);
            return;
        }

        match surface.screenshot().await {
            Ok(bytes) => {
                let path = self.dir.join(format!("{}.png", stem));
                if let Err(e) = tokio::fs::write(&path, bytes).await {
                    log::warn!("screenshot write {}: {}", path.display(), e);
                } else {
                    log::info!("saved screenshot to {}", path.display());
                }
            }
            Err(e) => log::warn!("screenshot capture failed: {}", e),
        }

        match surface.content().await {
            Ok(html) => {
                let path = self.dir.join(format!("{}.html", stem));
                if let Err(e) = tokio::fs::write(&path, html).await {
                    log::warn!("page dump write {}: {}", path.display(), e);
                }
            }
            Err(e) => log::warn!("page dump failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedSurface;

    #[tokio::test]
    async fn test_capture_writes_artifacts() {
        let dir = std::env::temp_dir().join(format!("soundscrape_diag_{}", std::process::id()));
        let sink = DiagnosticsSink::new(&dir);
        let surface = ScriptedSurface::with_videos(vec![]);

        sink.capture(&surface, "test_load_failed").await;

        assert!(dir.join("test_load_failed.png").exists());
        assert!(dir.join("test_load_failed.html").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
