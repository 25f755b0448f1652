//! Chrome session management and the page surface abstraction.
//!
//! All page interactions go through the [`ProfileSurface`] trait so the
//! scrape loop can run against a scripted page in tests.

use crate::configuration::Configuration;
use crate::error::{ScrapeError, ScrapeResult};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetGeolocationOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use spider_fingerprint::configs::{AgentOs, Tier};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Chrome launch arguments that suppress the automation banner and the
/// blink-level automation flag.
const CHROME_ARGS: [&str; 5] = [
    "--disable-blink-features=AutomationControlled",
    "--no-sandbox",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--lang=en-US",
];

/// Read-only and interactive access to the active page. Every selector
/// probe is non-throwing so the scrape loop can treat absence as a
/// normal state.
#[async_trait]
pub trait ProfileSurface: Send + Sync {
    /// Navigate to a URL and wait for the navigation to commit.
    async fn navigate(&self, url: &str, timeout: Duration) -> ScrapeResult<()>;
    /// Whether the first element matching the selector exists and is
    /// not hidden via CSS.
    async fn is_visible(&self, selector: &str) -> bool;
    /// The trimmed visible text of the first match, if non-empty.
    async fn read_text(&self, selector: &str, timeout: Duration) -> Option<String>;
    /// Whether the first match carries the attribute.
    async fn has_attribute(&self, selector: &str, attribute: &str) -> bool;
    /// Click the first element matching the selector.
    async fn click(&self, selector: &str) -> ScrapeResult<()>;
    /// The full HTML of the page.
    async fn content(&self) -> ScrapeResult<String>;
    /// A full-page screenshot as PNG bytes.
    async fn screenshot(&self) -> ScrapeResult<Vec<u8>>;
}

/// [`ProfileSurface`] over a live CDP page.
#[derive(Debug, Clone)]
pub struct CdpSurface {
    page: Page,
}

impl CdpSurface {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval_bool(&self, script: String) -> bool {
        match self.page.evaluate(script).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            _ => false,
        }
    }
}

#[async_trait]
impl ProfileSurface for CdpSurface {
    async fn navigate(&self, url: &str, timeout: Duration) -> ScrapeResult<()> {
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await
        };
        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(ScrapeError::Timeout),
        }
    }

    async fn is_visible(&self, selector: &str) -> bool {
        let selector = match serde_json::to_string(selector) {
            Ok(s) => s,
            _ => return false,
        };
        self.eval_bool(format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                return style.display !== 'none' && style.visibility !== 'hidden';
            }})()"#
        ))
        .await
    }

    async fn read_text(&self, selector: &str, timeout: Duration) -> Option<String> {
        let selector = serde_json::to_string(selector).ok()?;
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return null;
                const text = (el.innerText || el.textContent || '').trim();
                return text.length ? text : null;
            }})()"#
        );
        let evaluation = tokio::time::timeout(timeout, self.page.evaluate(script))
            .await
            .ok()?
            .ok()?;
        evaluation.into_value::<Option<String>>().ok().flatten()
    }

    async fn has_attribute(&self, selector: &str, attribute: &str) -> bool {
        let (selector, attribute) = match (
            serde_json::to_string(selector),
            serde_json::to_string(attribute),
        ) {
            (Ok(s), Ok(a)) => (s, a),
            _ => return false,
        };
        self.eval_bool(format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                return !!(el && el.hasAttribute({attribute}));
            }})()"#
        ))
        .await
    }

    async fn click(&self, selector: &str) -> ScrapeResult<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn content(&self) -> ScrapeResult<String> {
        Ok(self.page.content().await?)
    }

    async fn screenshot(&self) -> ScrapeResult<Vec<u8>> {
        Ok(self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await?)
    }
}

/// A launched chrome instance with one page in a dedicated browser
/// context. Dropping the session without calling [`Session::close`]
/// leaks the chrome process until the handler task ends.
pub struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    context_id: Option<BrowserContextId>,
    page: Page,
}

impl Session {
    /// Launch chrome, open a fresh browser context, and prepare a page
    /// with the configured identity overrides applied.
    pub async fn launch(config: &Configuration) -> ScrapeResult<Self> {
        use chromiumoxide::error::CdpError;

        let mut builder = BrowserConfig::builder()
            .args(CHROME_ARGS.to_vec())
            .request_timeout(config.navigation_timeout)
            .viewport(Viewport {
                width: config.viewport.0,
                height: config.viewport.1,
                ..Default::default()
            });

        if !config.headless {
            builder = builder.with_head();
        }

        let mut browser_config = builder.build().map_err(ScrapeError::Launch)?;

        let mut headers = std::collections::HashMap::new();
        headers.insert(
            "accept-language".to_string(),
            format!("{},en;q=0.9", config.locale),
        );
        browser_config.extra_headers = Some(headers);

        let (mut browser, mut handler) = Browser::launch(browser_config).await?;

        // Poll the handler until the websocket drops or launch fails.
        let handle = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    match e {
                        CdpError::Ws(_)
                        | CdpError::LaunchExit(_, _)
                        | CdpError::LaunchTimeout(_)
                        | CdpError::LaunchIo(_, _) => break,
                        _ => continue,
                    }
                }
            }
        });

        let mut create_context = CreateBrowserContextParams::default();
        create_context.dispose_on_detach = Some(true);

        let context_id = match browser.create_browser_context(create_context).await {
            Ok(id) => {
                let _ = browser.send_new_context(id.clone()).await;
                Some(id)
            }
            Err(e) => {
                handle.abort();
                return Err(e.into());
            }
        };

        let mut target = CreateTargetParams::new("about:blank");
        target.browser_context_id.clone_from(&context_id);

        let page = match tokio::time::timeout(
            config.navigation_timeout,
            browser.new_page(target),
        )
        .await
        {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                handle.abort();
                return Err(e.into());
            }
            Err(_) => {
                handle.abort();
                return Err(ScrapeError::Timeout);
            }
        };

        let session = Self {
            browser,
            handler: handle,
            context_id,
            page,
        };
        session.configure_page(config).await;

        Ok(session)
    }

    /// Identity overrides: user agent, stealth patches, timezone,
    /// locale, and geolocation. All best effort.
    async fn configure_page(&self, config: &Configuration) {
        let user_agent = async {
            let _ = self.page.set_user_agent(config.user_agent.as_str()).await;
        };
        let stealth = async {
            let _ = self
                .page
                .add_script_to_evaluate_on_new_document(Some(
                    spider_fingerprint::build_stealth_script(Tier::Full, AgentOs::Windows),
                ))
                .await;
        };

        tokio::join!(user_agent, stealth);

        let _ = self
            .page
            .emulate_timezone(SetTimezoneOverrideParams::new(config.timezone.clone()))
            .await;
        let _ = self
            .page
            .emulate_locale(SetLocaleOverrideParams {
                locale: Some(config.locale.clone()),
            })
            .await;
        let _ = self
            .page
            .emulate_geolocation(
                SetGeolocationOverrideParams::builder()
                    .latitude(config.geolocation.0)
                    .longitude(config.geolocation.1)
                    .accuracy(100.0)
                    .build(),
            )
            .await;
    }

    /// The surface over the session's page.
    pub fn surface(&self) -> CdpSurface {
        CdpSurface::new(self.page.clone())
    }

    /// Close the page, dispose the browser context, and shut the
    /// browser down.
    pub async fn close(mut self) {
        let _ = self.page.close().await;
        if let Some(id) = self.context_id.take() {
            let _ = self.browser.dispose_browser_context(id).await;
        }
        let _ = self.browser.close().await;
        if !self.handler.is_finished() {
            self.handler.abort();
        }
    }
}
