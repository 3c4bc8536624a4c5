use crate::fetcher::{
    adapters::{PageDriver, SiteAdapterRegistry},
    errors::FetchError,
    types::{FetchedPage, PageSource},
};
use async_trait::async_trait;
use chrono::Utc;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Quiet period after navigation before the DOM is read, standing in for a
/// network-idle signal.
const IDLE_SETTLE: Duration = Duration::from_millis(500);

const CLICK_BUTTON_SCRIPT: &str = r#"
(() => {
    const wanted = __LABEL__.toLowerCase();
    const nodes = document.querySelectorAll('button, [role="button"]');
    for (const node of nodes) {
        const name = (node.getAttribute('aria-label') || node.innerText || '')
            .replace(/\s+/g, ' ').trim().toLowerCase();
        if (name.includes(wanted)) {
            node.click();
            return true;
        }
    }
    return false;
})()
"#;

const CLICK_TEXT_SCRIPT: &str = r#"
(() => {
    const wanted = __LABEL__.toLowerCase();
    const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT);
    let node;
    while ((node = walker.nextNode())) {
        const text = node.textContent.replace(/\s+/g, ' ').toLowerCase();
        const parent = node.parentElement;
        // Links would navigate away from the page being read
        if (!text.includes(wanted) || !parent || parent.closest('a')) {
            continue;
        }
        (parent.closest('[role="button"]') || parent).click();
        return true;
    }
    return false;
})()
"#;

/// Headless Chromium page fetcher.
///
/// Every call launches its own incognito browser and tears it down before
/// returning, whatever the outcome.
pub struct BrowserFetcher {
    adapters: SiteAdapterRegistry,
    nav_timeout: Duration,
}

impl BrowserFetcher {
    pub fn new(adapters: SiteAdapterRegistry, nav_timeout: Duration) -> Self {
        Self {
            adapters,
            nav_timeout,
        }
    }

    async fn load(&self, browser: &Browser, url: &Url) -> Result<FetchedPage, FetchError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let result = self.read_page(&page, url).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        result
    }

    async fn read_page(&self, page: &Page, url: &Url) -> Result<FetchedPage, FetchError> {
        timeout(self.nav_timeout, async {
            page.goto(url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(|e| FetchError::from_cdp_error(e, url.as_str()))?;

        sleep(IDLE_SETTLE).await;

        let adapter = self.adapters.find(url);
        let warnings = match &adapter {
            Some(adapter) => {
                info!(adapter = adapter.name(), "Running site adapter");
                adapter.prepare(&ChromePage { page }).await
            }
            None => Vec::new(),
        };

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Content(e.to_string()))?;

        Ok(FetchedPage {
            url: url.clone(),
            html,
            adapter: adapter.map(|a| a.name()),
            warnings,
            fetched_at: Utc::now(),
        })
    }
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new(
            SiteAdapterRegistry::with_defaults(),
            crate::config::DEFAULT_NAV_TIMEOUT,
        )
    }
}

#[async_trait]
impl PageSource for BrowserFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let config = BrowserConfig::builder()
            .incognito()
            .request_timeout(self.nav_timeout)
            .build()
            .map_err(FetchError::Launch)?;

        let (mut browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        // Drives the CDP connection; ends once the browser goes away.
        let handler_task = tokio::spawn(drain_events(handler));

        let result = self.load(&browser, url).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }
        handler_task.abort();

        match &result {
            Ok(page) => info!(
                "Fetched {} ({} bytes, {} adapter warnings)",
                page.url,
                page.html.len(),
                page.warnings.len()
            ),
            Err(e) => warn!("Failed to fetch {}: {}", url, e),
        }
        result
    }
}

/// Poll CDP events until the stream ends. Undecodable messages are skipped,
/// not fatal. Returns how many were skipped.
async fn drain_events<S, E>(mut events: S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: Display,
{
    let mut skipped = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            debug!("Skipping CDP event: {}", e);
            skipped += 1;
        }
    }
    skipped
}

/// `PageDriver` over a live Chromium tab.
struct ChromePage<'a> {
    page: &'a Page,
}

impl ChromePage<'_> {
    async fn click_with(&self, script: &str, label: &str) -> Result<bool, FetchError> {
        let literal =
            serde_json::to_string(label).map_err(|e| FetchError::Script(e.to_string()))?;
        let script = script.replace("__LABEL__", &literal);

        self.page
            .evaluate(script)
            .await
            .map_err(|e| FetchError::Script(e.to_string()))?
            .into_value::<bool>()
            .map_err(|e| FetchError::Script(e.to_string()))
    }
}

#[async_trait]
impl PageDriver for ChromePage<'_> {
    async fn settle(&self, delay: Duration) {
        sleep(delay).await;
    }

    async fn click_button(&self, label: &str) -> Result<bool, FetchError> {
        self.click_with(CLICK_BUTTON_SCRIPT, label).await
    }

    async fn click_text(&self, text: &str) -> Result<bool, FetchError> {
        self.click_with(CLICK_TEXT_SCRIPT, text).await
    }
}
