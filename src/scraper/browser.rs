//! Browser session using chromiumoxide.
//!
//! A session owns at most one Chromium process and one browser context.
//! Every scrape stage runs between `acquire` and `release`; `release` is
//! called on every exit path by the caller, and `Drop` stops the event
//! handler if a session is abandoned mid-flight.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::retry::{retry, RetryConfig};

/// Fixed launch arguments, so navigations behave the same on every host
const LAUNCH_ARGS: &[&str] = &[
    "--headless=new",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-gpu",
    "--no-zygote",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-background-networking",
    "--mute-audio",
    "--ignore-certificate-errors",
];

struct LiveBrowser {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
}

/// Owned browser + context pair
pub struct BrowserSession {
    settings: BrowserSettings,
    live: Option<LiveBrowser>,
    context: Option<BrowserContextId>,
}

impl BrowserSession {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            live: None,
            context: None,
        }
    }

    /// Close any previous browser, then launch a fresh one
    pub async fn acquire(&mut self) -> Result<()> {
        if self.live.is_some() {
            self.release().await;
            info!("Previous browser closed");
        }

        let policy = RetryConfig::browser(self.settings.launch_retries);
        let settings = self.settings.clone();
        let live = retry(&policy, "browser launch", || launch(&settings)).await?;
        self.live = Some(live);

        info!("Browser initialized");
        Ok(())
    }

    /// Create the isolated context pages are opened in
    pub async fn new_context(&mut self) -> Result<()> {
        let live = self
            .live
            .as_mut()
            .context("Browser not acquired")?;

        if let Some(old) = self.context.take() {
            if let Err(e) = live.browser.dispose_browser_context(old).await {
                warn!("Failed to dispose previous context: {}", e);
            }
        }

        let id = live
            .browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .context("Failed to create browser context")?;
        self.context = Some(id);
        Ok(())
    }

    /// Open a blank page inside the active context
    pub async fn new_page(&self) -> Result<Page> {
        let live = self.live.as_ref().context("Browser not acquired")?;
        let context = self.context.clone().context("Browser context not created")?;

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build page params: {}", e))?;

        live.browser
            .new_page(params)
            .await
            .context("Failed to create new page")
    }

    /// Close the context and the browser; failures are logged, not returned
    pub async fn release(&mut self) {
        let Some(mut live) = self.live.take() else {
            self.context = None;
            return;
        };

        if let Some(context) = self.context.take() {
            if let Err(e) = live.browser.dispose_browser_context(context).await {
                warn!("Error closing browser context: {}", e);
            }
        }

        if let Err(e) = live.browser.close().await {
            warn!("Error closing browser: {}", e);
        }
        match live.browser.wait().await {
            Ok(status) => debug!("Browser process exited: {:?}", status),
            Err(e) => debug!("Error waiting for browser exit: {}", e),
        }
        live.handle.abort();
        debug!("Browser released");
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            warn!("Browser session dropped without release");
            live.handle.abort();
        }
    }
}

async fn launch(settings: &BrowserSettings) -> Result<LiveBrowser> {
    let mut builder = BrowserConfig::builder().disable_default_args();
    if let Some(path) = &settings.executable {
        builder = builder.chrome_executable(path);
    }
    for arg in LAUNCH_ARGS {
        builder = builder.arg(*arg);
    }
    let config = builder
        .window_size(1920, 1080)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

    let (browser, mut handler) = ChromeBrowser::launch(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to launch browser: {}", e))?;

    // Handler must keep running for the browser to work
    let handle = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("Browser handler error: {}", e);
            }
        }
    });

    Ok(LiveBrowser { browser, handle })
}
