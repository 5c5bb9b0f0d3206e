//! Request interception that drops assets the price lookup never needs.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

/// What to do with one outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Abort,
}

/// Blocks images, stylesheets, fonts, media and tracker hosts
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    blocked_domains: Vec<String>,
}

impl ResourceFilter {
    pub fn new(blocked_domains: Vec<String>) -> Self {
        Self {
            blocked_domains: blocked_domains
                .into_iter()
                .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Decide for one request
    pub fn verdict(&self, resource_type: &ResourceType, url: &str) -> Verdict {
        let heavy = matches!(
            resource_type,
            ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media
        );
        if heavy || self.is_blocked_host(url) {
            Verdict::Abort
        } else {
            Verdict::Continue
        }
    }

    fn is_blocked_host(&self, url: &str) -> bool {
        match url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase)) {
            Some(host) => self
                .blocked_domains
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
            // Unparseable URLs: fall back to a substring match
            None => self.blocked_domains.iter().any(|d| url.contains(d.as_str())),
        }
    }

    /// Start intercepting requests on `page`.
    ///
    /// Interception stops when the returned guard is dropped.
    pub async fn install(&self, page: &Page) -> Result<FilterGuard> {
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .context("Failed to listen for paused requests")?;

        let filter = self.clone();
        let intercept = page.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let outcome = match filter.verdict(&event.resource_type, &event.request.url) {
                    Verdict::Abort => intercept
                        .execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ()),
                    Verdict::Continue => intercept
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                };
                if let Err(e) = outcome {
                    debug!("Request {} not resolved: {}", event.request.url, e);
                }
            }
        });

        page.execute(
            EnableParams::builder()
                .pattern(RequestPattern::builder().url_pattern("*").build())
                .build(),
        )
        .await
        .context("Failed to enable request interception")?;

        Ok(FilterGuard { task })
    }
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self::new(vec![
            "google-analytics.com".to_string(),
            "doubleclick.net".to_string(),
        ])
    }
}

/// Keeps the interception task alive for the lifetime of a page
pub struct FilterGuard {
    task: JoinHandle<()>,
}

impl Drop for FilterGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
