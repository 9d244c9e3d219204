//! Item discovery on a client-rendered profile page.
//!
//! Content arrives asynchronously and the structural markers vary by site
//! experiment, so discovery probes an ordered list of selector shapes (with
//! one reload retry) and then scrolls until the page height converges.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::browser::RenderSurface;
use crate::config::Settings;
use crate::error::FetchError;
use crate::models::ItemReference;

/// Alternative markup shapes that indicate item content has rendered.
/// Probed in order; any one match is enough.
pub const ITEM_SELECTORS: &[&str] = &[
    "div[data-e2e='user-post-item']",
    "div[class*='DivItemContainer']",
    "a[href*='/video/']",
    "div[class*='VideoItem']",
];

/// Enumerates item references on a profile page.
pub struct ItemDiscovery {
    settings: Settings,
}

impl ItemDiscovery {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Drive the surface through navigation, readiness probing, and
    /// incremental scrolling, then collect the distinct item links.
    ///
    /// Fails with a navigation error only when the page itself cannot load;
    /// a page that loads but never shows items yields an empty list.
    pub async fn discover(
        &self,
        surface: &dyn RenderSurface,
        profile_url: &str,
    ) -> Result<Vec<ItemReference>, FetchError> {
        debug!("Loading profile: {}", profile_url);
        surface
            .navigate(
                profile_url,
                Duration::from_secs(self.settings.navigation_timeout_secs),
            )
            .await?;
        surface.wait(self.settings.settle_delay_ms).await;

        if !self.probe(surface).await {
            debug!("No items found, attempting reload");
            surface.reload().await?;
            if !self.probe(surface).await {
                debug!("Still no items found after reload");
                return Ok(Vec::new());
            }
        }

        self.scroll_to_convergence(surface).await?;

        let links = surface.item_links().await?;
        let mut seen = HashSet::new();
        let references: Vec<ItemReference> = links
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .map(ItemReference::new)
            .collect();

        debug!("Extracted {} item references", references.len());
        Ok(references)
    }

    /// Wait for any of the known markup shapes to appear.
    async fn probe(&self, surface: &dyn RenderSurface) -> bool {
        let timeout = Duration::from_millis(self.settings.selector_timeout_ms);
        for selector in ITEM_SELECTORS {
            if surface.wait_for_selector(selector, timeout).await {
                debug!("Found items with selector: {}", selector);
                return true;
            }
            debug!("Timeout for selector: {}", selector);
        }
        false
    }

    /// Scroll until the page height stops growing or the attempt cap hits.
    async fn scroll_to_convergence(
        &self,
        surface: &dyn RenderSurface,
    ) -> Result<(), FetchError> {
        let mut last_height = surface.scroll_height().await?;
        let mut stable_count = 0usize;

        for attempt in 0..self.settings.max_scroll_attempts {
            surface.scroll_to_bottom().await?;
            surface.wait(self.settings.scroll_delay_ms).await;

            let new_height = surface.scroll_height().await?;
            if new_height == last_height {
                stable_count += 1;
                if stable_count >= self.settings.scroll_stability_threshold {
                    break;
                }
            } else {
                stable_count = 0;
                last_height = new_height;
            }

            debug!("Scroll {}: height = {}", attempt + 1, new_height);
        }

        Ok(())
    }
}
