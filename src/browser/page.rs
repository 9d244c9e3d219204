//! Render-surface capability used by the discovery stage.
//!
//! Discovery depends only on this trait, not on a specific rendering engine,
//! so the scroll/probe logic can be exercised against a scripted fake.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;

use crate::error::FetchError;

/// Operations discovery needs from a rendered page.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Navigate and wait for the initial document, bounded by `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), FetchError>;

    /// Reload the current page.
    async fn reload(&self) -> Result<(), FetchError>;

    /// True if the selector appears within `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool;

    /// Scroll to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<(), FetchError>;

    /// Total scrollable height of the document.
    async fn scroll_height(&self) -> Result<i64, FetchError>;

    /// Hrefs of all item-detail anchors currently in the DOM.
    async fn item_links(&self) -> Result<Vec<String>, FetchError>;

    /// Cooperative pause.
    async fn wait(&self, ms: u64);
}

/// Chrome DevTools Protocol implementation of [`RenderSurface`].
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Close the underlying page. chromiumoxide pages hold CDP connections
    /// until explicitly closed.
    pub async fn close(self) {
        let _ = self.page.close().await;
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, js: &str) -> Result<T, FetchError> {
        self.page
            .evaluate(js)
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?
            .into_value()
            .map_err(|e| FetchError::Navigation(e.to_string()))
    }
}

#[async_trait]
impl RenderSurface for CdpPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), FetchError> {
        let goto = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
            Ok(())
        };

        tokio::time::timeout(timeout, goto)
            .await
            .map_err(|_| FetchError::Navigation(format!("Timed out loading {}", url)))?
    }

    async fn reload(&self) -> Result<(), FetchError> {
        self.page
            .reload()
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool {
        // CDP has no built-in selector wait; poll until the deadline.
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), FetchError> {
        // scrollTo evaluates to undefined; the result is discarded.
        self.page
            .evaluate("window.scrollTo(0, document.documentElement.scrollHeight)")
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64, FetchError> {
        self.evaluate("document.documentElement.scrollHeight").await
    }

    async fn item_links(&self) -> Result<Vec<String>, FetchError> {
        self.evaluate(
            r#"Array.from(new Set(
                Array.from(document.querySelectorAll('a[href*="/video/"]'))
                    .map(el => el.href)
            ))"#,
        )
        .await
    }

    async fn wait(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
