//! Pipeline orchestration: discovery output wired into the fetch stage.
//!
//! Owns both external-resource lifecycles. The render surface exists only
//! during discovery and is closed before any download starts; the HTTP
//! client is built once and shared across all workers for connection reuse.

use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::browser::BrowserSurface;
use crate::config::Settings;
use crate::discovery::ItemDiscovery;
use crate::fetch::{headers, DownloadWorker, FetchEvent, FetchScheduler};
use crate::models::FetchSummary;

/// Totals for one end-to-end run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunReport {
    pub found: usize,
    pub summary: FetchSummary,
}

/// Wires the two stages together for one profile.
pub struct PipelineOrchestrator {
    settings: Settings,
}

impl PipelineOrchestrator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub async fn run(
        &self,
        profile_url: &str,
        events: mpsc::Sender<FetchEvent>,
    ) -> anyhow::Result<RunReport> {
        let account = account_identifier(profile_url);

        let mut browser = BrowserSurface::launch(&self.settings).await?;
        let page = browser.new_page().await?;
        let discovery = ItemDiscovery::new(self.settings.clone());

        // Discovery failures degrade to an empty run rather than aborting.
        let references = match discovery.discover(&page, profile_url).await {
            Ok(refs) => refs,
            Err(err) => {
                warn!("Discovery failed for {}: {}", profile_url, err);
                Vec::new()
            }
        };

        page.close().await;
        browser.close().await;

        let found = references.len();
        if found == 0 {
            return Ok(RunReport::default());
        }
        info!("Found {} items for {}", found, account);

        let dest_dir = self.settings.account_dir(&account)?;
        let client = build_client(&self.settings)?;
        let worker = DownloadWorker::new(self.settings.min_valid_file_size);
        let scheduler = FetchScheduler::new(&self.settings);

        let summary = scheduler
            .run(&client, &worker, references, &dest_dir, events)
            .await;

        Ok(RunReport { found, summary })
    }
}

fn build_client(settings: &Settings) -> anyhow::Result<Client> {
    let client = Client::builder()
        .user_agent(headers::USER_AGENT)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .timeout(std::time::Duration::from_secs(
            settings.navigation_timeout_secs,
        ))
        .build()?;
    Ok(client)
}

/// Account identifier for the output subdirectory: the `@name` path segment
/// when present, otherwise the host.
pub fn account_identifier(profile_url: &str) -> String {
    if let Some((_, rest)) = profile_url.split_once('@') {
        let name: String = rest
            .chars()
            .take_while(|c| *c != '/' && *c != '?' && *c != '#')
            .collect();
        if !name.is_empty() {
            return name;
        }
    }

    url::Url::parse(profile_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "profile".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_from_handle_segment() {
        assert_eq!(
            account_identifier("https://host.example/@someuser"),
            "someuser"
        );
        assert_eq!(
            account_identifier("https://host.example/@someuser/video/42?lang=en"),
            "someuser"
        );
    }

    #[test]
    fn account_falls_back_to_host() {
        assert_eq!(
            account_identifier("https://host.example/profile/someuser"),
            "host.example"
        );
    }

    #[test]
    fn unparseable_url_gets_placeholder() {
        assert_eq!(account_identifier("not a url"), "profile");
    }
}
