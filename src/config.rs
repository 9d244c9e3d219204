//! Run configuration.
//!
//! A single immutable `Settings` value is built at startup and passed into
//! every component; there is no ambient mutable state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Process-wide configuration, read-only for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory files are persisted under (one subdirectory per account).
    #[serde(default = "default_download_root")]
    pub download_root: PathBuf,

    /// Number of downloads in flight at once. Batches of this size are fully
    /// awaited before the next batch starts.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Hard cap on scroll iterations during discovery.
    #[serde(default = "default_max_scroll_attempts")]
    pub max_scroll_attempts: usize,

    /// Consecutive no-growth scrolls required to conclude the page is done
    /// loading.
    #[serde(default = "default_scroll_stability_threshold")]
    pub scroll_stability_threshold: usize,

    /// Files smaller than this are treated as error-page placeholders and
    /// deleted.
    #[serde(default = "default_min_valid_file_size")]
    pub min_valid_file_size: u64,

    /// Delay after navigation before probing for content, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Delay after each scroll for asynchronous content injection.
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Per-selector timeout while probing for item markup.
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// Page navigation timeout in seconds.
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Pause between download batches.
    #[serde(default = "default_batch_cooldown_ms")]
    pub batch_cooldown_ms: u64,

    /// Run the browser headless. Headful can help when headless detection
    /// blocks the page.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Persistent browser profile directory, reused across runs when set.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,

    /// Extra Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

fn default_download_root() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_concurrency_limit() -> usize {
    3
}

fn default_max_scroll_attempts() -> usize {
    20
}

fn default_scroll_stability_threshold() -> usize {
    3
}

fn default_min_valid_file_size() -> u64 {
    10_000
}

fn default_settle_delay_ms() -> u64 {
    3_000
}

fn default_scroll_delay_ms() -> u64 {
    1_000
}

fn default_selector_timeout_ms() -> u64 {
    5_000
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_batch_cooldown_ms() -> u64 {
    1_000
}

fn default_headless() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        toml::from_str("").expect("empty settings must deserialize from defaults")
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults if the file is absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let candidate = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("clipfetch.toml"));

        if candidate.exists() {
            let raw = fs::read_to_string(&candidate)?;
            let settings = toml::from_str(&raw)?;
            tracing::debug!("Loaded settings from {}", candidate.display());
            Ok(settings)
        } else if path.is_some() {
            anyhow::bail!("Config file not found: {}", candidate.display())
        } else {
            Ok(Self::default())
        }
    }

    /// Destination directory for one account's files, created if absent.
    pub fn account_dir(&self, account: &str) -> std::io::Result<PathBuf> {
        let dir = self.download_root.join(account);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
