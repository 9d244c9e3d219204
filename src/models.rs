//! Core data types shared between the discovery and fetch stages.

use chrono::{DateTime, Utc};

use crate::error::ErrorKind;

/// An opaque link to one item's detail page, found during discovery.
///
/// Uniqueness is by URL. Discovery order carries no meaning beyond
/// deterministic output naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReference {
    pub url: String,
    pub discovered_at: DateTime<Utc>,
}

impl ItemReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            discovered_at: Utc::now(),
        }
    }
}

/// The directly-fetchable media address extracted from a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub asset_url: String,
    pub referer_url: String,
}

/// Result of one download attempt. Failures are reported here, never raised.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub reference: ItemReference,
    pub success: bool,
    pub reason: Option<ErrorKind>,
    pub bytes_written: u64,
}

impl DownloadOutcome {
    pub fn ok(reference: ItemReference, bytes_written: u64) -> Self {
        Self {
            reference,
            success: true,
            reason: None,
            bytes_written,
        }
    }

    pub fn failed(reference: ItemReference, reason: ErrorKind) -> Self {
        Self {
            reference,
            success: false,
            reason: Some(reason),
            bytes_written: 0,
        }
    }
}

/// Aggregate counts for a full fetch-stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub failed: usize,
}

impl FetchSummary {
    pub fn total(&self) -> usize {
        self.downloaded + self.failed
    }
}
