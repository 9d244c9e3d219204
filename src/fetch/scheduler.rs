//! Bounded-concurrency scheduling of download workers.
//!
//! The in-flight bound is structural: references are partitioned into fixed
//! batches that are fully joined before the next batch starts, so at most
//! `concurrency_limit` downloads are ever open. A cooldown between batches
//! throttles request bursts.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::Settings;
use crate::error::ErrorKind;
use crate::fetch::DownloadWorker;
use crate::models::{DownloadOutcome, FetchSummary, ItemReference};

/// Progress events emitted to the UI layer. The scheduler never renders
/// anything itself.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// An item was dispatched into the current batch. 1-based index.
    Started {
        index: usize,
        total: usize,
        url: String,
    },
    /// Applied after the item's batch fully resolved.
    Completed { index: usize, bytes_written: u64 },
    /// Applied after the item's batch fully resolved.
    Failed { index: usize, reason: ErrorKind },
}

/// Runs download workers batch by batch and aggregates their outcomes.
pub struct FetchScheduler {
    concurrency_limit: usize,
    batch_cooldown: Duration,
}

impl FetchScheduler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            // A zero limit would make no progress.
            concurrency_limit: settings.concurrency_limit.max(1),
            batch_cooldown: Duration::from_millis(settings.batch_cooldown_ms),
        }
    }

    /// Download every reference into `dest_dir` with positional names
    /// (`item_<index>.<ext>`, 1-based in discovery order).
    pub async fn run(
        &self,
        client: &Client,
        worker: &DownloadWorker,
        references: Vec<ItemReference>,
        dest_dir: &Path,
        events: mpsc::Sender<FetchEvent>,
    ) -> FetchSummary {
        self.run_with(references, events, |reference, index| async move {
            let stem = format!("item_{}", index);
            worker.fetch_item(client, &reference, dest_dir, &stem).await
        })
        .await
    }

    /// Batch-partitioned driver, generic over the per-item work so the
    /// concurrency policy is testable without a network.
    pub async fn run_with<F, Fut>(
        &self,
        references: Vec<ItemReference>,
        events: mpsc::Sender<FetchEvent>,
        run_one: F,
    ) -> FetchSummary
    where
        F: Fn(ItemReference, usize) -> Fut,
        Fut: Future<Output = DownloadOutcome>,
    {
        let total = references.len();
        let batch_count = total.div_ceil(self.concurrency_limit);
        let mut summary = FetchSummary::default();

        for (batch_no, chunk) in references.chunks(self.concurrency_limit).enumerate() {
            let base = batch_no * self.concurrency_limit;

            let mut batch = Vec::with_capacity(chunk.len());
            let mut indices = Vec::with_capacity(chunk.len());
            for (offset, reference) in chunk.iter().enumerate() {
                let index = base + offset + 1;
                let _ = events
                    .send(FetchEvent::Started {
                        index,
                        total,
                        url: reference.url.clone(),
                    })
                    .await;
                indices.push(index);
                batch.push(run_one(reference.clone(), index));
            }

            // Barrier: outcome aggregation happens only once the whole batch
            // has resolved, even though intra-batch completion order is racy.
            let outcomes = join_all(batch).await;
            for (index, outcome) in indices.into_iter().zip(outcomes) {
                if outcome.success {
                    summary.downloaded += 1;
                    let _ = events
                        .send(FetchEvent::Completed {
                            index,
                            bytes_written: outcome.bytes_written,
                        })
                        .await;
                } else {
                    summary.failed += 1;
                    let _ = events
                        .send(FetchEvent::Failed {
                            index,
                            reason: outcome.reason.unwrap_or(ErrorKind::Transport),
                        })
                        .await;
                }
            }

            debug!(
                "Batch {}/{} complete ({} ok, {} failed so far)",
                batch_no + 1,
                batch_count,
                summary.downloaded,
                summary.failed
            );

            if batch_no + 1 < batch_count {
                tokio::time::sleep(self.batch_cooldown).await;
            }
        }

        summary
    }
}
