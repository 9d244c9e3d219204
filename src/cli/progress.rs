//! Progress rendering for the fetch stage.
//!
//! Pure UI layer: consumes scheduler events, owns the indicatif bar. The
//! scheduler knows nothing about terminals.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::fetch::FetchEvent;

pub struct FetchProgress {
    bar: ProgressBar,
}

impl FetchProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}",
            )
            .expect("valid progress template")
            .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn handle(&self, event: &FetchEvent) {
        match event {
            FetchEvent::Started { index, total, .. } => {
                self.bar
                    .set_message(format!("Downloading item {}/{}", index, total));
            }
            FetchEvent::Completed { .. } => {
                self.bar.inc(1);
            }
            FetchEvent::Failed { index, reason } => {
                self.bar.inc(1);
                tracing::debug!("Item {} failed ({})", index, reason);
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
