//! Interactive command surface.

mod progress;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use console::style;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::fetch::FetchEvent;
use crate::pipeline::PipelineOrchestrator;
use progress::FetchProgress;

#[derive(Parser)]
#[command(
    name = "clipfetch",
    about = "Bulk media downloader for dynamically-rendered profile pages"
)]
struct Cli {
    /// Profile URL. Prompted for interactively when omitted.
    url: Option<String>,

    /// Path to a settings file (defaults to ./clipfetch.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to store downloads under
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Downloads in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Run the browser with a visible window
    #[arg(long)]
    headful: bool,

    /// Persistent browser profile directory (reused across runs)
    #[arg(long)]
    user_data_dir: Option<PathBuf>,

    /// Show per-item diagnostic detail
    #[arg(short, long)]
    verbose: bool,
}

/// Pre-parse check so logging can be configured before clap runs.
pub fn is_verbose() -> bool {
    std::env::args().any(|a| a == "-v" || a == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        settings.download_root = output;
    }
    if let Some(concurrency) = cli.concurrency {
        settings.concurrency_limit = concurrency.max(1);
    }
    if cli.headful {
        settings.headless = false;
    }
    if let Some(dir) = cli.user_data_dir {
        settings.user_data_dir = Some(dir);
    }

    println!("{}", style("clipfetch - profile media downloader").cyan().bold());

    let profile_url = match cli.url {
        Some(url) => url,
        None => prompt_profile_url()?,
    };
    if profile_url.is_empty() {
        anyhow::bail!("No profile URL given");
    }

    println!("{} Finding items...", style("→").cyan());

    let (event_tx, mut event_rx) = mpsc::channel::<FetchEvent>(100);

    // Event handler task (UI layer); the bar is created on the first event
    // since the item total is only known after discovery.
    let event_handler = tokio::spawn(async move {
        let mut display: Option<FetchProgress> = None;
        while let Some(event) = event_rx.recv().await {
            if display.is_none() {
                if let FetchEvent::Started { total, .. } = &event {
                    println!("{} Found {} items", style("✓").green(), total);
                    println!("{}", style("Starting downloads...").cyan().bold());
                    display = Some(FetchProgress::new(*total));
                }
            }
            if let Some(ref display) = display {
                display.handle(&event);
            }
        }
        if let Some(display) = display {
            display.finish();
        }
    });

    let report = PipelineOrchestrator::new(settings).run(&profile_url, event_tx).await?;
    let _ = event_handler.await;

    if report.found == 0 {
        println!("{} No items found", style("!").yellow());
        return Ok(());
    }

    println!(
        "{} Download complete: {} downloaded, {} failed",
        style("✓").green().bold(),
        report.summary.downloaded,
        report.summary.failed
    );
    Ok(())
}

fn prompt_profile_url() -> anyhow::Result<String> {
    print!("\nEnter profile URL: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
