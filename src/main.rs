use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, anyhow};
use clap::Parser;
use preview_unblock::{Monitor, MonitorObserver, Settings, StatusReport, logging};

#[derive(Parser)]
#[command(name = "preview-unblock")]
#[command(version, about = "Unblock downloaded PDFs so the preview pane opens them")]
struct Cli {
    /// Folder to monitor (defaults to your Downloads folder)
    folder: Option<PathBuf>,

    /// Configuration file (defaults to ./preview-unblock.toml if present)
    #[arg(short, long, env = "PREVIEW_UNBLOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

/// Prints activity lines, and the status label whenever monitoring starts or stops.
#[derive(Default)]
struct ConsoleObserver {
    running: AtomicBool,
}

impl MonitorObserver for ConsoleObserver {
    fn on_log(&self, line: &str) {
        println!("{line}");
    }

    fn on_status_change(&self, status: &StatusReport) {
        if self.running.swap(status.running, Ordering::SeqCst) != status.running {
            println!("{status}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow!("failed to load configuration: {e}"))?;

    logging::init_with_config(&settings.logging);

    if cli.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let monitor = Monitor::new(settings.watch.clone(), Arc::new(ConsoleObserver::default()));
    let folder = match cli.folder {
        Some(folder) => std::path::absolute(&folder)
            .with_context(|| format!("cannot resolve {}", folder.display()))?,
        None => monitor.folder(),
    };

    monitor
        .start(&folder)
        .await
        .with_context(|| format!("cannot monitor {}", folder.display()))?;
    println!("Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    monitor.stop().await;
    Ok(())
}
