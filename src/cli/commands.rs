//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::ResourceRequest;
use crate::net::HttpClient;
use crate::retriever::{FileReader, HttpReader, LocalRetriever, ResourceRetriever};
use crate::services::{DownloadConfig, DownloadService};
use crate::tracker::DownloadTracker;

use super::progress::ProgressDisplay;

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Resource retrieval and download tracking toolkit")]
#[command(version)]
pub struct Cli {
    /// Settings file (default: courier.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one or more resources by URI
    Fetch {
        /// Resource URIs (file://, http://, https://)
        uris: Vec<String>,
        /// Output directory (default: from settings)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of download workers
        #[arg(short, long, default_value = "4")]
        workers: usize,
        /// User recorded as the download owner
        #[arg(short, long, default_value = "anonymous")]
        user: String,
        /// Show progress bars for each download
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Resolve a URI and print resource metadata without downloading
    Probe {
        /// Resource URI
        uri: String,
    },
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch {
            uris,
            output,
            workers,
            user,
            progress,
        } => fetch(&settings, uris, output, workers, &user, progress).await,
        Commands::Probe { uri } => probe(&settings, &uri).await,
    }
}

/// Build the retriever used by the CLI: local readers in a fixed order.
fn build_retriever(settings: &Settings) -> anyhow::Result<Arc<dyn ResourceRetriever>> {
    let client = HttpClient::new(
        settings.request_timeout(),
        settings.request_delay(),
        settings.user_agent.as_deref(),
    )?;

    Ok(Arc::new(
        LocalRetriever::new()
            .with_reader(Box::new(FileReader))
            .with_reader(Box::new(HttpReader::new(client))),
    ))
}

async fn fetch(
    settings: &Settings,
    uris: Vec<String>,
    output: Option<PathBuf>,
    workers: usize,
    user: &str,
    progress: bool,
) -> anyhow::Result<()> {
    anyhow::ensure!(!uris.is_empty(), "at least one URI is required");

    let mut requests = Vec::with_capacity(uris.len());
    for uri in &uris {
        let request =
            ResourceRequest::parse(uri).with_context(|| format!("Invalid URI: {uri}"))?;
        requests.push(request);
    }

    let retriever = build_retriever(settings)?;
    let tracker = Arc::new(DownloadTracker::new());
    let service = DownloadService::new(
        retriever,
        tracker.clone(),
        DownloadConfig {
            chunk_size: settings.chunk_size,
        },
    );

    let dest_dir = output.unwrap_or_else(|| settings.output_dir.clone());

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let consumer = tokio::spawn(async move {
        let mut display = progress.then(ProgressDisplay::new);
        while let Some(event) = event_rx.recv().await {
            if let Some(display) = display.as_mut() {
                display.handle(&event);
            } else if let crate::services::DownloadEvent::Failed { id, error } = &event {
                eprintln!("{} {} {}", style("error:").red().bold(), id, error);
            }
        }
    });

    let summary = service
        .fetch_all(requests, user, &dest_dir, workers, event_tx)
        .await;
    let _ = consumer.await;

    for record in tracker.all().await {
        println!(
            "{}  {:<12} {:>12} bytes  {}",
            record.id,
            record.state,
            record.bytes_transferred,
            record.user
        );
    }
    println!(
        "{} {} completed, {} failed, {} cancelled",
        style("done:").green().bold(),
        summary.completed,
        summary.failed,
        summary.cancelled
    );

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

async fn probe(settings: &Settings, uri: &str) -> anyhow::Result<()> {
    let request = ResourceRequest::parse(uri).with_context(|| format!("Invalid URI: {uri}"))?;
    let retriever = build_retriever(settings)?;

    let response = retriever.retrieve(&request).await?;
    println!("name:      {}", response.name);
    println!(
        "size:      {}",
        response
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "mime type: {}",
        response.mime_type.as_deref().unwrap_or("unknown")
    );
    Ok(())
}
