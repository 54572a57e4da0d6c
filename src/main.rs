// Console front-end: fetch a URL, pick a quality, download everything

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use pro_downloader::downloader::format_selector::is_selectable;
use pro_downloader::downloader::models::{FetchOutcome, JobResult, MediaMode};
use pro_downloader::downloader::{check_environment, quality_options};
use pro_downloader::{DownloaderConfig, Session, UiEvent};

#[derive(Parser, Debug)]
#[command(name = "pro-downloader", version, about = "Download videos and playlists")]
struct Args {
    /// Video or playlist URL
    url: String,

    /// audio or video
    #[arg(short, long, default_value = "video")]
    mode: MediaMode,

    /// Quality label such as 1080p or 128kbps (defaults to the best available)
    #[arg(short, long)]
    quality: Option<String>,

    /// Download folder (defaults to DOWNLOAD_DIR or ~/Downloads)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only list available qualities
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = DownloaderConfig::from_env();
    if let Some(dir) = args.output {
        config = config.with_download_dir(dir);
    }
    check_environment(&config).await;

    let (session, mut rx) = Session::from_config(config).context("Failed to initialize downloader")?;

    println!("Fetching details...");
    session.spawn_fetch(args.url.clone());
    let outcome = loop {
        match rx.recv().await {
            Some(UiEvent::FetchResult(outcome)) => break outcome,
            Some(_) => continue,
            None => bail!("Fetch worker stopped unexpectedly"),
        }
    };

    let streams = match &outcome {
        FetchOutcome::Success {
            title,
            is_collection,
            items,
            representative_streams,
            ..
        } => {
            if *is_collection {
                println!("Playlist: {} ({} videos)", title, items.len());
            } else {
                println!("Title: {}", title);
            }
            representative_streams
        }
        FetchOutcome::Failure { message } => bail!("{}", message),
    };

    let options = quality_options(streams, args.mode);
    println!("{} qualities: {}", args.mode, options.join(", "));
    if args.list {
        return Ok(());
    }

    let quality = match args.quality {
        Some(q) if options.contains(&q) => q,
        Some(q) => {
            log::warn!("Quality {} not available, using {}", q, options.first().map(String::as_str).unwrap_or("-"));
            options.first().cloned().unwrap_or_default()
        }
        None => options.first().cloned().unwrap_or_default(),
    };
    if !is_selectable(&quality) {
        bail!("No downloadable {} quality for this URL", args.mode);
    }

    let request = session
        .batch_request(&outcome, args.mode, &quality)
        .context("Nothing to download")?;
    let handle = session.spawn_batch(request)?;

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(UiEvent::ProgressUpdate { index, snapshot }) => {
                    print!("\r[{}] {:>5.1}% {}   ", index + 1, snapshot.percent * 100.0, snapshot.status_text());
                    std::io::stdout().flush().ok();
                }
                Some(UiEvent::ItemStatusChanged { index, status }) => println!("\n[{}] {}", index + 1, status),
                Some(UiEvent::Notification { title, message }) => eprintln!("{}: {}", title, message),
                Some(UiEvent::BatchComplete { .. }) | None => break,
                Some(UiEvent::FetchResult(_)) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\nCancelling...");
                handle.cancel();
            }
        }
    }

    let results = handle.join.await.context("Download worker panicked")?;
    let completed = results.iter().filter(|r| r.is_completed()).count();
    println!("\nAll downloads finished: {}/{} completed", completed, results.len());
    for (idx, result) in results.iter().enumerate() {
        if let JobResult::Failed(reason) = result {
            println!("  {:02}. ❌ {}", idx + 1, reason);
        }
    }

    Ok(())
}
