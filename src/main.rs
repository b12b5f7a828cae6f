use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use photo_frame_gallery::config::Configuration;
use photo_frame_gallery::events::ControlCommand;
use photo_frame_gallery::gallery::Gallery;
use photo_frame_gallery::service::GalleryService;
use photo_frame_gallery::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "gallery-server",
    version,
    about = "stateful gallery coordinator for a shared photo frame"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Print the inventory and exit
    #[arg(long = "list")]
    list: bool,
    /// Simulate N display polls (forcing a switch before each) and exit
    #[arg(long = "poll-dry-run", value_name = "ITERATIONS")]
    poll_dry_run: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        list,
        poll_dry_run,
    } = Args::parse();

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::info!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);

    let mut gallery = Gallery::open(&cfg.media_root)
        .with_context(|| format!("failed to open media root {}", cfg.media_root.display()))?;
    gallery.apply_options(&cfg.playback);

    if list {
        run_list(&gallery);
        return Ok(());
    }

    if let Some(iterations) = poll_dry_run {
        run_poll_dry_run(&mut gallery, iterations);
        return Ok(());
    }

    let (command_tx, command_rx) = mpsc::unbounded_channel::<ControlCommand>();
    let cancel = CancellationToken::new();
    let gallery = Arc::new(Mutex::new(gallery));

    // Ctrl-D/Ctrl-C shut the coordinator down
    if io::stdin().is_terminal() {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            let mut sink = Vec::new();
            match io::stdin().read_to_end(&mut sink) {
                Ok(_) => tracing::info!("stdin closed; initiating shutdown"),
                Err(err) => tracing::warn!("stdin watcher failed: {err}"),
            }
            cancel.cancel();
        });
    } else {
        tracing::debug!("stdin is not a terminal; skipping shutdown watcher");
    }

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();
    tasks.spawn({
        let gallery = gallery.clone();
        let cancel = cancel.clone();
        async move {
            tasks::commands::run(command_rx, gallery, cancel)
                .await
                .context("command worker failed")
        }
    });

    let service = GalleryService::new(gallery, command_tx);
    tracing::info!(
        files = service.list_all().len(),
        interval_ms = service.playback_snapshot().interval_millis,
        "gallery coordinator ready; transports attach via GalleryService"
    );

    cancel.cancelled().await;

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

fn run_list(gallery: &Gallery) {
    let files = gallery.list_all();
    println!("# inventory: {} file(s)", files.len());
    for rel in files {
        println!("  {rel}");
    }
}

fn run_poll_dry_run(gallery: &mut Gallery, iterations: usize) {
    println!("# poll dry run\n# files: {}\n# iterations: {}\n", gallery.list_all().len(), iterations);
    for idx in 0..iterations {
        gallery.apply_next();
        match gallery.poll_display() {
            Some(bytes) => println!(
                "  {:>4}: {} ({} bytes)",
                idx + 1,
                gallery.last_served().unwrap_or("?"),
                bytes.len()
            ),
            None => {
                println!("  {:>4}: (nothing to display)", idx + 1);
                break;
            }
        }
    }
}
