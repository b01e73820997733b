//! MusicDock - a floating music player widget with synced lyrics
//! Headless player core with a terminal renderer

mod api;
mod app;
mod audio;
mod error;
mod features;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = app::Cli::parse();

    // Logs go to stderr; stdout is the render surface
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("musicdock=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // One thread: the controller is owned by a single event loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async {
        let app = app::App::new(&cli)?;
        app.run().await
    })
}
