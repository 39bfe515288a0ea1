mod cli;

use livesim::{config, server};
use livesim_media::LiveWindow;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting livesim");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "livesim=trace,livesim_media=trace,tower_http=debug".to_string()
        } else {
            "livesim=info,livesim_media=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Render {
            manifest,
            elapsed,
            stopped,
        } => render_manifest(&manifest, elapsed, stopped, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("livesim {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn render_manifest(
    manifest: &Path,
    elapsed: f64,
    stopped: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let now = Utc::now();
    let start = window_start(now, elapsed)?;

    let config = config::load_config_or_default(config_path)?;

    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read manifest: {:?}", manifest))?;
    let playlist = livesim_media::hls::parse(&text)
        .with_context(|| format!("Failed to parse manifest: {:?}", manifest))?;

    let window = LiveWindow::new(&playlist, start)
        .with_lookahead(config.simulator.lookahead())
        .stopped_at(stopped.then_some(now));

    tracing::debug!(
        segments = window.segment_indices(now).len(),
        "Rendered live window"
    );
    print!("{}", window.render(now));

    Ok(())
}

/// Longest `--elapsed` accepted by `render` (thirty days)
const MAX_RENDER_ELAPSED_SECS: f64 = 30.0 * 24.0 * 3600.0;

/// Start instant of a track that has been live for `elapsed` seconds at `now`.
fn window_start(now: DateTime<Utc>, elapsed: f64) -> Result<DateTime<Utc>> {
    if !elapsed.is_finite() || elapsed < 0.0 {
        anyhow::bail!("Elapsed time must be a non-negative number of seconds");
    }
    if elapsed > MAX_RENDER_ELAPSED_SECS {
        anyhow::bail!("Elapsed time must be at most {MAX_RENDER_ELAPSED_SECS} seconds");
    }

    TimeDelta::try_milliseconds((elapsed * 1000.0) as i64)
        .and_then(|delta| now.checked_sub_signed(delta))
        .with_context(|| format!("Elapsed time out of range: {elapsed}"))
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Streams dir: {:?}", config.simulator.streams_dir);
            println!("  Route prefix: /{}", config.simulator.prefix());
            println!("  Lookahead: {} ms", config.simulator.lookahead_ms);
            println!("  Hold-open delay: {} s", config.simulator.hold_open_secs);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Streams dir: {:?}", config.simulator.streams_dir);
        }
    }

    Ok(())
}
