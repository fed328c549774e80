use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use reelfeed::api::ReelsClient;
use reelfeed::app::{App, AppEvent};
use reelfeed::config::{self, Config, PlayerKind};
use reelfeed::keybindings::KeybindingRegistry;
use reelfeed::session::FeedSession;
use reelfeed::ui;
use reelfeed::viewer::{MediaBackend, MpvBackend, NullBackend, PlaybackController};

#[derive(Parser, Debug)]
#[command(name = "reelfeed", about = "Terminal viewer for a short-video reel feed")]
struct Args {
    /// Backend root URL (overrides `base_url` in the config file)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Config file (default: ~/.config/reelfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Media player backend
    #[arg(long, value_enum)]
    player: Option<PlayerKind>,

    /// Seed for the feed shuffle, for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    /// Log file (default: ~/.config/reelfeed/reelfeed.log)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Logs go to a file: the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Restrict the config directory to the current user.
#[cfg(unix)]
fn restrict_permissions(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(dir) {
        Ok(metadata) => {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(dir, perms) {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to set config directory permissions to 0700"
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                path = %dir.display(),
                error = %e,
                "Failed to read config directory metadata"
            );
        }
    }
}

fn build_backend(config: &Config) -> Box<dyn MediaBackend> {
    match config.player {
        PlayerKind::Mpv => Box::new(MpvBackend::new(config.mpv_path.clone())),
        PlayerKind::None => Box::new(NullBackend),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = config::config_dir();
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| config_dir.join("reelfeed.log"));
    init_logging(&log_path)?;

    #[cfg(unix)]
    restrict_permissions(&config_dir);

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(player) = args.player {
        config.player = player;
    }

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!(warning = %warning, "Ignoring keybinding override");
    }

    let client = ReelsClient::new(&config.base_url, config.request_timeout())
        .with_context(|| format!("Invalid base URL '{}'", config.base_url))?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let playback =
        PlaybackController::new(build_backend(&config), config.require_interaction_for_sound);
    let session = FeedSession::new(client.base_url().clone(), playback, rng);

    tracing::info!(
        base_url = %client.base_url(),
        player = ?config.player,
        seed = ?args.seed,
        "Starting reelfeed"
    );

    let mut app = App::new(session, client, config, keybindings);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
