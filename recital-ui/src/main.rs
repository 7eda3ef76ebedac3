//! Recital UI - Main entry point
//!
//! Terminal clients for a live recital:
//! - `display`: audience screen, follows the current program item
//! - `admin`: set or clear the current item
//! - `checkin`: backstage performer check-in board
//! - `config`: show or write the bootstrap configuration

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recital_common::config::{
    default_config_file, load_config, resolve_config_path, write_toml_config, CONFIG_ENV_VAR,
};
use recital_common::config::TomlConfig;
use recital_common::{time, CheckinField, LocalCache, ProgramItem};
use recital_ui::logging;
use recital_ui::sync::{run_display, LoopTiming};
use recital_ui::view::{render_admin, render_checkin, render_display, DisplayView};
use recital_ui::{
    AdminClient, ApiClient, CheckinBoard, ProgramFeed, SyncEngine, SyncState, SyncTrigger,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Command-line arguments for recital-ui
#[derive(Parser, Debug)]
#[command(name = "recital-ui")]
#[command(about = "Display, admin and check-in clients for a live recital")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the current program item (type `r` + Enter to refresh, `q` to quit)
    Display {
        /// Render once and exit
        #[arg(long)]
        once: bool,
    },
    /// Set or clear the current program item
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Performer check-in board
    Checkin {
        #[command(subcommand)]
        action: CheckinAction,
    },
    /// Bootstrap configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// List program items with their current marker
    List,
    /// Make ORDER the current item ("-1" clears)
    Set { order: String },
    /// Clear the current item
    Clear,
    /// Click the item at POSITION: clears it if current, sets it otherwise
    Toggle { position: usize },
}

#[derive(Subcommand, Debug)]
enum CheckinAction {
    /// List performers
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Flip check_in or check_out for one performer
    Toggle { name: String, field: CheckinField },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging comes first so config warnings are not lost.
    let log_filter = logging::init(args.log_level.as_deref());

    info!(
        "Starting recital-ui v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_path = resolve_config_path(args.config.as_deref());
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    log_filter.apply_config_level(&config.logging.level);

    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("Config file: none (compiled defaults)"),
    }

    match args.command {
        Command::Display { once } => display(&config, once).await,
        Command::Admin { action } => admin(&config, action).await,
        Command::Checkin { action } => checkin(&config, action).await,
        Command::Config { action } => config_command(&config, config_path, action),
    }
}

fn api_client(config: &TomlConfig) -> Result<ApiClient> {
    ApiClient::new(config.api.clone(), config.request_timeout())
        .context("Failed to build HTTP client")
}

fn open_cache(config: &TomlConfig) -> LocalCache {
    let path = config.resolved_cache_path();
    info!("Local cache: {}", path.display());
    LocalCache::open(path)
}

async fn display(config: &TomlConfig, once: bool) -> Result<()> {
    let cache = open_cache(config);
    let client = api_client(config)?;
    let feed = ProgramFeed::from_config(&config.program, &config.api, client.http().clone());
    if !config.api.use_api {
        info!("API disabled, following the local cache only");
    }
    let mut engine = SyncEngine::new(config.api.use_api.then_some(client), feed);

    let images_dir = config.program.images_dir.clone();
    let render = move |state: &SyncState, items: &[ProgramItem]| {
        let view = DisplayView::build(items, &images_dir);
        let header = time::display_datetime(&time::local_now());
        println!("{}", render_display(&view, &header));
    };

    if once {
        engine.reconcile(SyncTrigger::Initial, &cache).await;
        render(engine.state(), engine.snapshot());
        return Ok(());
    }

    let (refresh_tx, refresh_rx) = mpsc::channel(8);
    let (quit_tx, quit_rx) = oneshot::channel();
    tokio::spawn(read_keys(refresh_tx, quit_tx));

    let shutdown = async move {
        tokio::select! {
            _ = shutdown_signal() => {}
            _ = quit_requested(quit_rx) => info!("Quit requested"),
        }
    };

    let timing = LoopTiming {
        poll_interval: config.poll_interval(),
        cache_watch_interval: config.cache_watch_interval(),
    };
    info!(
        "Display polling every {} ms",
        timing.poll_interval.as_millis()
    );

    run_display(&mut engine, &cache, timing, refresh_rx, shutdown, render).await;
    Ok(())
}

/// Line commands from stdin: `r` refreshes, `q` quits
async fn read_keys(refresh: mpsc::Sender<()>, quit: oneshot::Sender<()>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim() {
            "r" => {
                if refresh.send(()).await.is_err() {
                    return;
                }
            }
            "q" => {
                let _ = quit.send(());
                return;
            }
            _ => {}
        }
    }
}

/// Resolves only on an explicit quit; a closed stdin keeps the display running
async fn quit_requested(quit: oneshot::Receiver<()>) {
    if quit.await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn admin(config: &TomlConfig, action: AdminAction) -> Result<()> {
    let cache = open_cache(config);
    let client = api_client(config)?;
    let feed = ProgramFeed::from_config(&config.program, &config.api, client.http().clone());
    let mut admin = AdminClient::new(
        config.api.use_api.then_some(client),
        feed,
        config.notice_duration(),
    );

    // A failed list load is reported through the admin notice.
    let _ = admin.refresh(&cache).await;

    let result = match action {
        AdminAction::List => Ok(()),
        AdminAction::Set { order } => admin.set_current(&order, &cache).await.map(|_| ()),
        AdminAction::Clear => admin.clear_all(&cache).await,
        AdminAction::Toggle { position } => {
            admin.toggle_current(position, &cache).await.map(|_| ())
        }
    };

    print!("{}", render_admin(admin.state(), admin.notices().active()));

    // Remote failures were already applied locally and announced.
    if let Err(e) = result {
        warn!("Admin update incomplete: {}", e);
    }
    Ok(())
}

async fn checkin(config: &TomlConfig, action: CheckinAction) -> Result<()> {
    if !config.api.use_api {
        bail!("The check-in board needs the API; set use_api = true");
    }
    let board = CheckinBoard::new(api_client(config)?, config.notice_duration());
    let _ = board.fetch_status().await;

    match action {
        CheckinAction::List { search } => {
            if let Some(query) = search {
                board.set_query(query);
            }
        }
        CheckinAction::Toggle { name, field } => {
            if let Err(e) = board.toggle(&name, field).await {
                warn!("Check-in update failed: {}", e);
            }
        }
    }

    let notice = board.active_notice();
    print!(
        "{}",
        render_checkin(&board.visible(), board.empty_message(), notice.as_ref())
    );
    Ok(())
}

fn config_command(
    config: &TomlConfig,
    config_path: Option<PathBuf>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
            print!("{}", text);
        }
        ConfigAction::Init { force } => {
            let Some(path) = config_path.or_else(default_config_file) else {
                bail!("No config directory on this platform; pass --config");
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            write_toml_config(&TomlConfig::default(), &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Ctrl+C (and SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
