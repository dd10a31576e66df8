use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repowatch::config::parse_duration;
use repowatch::health::CheckResult;
use repowatch::{Config, HealthCheck, RefKind, RepoManager};

#[derive(Parser)]
#[command(name = "repowatch")]
#[command(about = "Clone git branches and keep an eye on your favorite repositories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the branches and tags of a remote repository
    Branches {
        /// Repository URL
        url: String,
    },

    /// Clone a single branch into <dest>/<branch>
    Clone {
        /// Repository URL
        url: String,

        /// Branch or tag to clone
        #[arg(short, long)]
        branch: String,

        /// Destination root (defaults to clone.default_destination, then the working directory)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Don't add the clone to the favorites
        #[arg(long)]
        no_favorite: bool,
    },

    /// Manage favorite repositories
    Favorites {
        #[command(subcommand)]
        favorites_command: FavoritesCommands,
    },

    /// Show every repository cloned so far
    Cloned,

    /// Check all favorites for updates once
    Check,

    /// Keep checking favorites for updates until Ctrl+C
    Watch {
        /// Time between passes, e.g. "30s", "5m" (defaults to poller.interval)
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// System health check and diagnostics
    Doctor,
}

#[derive(Subcommand)]
enum FavoritesCommands {
    /// List favorites
    List,

    /// Add a favorite
    Add {
        /// Repository URL
        url: String,

        /// Local clone path (defaults to <destination>/<repository name>)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Remove a favorite
    Remove {
        /// Repository URL
        url: String,
    },

    /// Open a favorite's local clone in the file browser
    Open {
        /// Repository URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config)?;
    init_logging(cli.verbose, &config)?;
    info!("Starting repowatch v{}", env!("CARGO_PKG_VERSION"));

    let manager = RepoManager::from_config(&config);

    match cli.command {
        Commands::Branches { url } => cmd_branches(&manager, &url).await,
        Commands::Clone {
            url,
            branch,
            dest,
            no_favorite,
        } => cmd_clone(&manager, &config, &url, &branch, dest, no_favorite).await,
        Commands::Favorites { favorites_command } => {
            cmd_favorites(&manager, &config, favorites_command)
        }
        Commands::Cloned => cmd_cloned(&manager),
        Commands::Check => cmd_check(&manager).await,
        Commands::Watch { interval } => cmd_watch(&manager, &config, interval).await,
        Commands::Doctor => cmd_doctor(&config),
    }
}

/// Initialize logging: RUST_LOG wins, then --verbose, then logging.level
fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let default_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.logging.color),
        )
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// clone.default_destination, else the working directory
fn destination_root(config: &Config) -> Result<PathBuf> {
    match &config.clone.default_destination {
        Some(dest) => Ok(PathBuf::from(dest)),
        None => std::env::current_dir().context("Failed to read working directory"),
    }
}

async fn cmd_branches(manager: &RepoManager, url: &str) -> Result<()> {
    match manager.list_branches(url).await {
        Ok(refs) if refs.is_empty() => println!("No branches found"),
        Ok(refs) => {
            for r in refs {
                match r.kind {
                    RefKind::Head => println!("{}", r.name),
                    RefKind::Tag => println!("{} (tag)", r.name),
                }
            }
        }
        // listing failures leave an empty list, like any other lookup miss
        Err(e) => {
            eprintln!("❌ {}", e);
            println!("No branches found");
        }
    }
    Ok(())
}

async fn cmd_clone(
    manager: &RepoManager,
    config: &Config,
    url: &str,
    branch: &str,
    dest: Option<PathBuf>,
    no_favorite: bool,
) -> Result<()> {
    let dest_root = match dest {
        Some(dest) => dest,
        None => destination_root(config)?,
    };

    println!("📥 Cloning {} ({}) into {}", url, branch, dest_root.display());
    let outcome = manager
        .clone_repository(url, branch, &dest_root, !no_favorite)
        .await?;

    println!("✅ Repository cloned into {}", outcome.path.display());
    if outcome.favorited {
        println!("⭐ Added to favorites");
    }
    Ok(())
}

fn cmd_favorites(
    manager: &RepoManager,
    config: &Config,
    favorites_command: FavoritesCommands,
) -> Result<()> {
    match favorites_command {
        FavoritesCommands::List => {
            let favorites = manager.list_favorites()?;
            if favorites.is_empty() {
                println!("No favorites yet");
            }
            for entry in favorites {
                println!("⭐ {} -> {}", entry.url, entry.path.display());
            }
        }
        FavoritesCommands::Add { url, path } => {
            let base = destination_root(config)?;
            let entry = manager.add_favorite(&url, path, &base)?;
            println!("⭐ Added {} -> {}", entry.url, entry.path.display());
        }
        FavoritesCommands::Remove { url } => match manager.remove_favorite(&url)? {
            0 => println!("⚠️  {} is not a favorite", url),
            _ => println!("🗑️  Removed {}", url),
        },
        FavoritesCommands::Open { url } => {
            let path = manager.open_favorite(&url)?;
            println!("📂 Opened {}", path.display());
        }
    }
    Ok(())
}

fn cmd_cloned(manager: &RepoManager) -> Result<()> {
    let repos = manager.registry().load()?;
    if repos.is_empty() {
        println!("No repositories cloned yet");
    }
    for (url, path) in repos {
        println!("📁 {} -> {}", url, path.display());
    }
    Ok(())
}

async fn cmd_check(manager: &RepoManager) -> Result<()> {
    let events = manager.check_updates().await?;
    if events.is_empty() {
        println!("No favorites to check");
    }
    for event in events {
        println!("{}", event);
    }
    Ok(())
}

async fn cmd_watch(manager: &RepoManager, config: &Config, interval: Option<String>) -> Result<()> {
    let interval = match interval {
        Some(raw) => {
            let secs = parse_duration(&raw)?;
            anyhow::ensure!(secs > 0, "Interval must be at least one second");
            std::time::Duration::from_secs(secs)
        }
        None => config.poll_interval()?,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = manager.start_polling(tx, interval)?;

    println!("👀 Watching favorites every {:?} (Ctrl+C to stop)", interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => println!("[{}] {}", event.checked_at.format("%H:%M:%S"), event),
                None => break,
            }
        }
    }

    handle.stop().await;
    Ok(())
}

/// System health check and diagnostics
fn cmd_doctor(config: &Config) -> Result<()> {
    let health = HealthCheck::run(config);
    print_health_report(&health);
    if !health.all_passed() {
        anyhow::bail!("{} health checks failed", health.errors().len());
    }
    Ok(())
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning { "⚠️ " } else { "✅" }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 repowatch System Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    let icon = if health.all_passed() { "✅" } else { "❌" };
    println!("{} {}", icon, health.summary());
}
