//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed
//! arguments and returns an `anyhow::Result<()>`. Failures surface as a
//! plain message and a nonzero exit, never a stack trace.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::library::Library;
use crate::net::{MountManager, ShareFiles};
use crate::{cache, config, db, maintenance};

/// farsound - remote-share lossless music library
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file (defaults to the OS config directory)
    #[arg(short, long, env = "FARSOUND_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the service: mount, first-run scan, periodic maintenance
    Run,
    /// Scan the share and update the library index
    Scan,
    /// Search albums by a title or artist substring
    Search {
        query: String,
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one album with its track listing
    Album {
        id: i64,
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Resolve a share-relative file path to a playable local path
    Resolve { path: String },
    /// Mount the configured share
    Mount,
    /// Unmount the configured share
    Unmount,
    /// Show mount and cache status
    Status,
    /// Write a default config file to the OS config directory
    InitConfig,
}

/// Run the specified CLI command.
///
/// With no subcommand the service runs in the foreground (daemon mode).
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = config::load(cli.config.as_deref());

    match &cli.command {
        None | Some(Commands::Run) => cmd_run(&rt, &config),
        Some(Commands::Scan) => cmd_scan(&rt, &config),
        Some(Commands::Search { query, format }) => cmd_search(&rt, &config, query, format),
        Some(Commands::Album { id, format }) => cmd_album(&rt, &config, *id, format),
        Some(Commands::Resolve { path }) => cmd_resolve(&config, path),
        Some(Commands::Mount) => cmd_mount(&config),
        Some(Commands::Unmount) => cmd_unmount(&config),
        Some(Commands::Status) => cmd_status(&config),
        Some(Commands::InitConfig) => cmd_init_config(),
    }
}

// ============================================================================
// Individual command implementations
// ============================================================================

fn cmd_run(rt: &Runtime, config: &config::Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await;

        if !library.share().mount().ensure_mounted() {
            eprintln!("Failed to mount network share. Check configuration and network connection.");
            std::process::exit(1);
        }

        if library.is_empty().await {
            tracing::info!("Library index is empty, performing initial scan");
            if !library.scan().await {
                tracing::warn!("Initial scan failed; service continues without an index");
            }
        }

        let maintainer = maintenance::Maintainer::new(
            library.share().clone(),
            maintenance::MaintainerConfig::from_config(config),
        );
        let commands = maintainer.command_sender();
        let handle = maintainer.start();

        println!("farsound running. Press Ctrl+C to stop.");
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }

        tracing::info!("Shutting down");
        let _ = commands.send(maintenance::MaintainerCommand::Stop).await;
        let _ = handle.await;

        // Unmount failures are logged but non-fatal to shutdown
        if !library.share().mount().unmount() {
            tracing::warn!("Share did not unmount cleanly");
        }
    });
    Ok(())
}

fn cmd_scan(rt: &Runtime, config: &config::Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await;
        println!("Scanning library...");
        if library.scan().await {
            let albums = db::album_count(library.pool()).await.unwrap_or(0);
            println!("Scan complete. {} albums indexed.", albums);
        } else {
            eprintln!("Scan failed. Check the share configuration and logs.");
            std::process::exit(1);
        }
    });
    Ok(())
}

fn cmd_search(rt: &Runtime, config: &config::Config, query: &str, format: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await;
        let results = library.search_albums(query).await;

        if format == "json" {
            match serde_json::to_string_pretty(&results) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error encoding results: {}", e);
                    std::process::exit(1);
                }
            }
            return;
        }

        if results.is_empty() {
            println!("No albums found.");
            return;
        }
        for entry in &results {
            println!(
                "[{}] {} - {} ({})",
                entry.album.id, entry.album.artist, entry.album.title, entry.album.year
            );
            println!("      {} tracks", entry.tracks.len());
        }
    });
    Ok(())
}

fn cmd_album(rt: &Runtime, config: &config::Config, id: i64, format: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await;
        let Some(entry) = library.album_by_id(id).await else {
            eprintln!("No album with id {}", id);
            std::process::exit(1);
        };

        if format == "json" {
            match serde_json::to_string_pretty(&entry) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error encoding album: {}", e);
                    std::process::exit(1);
                }
            }
            return;
        }

        println!(
            "{} - {} ({})",
            entry.album.artist, entry.album.title, entry.album.year
        );
        if let Some(cover) = &entry.album.cover_art {
            println!("Cover: {}", cover);
        }
        for track in &entry.tracks {
            println!(
                "  {}.{:02} {} [{}]",
                track.disc_number,
                track.track_number,
                track.title,
                format_duration(track.duration)
            );
        }
    });
    Ok(())
}

fn cmd_resolve(config: &config::Config, path: &str) -> anyhow::Result<()> {
    // Resolution needs no database, only the share accessor
    let share = ShareFiles::new(&config.share, &config.cache);
    match share.resolve(path) {
        Some(local) => println!("{}", local.display()),
        None => {
            eprintln!("File not available: {}", path);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn cmd_mount(config: &config::Config) -> anyhow::Result<()> {
    let mount = MountManager::new(config.share.clone());
    if mount.ensure_mounted() {
        println!("Share mounted at {}", config.share.mount_point.display());
    } else {
        eprintln!("Failed to mount share.");
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_unmount(config: &config::Config) -> anyhow::Result<()> {
    let mount = MountManager::new(config.share.clone());
    if mount.unmount() {
        println!("Share unmounted.");
    } else {
        eprintln!("Failed to unmount share.");
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_status(config: &config::Config) -> anyhow::Result<()> {
    let mount = MountManager::new(config.share.clone());
    println!(
        "Share:  {} at {}",
        if mount.is_mounted() {
            "mounted"
        } else {
            "not mounted"
        },
        mount.mount_point().display()
    );

    if config.cache.enabled {
        let used = cache::total_size(&config.cache.dir);
        println!(
            "Cache:  {:.2} GiB used of {:.2} GiB",
            used as f64 / (1024.0 * 1024.0 * 1024.0),
            config.cache.max_size_gb
        );
    } else {
        println!("Cache:  disabled");
    }

    println!("Index:  {}", config.database.path.display());
    Ok(())
}

fn cmd_init_config() -> anyhow::Result<()> {
    if let Some(path) = config::config_path()
        && path.exists()
    {
        eprintln!("Config already exists at {}", path.display());
        std::process::exit(1);
    }
    match config::save(&config::Config::default()) {
        Ok(()) => {
            if let Some(path) = config::config_path() {
                println!("Wrote default config to {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Failed to write config: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

// ============================================================================
// Helper functions
// ============================================================================

/// Open the library or exit with a plain message.
async fn open_library(config: &config::Config) -> Library {
    match Library::open(config).await {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Failed to open library: {}", e);
            std::process::exit(1);
        }
    }
}

/// Format seconds as mm:ss.
fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
