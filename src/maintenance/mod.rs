//! Background maintenance worker.
//!
//! Runs the periodic housekeeping the daemon needs: cache eviction sweeps
//! and mount health checks, every five minutes by default. The worker is
//! deliberately dumb - each tick re-checks the world from scratch (mount
//! table, cache sizes) rather than carrying state between ticks.
//!
//! # Usage
//!
//! ```ignore
//! let maintainer = Maintainer::new(share, MaintainerConfig::from_config(&config));
//! let commands = maintainer.command_sender();
//! let handle = maintainer.start();
//! // ... later ...
//! commands.send(MaintainerCommand::Stop).await?;
//! handle.await?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;

use crate::cache;
use crate::config::Config;
use crate::net::ShareFiles;

/// Configuration for the maintenance worker.
#[derive(Debug, Clone)]
pub struct MaintainerConfig {
    /// How often housekeeping runs (default: 5 minutes)
    pub interval: Duration,
    /// Whether cache sweeps run at all
    pub cache_enabled: bool,
    /// Cache directory swept for size
    pub cache_dir: PathBuf,
    /// Cache size limit in bytes
    pub max_cache_bytes: u64,
}

impl MaintainerConfig {
    /// Build the worker config from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: Duration::from_secs(config.maintenance.interval_secs),
            cache_enabled: config.cache.enabled,
            cache_dir: config.cache.dir.clone(),
            max_cache_bytes: config.cache.max_size_bytes(),
        }
    }
}

/// Commands that can be sent to the worker.
#[derive(Debug)]
pub enum MaintainerCommand {
    /// Run a housekeeping pass now, outside the schedule
    Sweep,
    /// Stop the worker
    Stop,
}

/// The maintenance worker.
pub struct Maintainer {
    share: ShareFiles,
    config: MaintainerConfig,
    command_tx: mpsc::Sender<MaintainerCommand>,
    command_rx: Option<mpsc::Receiver<MaintainerCommand>>,
}

impl Maintainer {
    pub fn new(share: ShareFiles, config: MaintainerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(8);
        Self {
            share,
            config,
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Get a sender for commands.
    pub fn command_sender(&self) -> mpsc::Sender<MaintainerCommand> {
        self.command_tx.clone()
    }

    /// Start the worker task.
    ///
    /// Returns immediately - the worker runs in a spawned task. The first
    /// tick fires right away, so startup gets an immediate health check.
    pub fn start(mut self) -> tokio::task::JoinHandle<()> {
        let command_rx = self.command_rx.take().expect("Maintainer already started");
        tokio::spawn(async move {
            self.run(command_rx).await;
        })
    }

    /// Main run loop.
    async fn run(&self, mut command_rx: mpsc::Receiver<MaintainerCommand>) {
        let mut check_timer = interval(self.config.interval);

        tracing::info!(target: "maintenance", "Maintenance worker started");

        loop {
            tokio::select! {
                Some(cmd) = command_rx.recv() => {
                    match cmd {
                        MaintainerCommand::Sweep => {
                            self.maintain().await;
                        }
                        MaintainerCommand::Stop => {
                            tracing::info!(target: "maintenance", "Stopped");
                            break;
                        }
                    }
                }

                _ = check_timer.tick() => {
                    self.maintain().await;
                }
            }
        }
    }

    /// One housekeeping pass: mount health check, then cache sweep.
    ///
    /// Both touch the filesystem (and possibly shell out), so they run on
    /// the blocking pool.
    async fn maintain(&self) {
        let mount = self.share.mount().clone();
        let mounted = tokio::task::spawn_blocking(move || mount.ensure_mounted())
            .await
            .unwrap_or(false);
        if !mounted {
            tracing::warn!(target: "maintenance", "Share is not mounted and could not be remounted");
        }

        if !self.config.cache_enabled {
            return;
        }
        let cache_dir = self.config.cache_dir.clone();
        let max_bytes = self.config.max_cache_bytes;
        match tokio::task::spawn_blocking(move || cache::enforce_limit(&cache_dir, max_bytes)).await
        {
            Ok(stats) if stats.removed_files > 0 => {
                tracing::info!(
                    target: "maintenance",
                    removed = stats.removed_files,
                    bytes_freed = stats.bytes_freed,
                    total_bytes = stats.total_bytes,
                    "Cache sweep evicted files"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(target: "maintenance", "Cache sweep task failed: {}", e);
            }
        }
    }
}
