//! Mount lifecycle for the remote SMB/CIFS share.
//!
//! Mount state is never cached in memory: every check reads the OS mount
//! table fresh, so a share that dropped out from under us is noticed on
//! the next call. All command failures are caught, logged, and converted
//! to `false` - mount trouble is recovered by retrying on the next call,
//! never by crashing the process.
//!
//! When no server is configured the mount point is treated as a plain
//! local directory (local-library mode): no mount commands are ever
//! issued and the health check is a directory-existence check.

use std::path::Path;
use std::process::Command;

use crate::config::ShareConfig;

/// Manages the mount point of the configured share.
#[derive(Debug, Clone)]
pub struct MountManager {
    config: ShareConfig,
}

impl MountManager {
    pub fn new(config: ShareConfig) -> Self {
        Self { config }
    }

    /// The configured mount point (the root all share-relative paths hang off).
    pub fn mount_point(&self) -> &Path {
        &self.config.mount_point
    }

    /// Whether a remote server is configured at all.
    fn managed(&self) -> bool {
        self.config.server.is_some()
    }

    /// Check if the share is mounted, mounting it if not.
    ///
    /// Idempotent; safe to call before every remote operation.
    pub fn ensure_mounted(&self) -> bool {
        if self.is_mounted() {
            return true;
        }
        self.mount()
    }

    /// Query the OS mount table for the configured mount point.
    ///
    /// Pure check, no side effects. In local-library mode this is a
    /// directory-existence check instead.
    pub fn is_mounted(&self) -> bool {
        if !self.managed() {
            return self.config.mount_point.is_dir();
        }
        mount_table_contains(&self.config.mount_point)
    }

    /// Mount the share.
    ///
    /// Clears any stale mount at the target first (errors ignored), then
    /// issues the mount command with the configured credentials (guest
    /// access when none are set). Returns true only if a subsequent
    /// mount-table check confirms the mount.
    pub fn mount(&self) -> bool {
        let Some(server) = &self.config.server else {
            return self.config.mount_point.is_dir();
        };

        // Unmount if there's a stale mount
        let _ = self.unmount();

        let source = format!("//{}/{}", server, self.config.name);
        let mut options = match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => format!("username={},password={}", user, pass),
            _ => "guest".to_string(),
        };
        options.push_str(",vers=3.0");
        if let Some(extra) = &self.config.mount_options {
            options.push(',');
            options.push_str(extra);
        }

        let result = Command::new("mount")
            .arg("-t")
            .arg("cifs")
            .arg(&source)
            .arg(&self.config.mount_point)
            .arg("-o")
            .arg(&options)
            .output();

        match result {
            Ok(output) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::error!("Mount command failed: {}", stderr.trim());
            }
            Err(e) => {
                tracing::error!("Failed to run mount command: {}", e);
            }
            Ok(_) => {}
        }

        if self.is_mounted() {
            tracing::info!("Successfully mounted share from {}", server);
            true
        } else {
            tracing::error!("Failed to mount //{}/{}", server, self.config.name);
            false
        }
    }

    /// Unmount the share if it's mounted.
    ///
    /// Returns true if the final state is "not mounted", including when
    /// there was nothing mounted to begin with. Failures are logged but
    /// non-fatal to shutdown.
    pub fn unmount(&self) -> bool {
        if !self.managed() {
            return true;
        }
        if !self.is_mounted() {
            return true;
        }

        let result = Command::new("umount").arg(&self.config.mount_point).output();
        match result {
            Ok(output) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::error!("Unmount command failed: {}", stderr.trim());
            }
            Err(e) => {
                tracing::error!("Failed to run umount command: {}", e);
            }
            Ok(_) => {}
        }

        let unmounted = !self.is_mounted();
        if unmounted {
            tracing::info!("Unmounted share at {:?}", self.config.mount_point);
        }
        unmounted
    }
}

/// Read the OS mount table and look for the given mount point.
fn mount_table_contains(mount_point: &Path) -> bool {
    let needle = mount_point.to_string_lossy();

    // /proc/mounts is the authoritative table on Linux
    if let Ok(table) = std::fs::read_to_string("/proc/mounts") {
        return table
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(needle.as_ref()));
    }

    // No /proc on this platform: fall back to the mount command's table dump
    match Command::new("mount").output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.contains(needle.as_ref())),
        Ok(_) => false,
        Err(e) => {
            tracing::error!("Error checking mount status: {}", e);
            false
        }
    }
}
