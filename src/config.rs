//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Linux: ~/.config/farsound/config.toml
//! - macOS: ~/Library/Application Support/farsound/config.toml
//!
//! The config file is human-readable and editable. Settings are loaded at
//! startup; `load` never fails (missing or unparseable files fall back to
//! defaults with a logged warning) so the service always starts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote share and mount settings
    pub share: ShareConfig,

    /// Local file cache settings
    pub cache: CacheConfig,

    /// Library database settings
    pub database: DatabaseConfig,

    /// Scanner settings
    pub library: LibraryConfig,

    /// Periodic maintenance settings
    pub maintenance: MaintenanceConfig,
}

/// Remote share and mount point settings.
///
/// When `server` is unset the mount point is treated as a plain local
/// directory and no mount commands are ever issued (local-library mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// SMB server address (hostname or IP); None = local-directory mode
    pub server: Option<String>,

    /// Share name on the server
    pub name: String,

    /// Credentials; guest access when unset
    pub username: Option<String>,
    pub password: Option<String>,

    /// Where to mount the remote share (or the local library root)
    pub mount_point: PathBuf,

    /// Extra options appended to the mount option string (e.g. "uid=1000,gid=1000")
    pub mount_options: Option<String>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            server: None,
            name: "music".to_string(),
            username: None,
            password: None,
            mount_point: PathBuf::from("/mnt/music"),
            mount_options: None,
        }
    }
}

/// Local cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether resolved files are copied into the local cache
    pub enabled: bool,

    /// Cache directory root
    pub dir: PathBuf,

    /// Maximum cache size in gigabytes
    pub max_size_gb: f64,
}

impl CacheConfig {
    /// Maximum cache size in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_gb * 1024.0 * 1024.0 * 1024.0) as u64
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: dirs::cache_dir()
                .map(|d| d.join("farsound"))
                .unwrap_or_else(|| PathBuf::from(".farsound/cache")),
            max_size_gb: 2.0,
        }
    }
}

/// Library database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_dir()
                .map(|d| d.join("farsound").join("library.db"))
                .unwrap_or_else(|| PathBuf::from("farsound.db")),
        }
    }
}

/// Scanner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Lossless audio extensions recognized by the scanner (lowercase, no dot)
    pub extensions: Vec<String>,

    /// Cover art file names probed in order; the first that exists wins
    pub cover_art_names: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            extensions: ["flac", "wav", "alac", "ape", "aiff", "dsd", "dsf", "dff", "wv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cover_art_names: [
                "cover.jpg",
                "folder.jpg",
                "album.jpg",
                "front.jpg",
                "artwork.jpg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Periodic maintenance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Seconds between cache sweeps and mount health checks
    pub interval_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("farsound"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk.
///
/// Uses the default config path unless an explicit path is given
/// (the CLI `--config` flag). Returns default config if the file doesn't
/// exist or can't be parsed. Logs warnings but doesn't fail - we always
/// return a usable config.
pub fn load(explicit: Option<&Path>) -> Config {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                return Config::default();
            }
        },
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk.
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    // Ensure directory exists
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[share]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[database]"));
        assert!(toml.contains("[library]"));
        assert!(toml.contains("[maintenance]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.share.server = Some("192.168.0.3".to_string());
        config.share.username = Some("pi".to_string());
        config.cache.max_size_gb = 4.5;
        config.database.path = PathBuf::from("/var/lib/farsound/library.db");

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.share.server, Some("192.168.0.3".to_string()));
        assert_eq!(parsed.share.username, Some("pi".to_string()));
        assert_eq!(parsed.cache.max_size_gb, 4.5);
        assert_eq!(
            parsed.database.path,
            PathBuf::from("/var/lib/farsound/library.db")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // Config with only some fields
        let toml = r#"
[share]
server = "nas.local"
mount_point = "/mnt/nas-music"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        // Specified fields are set
        assert_eq!(config.share.server, Some("nas.local".to_string()));
        assert_eq!(config.share.mount_point, PathBuf::from("/mnt/nas-music"));

        // Other fields use defaults
        assert_eq!(config.share.name, "music");
        assert!(config.cache.enabled);
        assert_eq!(config.maintenance.interval_secs, 300);
        assert_eq!(config.library.extensions.len(), 9);
    }

    #[test]
    fn test_max_size_bytes() {
        let cache = CacheConfig {
            max_size_gb: 2.0,
            ..CacheConfig::default()
        };
        assert_eq!(cache.max_size_bytes(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_default_extensions_are_lossless() {
        let library = LibraryConfig::default();
        assert!(library.extensions.contains(&"flac".to_string()));
        assert!(library.extensions.contains(&"wv".to_string()));
        assert!(!library.extensions.contains(&"mp3".to_string()));
    }
}
