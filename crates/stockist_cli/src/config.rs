//! Configuration file support for stockist.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STOCKIST_`, e.g., `STOCKIST_DATABASE_URL`)
//! 3. Config file (~/.config/stockist/config.toml or ./stockist.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/stockist/stockist.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/stockist/stockist.db"  # optional, this is the default
//!
//! [sync]
//! actor = "ops@example.com"
//! apply_timeout_secs = 30
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Default sync options.
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/stockist/stockist.db` if not specified.
    pub url: Option<String>,
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Actor recorded when the CLI flag is absent.
    pub actor: String,
    /// Bound on the apply transaction's wall-clock time, in seconds.
    pub apply_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            actor: whoami(),
            apply_timeout_secs: 30,
        }
    }
}

/// Best-effort local identity for audit attribution.
fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "stockist-cli".to_string())
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/stockist/config.toml)
    /// 3. Local config file (./stockist.toml)
    /// 4. Environment variables with STOCKIST_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        // Add XDG config file if it exists
        if let Some(proj_dirs) = ProjectDirs::from("", "", "stockist") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Add local config file (higher priority than XDG)
        let local_config = PathBuf::from("stockist.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./stockist.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Add STOCKIST_ prefixed environment variables
        // e.g., STOCKIST_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("STOCKIST")
                .separator("_")
                .try_parsing(true),
        );

        // Build the config and deserialize
        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// If no database URL is configured, defaults to
    /// `sqlite://~/.local/state/stockist/stockist.db?mode=rwc` on Linux
    /// (using the XDG state directory) or the platform-appropriate
    /// equivalent. The `mode=rwc` parameter enables read-write access and
    /// creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("stockist.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/stockist` or `~/.local/state/stockist`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stockist").map(|dirs| {
            // state_dir() returns None on macOS/Windows, fall back to data_dir
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_database_url() {
        let config = Config::default();
        let url = config.database_url();
        assert!(url.is_some());
        assert!(url.unwrap().starts_with("sqlite://"));
    }

    #[test]
    fn test_default_sync_config() {
        let sync = SyncConfig::default();
        assert_eq!(sync.apply_timeout_secs, 30);
        assert!(!sync.actor.is_empty());
    }
}
