// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for snapshotbot

use crate::error::{Result, SnapshotError};
use crate::identity::HashAlgorithm;
use crate::scanners::structure::ScanOptions;
use crate::snapshot::Viewport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Traversal limits
    #[serde(default)]
    pub scan: ScanConfig,

    /// Identity fingerprint settings
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Viewport recorded in captured envelopes
    #[serde(default)]
    pub viewport: Viewport,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Structure scan options derived from this configuration
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_items: self.scan.max_items,
            max_frame_depth: self.scan.max_frame_depth,
            hash: self.identity.algorithm,
        }
    }
}

/// Traversal limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum structural records per snapshot
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Maximum nested iframe depth followed by the structure scan
    #[serde(default = "default_max_frame_depth")]
    pub max_frame_depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_frame_depth: default_max_frame_depth(),
        }
    }
}

fn default_max_items() -> usize {
    ScanOptions::DEFAULT_MAX_ITEMS
}

fn default_max_frame_depth() -> usize {
    ScanOptions::DEFAULT_MAX_FRAME_DEPTH
}

/// Identity fingerprint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Hash used for identity keys (fnv64 or rolling32)
    #[serde(default)]
    pub algorithm: HashAlgorithm,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|e| e == "toml").unwrap_or(false)
}

/// Load configuration from a path
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: Config = if is_toml(path) {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    if config.scan.max_items == 0 {
        return Err(SnapshotError::Config(
            "scan.max_items must be at least 1".to_string(),
        ));
    }

    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Get the default config path for a working directory
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".snapshotbot/config.yml")
}

/// Write default configuration to a file
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(&config).map_err(|e| SnapshotError::Config(e.to_string()))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.max_items, 10_000);
        assert_eq!(config.scan.max_frame_depth, 8);
        assert_eq!(config.identity.algorithm, HashAlgorithm::Fnv64);
        assert_eq!(config.viewport.width, 1280);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("scan:\n  max_items: 50\n").unwrap();
        assert_eq!(config.scan.max_items, 50);
        assert_eq!(config.scan.max_frame_depth, 8);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_identity_algorithm_serde() {
        let config: IdentityConfig = toml::from_str("algorithm = \"rolling32\"").unwrap();
        assert_eq!(config.algorithm, HashAlgorithm::Rolling32);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/snapshotbot.yml")).unwrap();
        assert_eq!(config.scan.max_items, 10_000);
    }

    #[test]
    fn test_write_then_load_toml() {
        let temp = TempDir::new().expect("Create temp dir");
        let path = temp.path().join("nested/config.toml");
        write_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.scan.max_items, 10_000);
        assert_eq!(config.viewport.height, 800);
    }

    #[test]
    fn test_zero_max_items_rejected() {
        let temp = TempDir::new().expect("Create temp dir");
        let path = temp.path().join("config.yml");
        std::fs::write(&path, "scan:\n  max_items: 0\n").unwrap();
        assert!(matches!(load_config(&path), Err(SnapshotError::Config(_))));
    }
}
