//! Configuration management for bluechi-provision
//!
//! Handles loading, saving, and validating the JSONC settings file.
//! Creates default config if missing, validates against schema.

pub mod paths;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsonc_parser::parse_to_serde_value;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use paths::{get_config_path, get_nodes_path};
pub use schema::Config;

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        tracing::info!("Created config directory: {}", dir.display());
    }
    Ok(())
}

/// Load configuration from the default config file
///
/// If the config file doesn't exist, creates a new one with default values.
pub fn load_config() -> Result<Config> {
    let config_path =
        get_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    load_config_from(&config_path)
}

/// Load configuration from `config_path`
///
/// Supports JSONC (JSON with comments).
/// Rejects unknown fields for strict validation.
pub fn load_config_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default at: {}",
            config_path.display()
        );
        let config = Config::default();
        save_config_to(&config, config_path)?;
        return Ok(config);
    }

    read_jsonc(config_path, "config")
}

/// Save configuration to `config_path`
///
/// Creates a backup of the existing config (config.json.bak) before overwriting.
pub fn save_config_to(config: &Config, config_path: &Path) -> Result<()> {
    write_json_with_backup(config, config_path, "config")
}

/// Read a JSONC file and deserialize it into `T`
///
/// `what` names the file in error messages ("config", "nodes").
pub(crate) fn read_jsonc<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file: {}", path.display()))?;

    let parsed_value = parse_to_serde_value(&contents, &Default::default())
        .map_err(|e| anyhow::anyhow!("Invalid JSONC in {what} file: {}", e))?
        .ok_or_else(|| anyhow::anyhow!("{} file is empty: {}", what, path.display()))?;

    serde_json::from_value(parsed_value).with_context(|| {
        format!(
            "Invalid {what} in {}. Check for unknown fields or invalid values.",
            path.display()
        )
    })
}

/// Pretty-print `value` to `path`, keeping the previous contents as `<path>.bak`
pub(crate) fn write_json_with_backup<T: Serialize>(
    value: &T,
    path: &Path,
    what: &str,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    if path.exists() {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        let backup_path = PathBuf::from(backup);
        fs::copy(path, &backup_path)
            .with_context(|| format!("Failed to create backup at: {}", backup_path.display()))?;
        tracing::debug!("Created {what} backup: {}", backup_path.display());
    }

    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {what}"))?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write {what} file: {}", path.display()))?;

    tracing::debug!("Saved {what} to: {}", path.display());
    Ok(())
}
