//! XDG-compliant path resolution for bluechi-provision
//!
//! - Linux/macOS: ~/.config/bluechi-provision/
//! - Windows: %APPDATA%\bluechi-provision\

use std::path::PathBuf;

const APP_DIR: &str = "bluechi-provision";

/// Get the configuration directory path
///
/// Returns the directory where config.json and nodes.json are stored:
/// - Linux: `~/.config/bluechi-provision/`
/// - macOS: `~/.config/bluechi-provision/` (XDG-style, not ~/Library)
/// - Windows: `%APPDATA%\bluechi-provision\`
pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".config").join(APP_DIR))
    }
    #[cfg(target_os = "windows")]
    {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// Get the full path to the config file
///
/// Returns: `{config_dir}/config.json`
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("config.json"))
}

/// Get the full path to the node inventory
///
/// Returns: `{config_dir}/nodes.json`
pub fn get_nodes_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("nodes.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_exists() {
        let dir = get_config_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("bluechi-provision"));
    }

    #[test]
    fn test_config_path_ends_with_config_json() {
        let path = get_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("config.json"));
    }

    #[test]
    fn test_nodes_path_ends_with_nodes_json() {
        let path = get_nodes_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("nodes.json"));
    }
}
