//! Centralized path management for the filez CLI
//!
//! Configuration lives in the platform config directory, temp cache files
//! for piped or nested content in the platform cache directory.

use std::path::PathBuf;

/// The name of the application directory used across all platforms
const APP_DIR: &str = "filez";

/// The name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// Returns the path to the configuration directory
///
/// `XDG_CONFIG_HOME` wins on Unix-like systems, then the platform default
/// (`~/.config/filez`, `~/Library/Application Support/filez`,
/// `%APPDATA%\filez`). Falls back to `.filez` in the current directory.
pub fn get_config_dir() -> PathBuf {
    #[cfg(not(target_os = "windows"))]
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join(APP_DIR);
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".filez"))
}

/// Returns the path to the configuration file
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

/// Returns the directory for temp cache files
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(std::env::temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_in_config_dir() {
        let config_path = get_config_path();
        let config_dir = get_config_dir();

        assert!(
            config_path.starts_with(&config_dir),
            "Config path {} should be under config dir {}",
            config_path.display(),
            config_dir.display()
        );
        assert_eq!(
            config_path.file_name().and_then(|n| n.to_str()),
            Some(CONFIG_FILE)
        );
    }

    #[test]
    fn test_paths_are_not_empty() {
        assert!(!get_config_dir().as_os_str().is_empty());
        assert!(!get_cache_dir().as_os_str().is_empty());
    }
}
