//! Platform-specific paths for configuration and user algorithms.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/drone/` (Linux), `~/Library/Application Support/drone/` (macOS), `%APPDATA%\drone\` (Windows)
//! - **Settings file**: `<user config>/drone.toml`
//! - **User algorithms**: `<user config>/algorithms/*.json`
//!
//! # Example
//!
//! ```rust,no_run
//! use drone_config::paths;
//!
//! println!("settings: {:?}", paths::default_config_path());
//!
//! if let Some(path) = paths::find_algorithm_file("my_loop") {
//!     println!("found algorithm at {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "drone";

/// Subdirectory name for user algorithms.
const ALGORITHMS_SUBDIR: &str = "algorithms";

/// File name of the settings file.
const CONFIG_FILE: &str = "drone.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the directory holding user algorithm descriptors.
pub fn user_algorithms_dir() -> PathBuf {
    user_config_dir().join(ALGORITHMS_SUBDIR)
}

/// Returns the path of the user settings file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Find an algorithm descriptor file by name.
///
/// Searches in the following order:
/// 1. `name` as a path (absolute or relative)
/// 2. User algorithms directory, adding `.json` if missing
pub fn find_algorithm_file(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.json")
    };
    let user_path = user_algorithms_dir().join(filename);
    user_path.is_file().then_some(user_path)
}

/// Ensure the user config directory exists.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_config_dir())
}

/// Ensure the user algorithms directory exists.
pub fn ensure_user_algorithms_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_algorithms_dir())
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List the algorithm files in the user algorithms directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_algorithms() -> Vec<PathBuf> {
    list_json_in_dir(&user_algorithms_dir())
}

fn list_json_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// Get the algorithm name from a file path (the file stem).
///
/// # Example
///
/// ```rust
/// use drone_config::paths::algorithm_name_from_path;
/// use std::path::Path;
///
/// let name = algorithm_name_from_path(Path::new("/path/to/slow_loop.json"));
/// assert_eq!(name, Some("slow_loop".to_string()));
/// ```
pub fn algorithm_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
