use crate::error::Result;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DB_FILENAME: &str = "cmdbar.json";

/// Get the cmdbar configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var("CMDBAR_HOME") {
        return PathBuf::from(dir);
    }

    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".cmdbar"))
        .unwrap_or_else(|_| PathBuf::from(".cmdbar"))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Get the path to the database file
pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

/// Check if the database file exists
pub fn db_file_exists() -> bool {
    get_db_file_path().exists()
}
