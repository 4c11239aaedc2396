//! Configuration file locations

use std::path::PathBuf;

/// File name of the configuration inside [`config_dir`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Per-user configuration directory (`~/.config/roomtone` on Linux)
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("roomtone")
}

/// Default path of the configuration file
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}
