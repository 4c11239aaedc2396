//! YAML configuration loading
//!
//! Configuration is read-only: files are loaded at startup and never
//! written back.
//!
//! ```ignore
//! use roomtone_core::config::{default_config_path, load_config};
//!
//! let config: PlayerConfig = load_config(&default_config_path());
//! ```

mod io;
mod paths;

pub use io::{load_config, read_config};
pub use paths::{config_dir, default_config_path, CONFIG_FILE_NAME};
