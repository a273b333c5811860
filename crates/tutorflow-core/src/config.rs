//! Shared configuration for TutorFlow.
//!
//! Provides functions to locate TutorFlow's state directory and the files
//! stored under it.
//!
//! # Storage Structure
//!
//! All application data is stored under `~/.tutorflow/`:
//!
//! ```text
//! ~/.tutorflow/
//! ├── config/       # .env with bot credentials
//! └── results/      # Confirmed lesson results (JSON lines)
//! ```
//!
//! # Environment Variables
//!
//! - `TUTORFLOW_STATE_DIR`: Override the base state directory
//! - `TUTORFLOW_CONFIG_DIR`: Override the config directory
//! - `TUTORFLOW_RESULTS_DIR`: Override the results directory

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "TUTORFLOW_STATE_DIR";

/// Environment variable for custom config directory.
pub const CONFIG_DIR_ENV: &str = "TUTORFLOW_CONFIG_DIR";

/// Environment variable for custom results directory.
pub const RESULTS_DIR_ENV: &str = "TUTORFLOW_RESULTS_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".tutorflow";

const CONFIG_SUBDIR: &str = "config";
const RESULTS_SUBDIR: &str = "results";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the TutorFlow state directory.
///
/// The state directory is determined by:
/// 1. `TUTORFLOW_STATE_DIR` environment variable if set
/// 2. `~/.tutorflow` if home directory is available
/// 3. `.tutorflow` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
///
/// Defaults to `~/.tutorflow/config/` or `TUTORFLOW_CONFIG_DIR` env var.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CONFIG_SUBDIR))
}

/// Get the results directory.
///
/// Defaults to `~/.tutorflow/results/` or `TUTORFLOW_RESULTS_DIR` env var.
pub fn results_dir() -> PathBuf {
    std::env::var(RESULTS_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(RESULTS_SUBDIR))
}

/// Get the default results file path (one JSON document per line).
pub fn results_file() -> PathBuf {
    results_dir().join("lessons.jsonl")
}

/// Get the .env file path holding the bot token and chat id.
pub fn env_file() -> PathBuf {
    config_dir().join(".env")
}

/// Ensure the config and results directories exist.
///
/// # Errors
/// Returns an error if any directory cannot be created.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(config_dir())?;
    std::fs::create_dir_all(results_dir())?;
    Ok(())
}
