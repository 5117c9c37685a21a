//! Configuration loading and data directory resolution

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "REELFEED_DATA_DIR";

/// Optional TOML config file contents (`<config_dir>/reelfeed/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory holding the database file
    pub data_dir: Option<PathBuf>,
}

/// Data directory resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `REELFEED_DATA_DIR` environment variable
/// 3. TOML config file
/// 4. OS-dependent default (fallback)
///
/// A missing or unreadable config file never fails resolution; it falls
/// through to the default.
pub fn resolve_data_dir(cli_arg: Option<&Path>) -> PathBuf {
    resolve_from(
        cli_arg,
        std::env::var(DATA_DIR_ENV).ok(),
        config_file_path().as_deref(),
    )
}

/// Resolution with the ambient inputs passed in, so the priority order is
/// testable without touching process environment or the real config dir
fn resolve_from(
    cli_arg: Option<&Path>,
    env_value: Option<String>,
    config_path: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Some(path) = env_value {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(config_path) = config_path {
        if let Ok(contents) = std::fs::read_to_string(config_path) {
            if let Ok(config) = toml::from_str::<TomlConfig>(&contents) {
                if let Some(data_dir) = config.data_dir {
                    return data_dir;
                }
            }
        }
    }

    // Priority 4: OS-dependent default
    default_data_dir()
}

/// Database file inside the resolved data directory
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("reelfeed.db")
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reelfeed").join("config.toml"))
}

/// Platform default: the user's local data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("reelfeed"))
        .unwrap_or_else(|| PathBuf::from("./reelfeed_data"))
}
