//! Default paths for lictrack components
//!
//! - Config: `$LICTRACK_CONFIG`, else `$XDG_CONFIG_HOME/lictrack/config.toml`,
//!   else `~/.config/lictrack/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const LICTRACK_CONFIG_ENV: &str = "LICTRACK_CONFIG";

const CONFIG_FILENAME: &str = "config.toml";

const APP_DIR: &str = "lictrack";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$LICTRACK_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/lictrack/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/lictrack/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(LICTRACK_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the LICTRACK_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}
