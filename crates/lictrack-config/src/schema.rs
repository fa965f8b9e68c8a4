//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Refresh loop and classification settings
    #[serde(default)]
    pub sync: RawSyncConfig,

    /// Alert delivery settings
    #[serde(default)]
    pub notifier: RawNotifierConfig,

    /// Instance directory, in display order
    #[serde(default)]
    pub instances: Vec<RawInstance>,
}

/// Synchronization settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSyncConfig {
    /// Seconds between scheduled refresh cycles (default: 3600)
    pub refresh_interval_seconds: Option<u64>,

    /// Licenses expiring within this many days are WARNING (default: 30)
    pub warning_threshold_days: Option<i64>,

    /// Timeout for each remote call (default: 30)
    pub request_timeout_seconds: Option<u64>,

    /// Run the first cycle at startup instead of after one interval (default: true)
    pub refresh_on_start: Option<bool>,
}

/// Notifier settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNotifierConfig {
    /// Emit alerts to the log (default: true)
    pub log_alerts: Option<bool>,

    /// Slack-style incoming webhook for alerts
    pub webhook_url: Option<String>,
}

/// Raw instance definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawInstance {
    /// Unique stable ID
    pub id: String,

    /// Base URL; `/license` is appended
    pub base_url: String,

    /// Free-form environment label
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "unknown".to_string()
}
