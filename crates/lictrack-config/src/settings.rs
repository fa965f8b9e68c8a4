//! Validated settings and the instance directory

use crate::schema::{RawConfig, RawInstance, RawNotifierConfig, RawSyncConfig};
use lictrack_util::InstanceId;
use std::time::Duration;

/// Default seconds between refresh cycles
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Default WARNING window in days
pub const DEFAULT_WARNING_THRESHOLD_DAYS: i64 = 30;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Validated configuration ready for use by the engine
#[derive(Debug, Clone)]
pub struct Settings {
    pub sync: SyncSettings,
    pub notifier: NotifierSettings,
    pub directory: InstanceDirectory,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            sync: SyncSettings::from_raw(raw.sync),
            notifier: NotifierSettings::from_raw(raw.notifier),
            directory: InstanceDirectory::new(raw.instances.into_iter().map(Instance::from_raw).collect()),
        }
    }
}

/// Refresh loop and classifier settings
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub refresh_interval: Duration,
    pub warning_threshold_days: i64,
    pub request_timeout: Duration,
    /// First cycle fires at startup (true) or after one interval (false)
    pub refresh_on_start: bool,
}

impl SyncSettings {
    fn from_raw(raw: RawSyncConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(
                raw.refresh_interval_seconds
                    .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
            ),
            warning_threshold_days: raw
                .warning_threshold_days
                .unwrap_or(DEFAULT_WARNING_THRESHOLD_DAYS),
            request_timeout: Duration::from_secs(
                raw.request_timeout_seconds
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            refresh_on_start: raw.refresh_on_start.unwrap_or(true),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_raw(RawSyncConfig::default())
    }
}

/// Alert delivery settings
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub log_alerts: bool,
    pub webhook_url: Option<String>,
}

impl NotifierSettings {
    fn from_raw(raw: RawNotifierConfig) -> Self {
        Self {
            log_alerts: raw.log_alerts.unwrap_or(true),
            webhook_url: raw.webhook_url,
        }
    }
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self::from_raw(RawNotifierConfig::default())
    }
}

/// One managed instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: InstanceId,
    /// Base URL without trailing slash
    pub base_url: String,
    pub environment: String,
}

impl Instance {
    pub fn new(
        id: impl Into<InstanceId>,
        base_url: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            id: id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            environment: environment.into(),
        }
    }

    fn from_raw(raw: RawInstance) -> Self {
        Self::new(raw.id, raw.base_url, raw.environment)
    }

    /// URL of the license resource
    pub fn license_url(&self) -> String {
        format!("{}/license", self.base_url)
    }

    /// URL of the license agreement resource
    pub fn agreement_url(&self) -> String {
        format!("{}/license/agreement", self.base_url)
    }
}

/// Static, ordered list of known instances
#[derive(Debug, Clone, Default)]
pub struct InstanceDirectory {
    instances: Vec<Instance>,
}

impl InstanceDirectory {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self { instances }
    }

    pub fn get(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances.iter().find(|i| &i.id == id)
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    /// Instance IDs in directory order
    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.iter().map(|i| i.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
