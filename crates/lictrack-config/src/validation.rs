//! Configuration validation

use crate::schema::{RawConfig, RawInstance};
use reqwest::Url;
use std::collections::HashSet;
use thiserror::Error;

/// Longest accepted `refresh_interval_seconds` (one year)
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted `request_timeout_seconds`
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 60 * 60;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Instance '{instance_id}': {message}")]
    InstanceError { instance_id: String, message: String },

    #[error("Duplicate instance ID: {0}")]
    DuplicateInstanceId(String),

    #[error("Invalid URL '{value}': {message}")]
    InvalidUrl { value: String, message: String },

    #[error("Setting '{setting}' must be greater than zero")]
    NotPositive { setting: &'static str },

    #[error("Setting '{setting}' must be at most {max}")]
    TooLarge { setting: &'static str, max: u64 },

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.instances.is_empty() {
        errors.push(ValidationError::GlobalError(
            "at least one [[instances]] entry is required".into(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for instance in &config.instances {
        if !seen_ids.insert(&instance.id) {
            errors.push(ValidationError::DuplicateInstanceId(instance.id.clone()));
        }
    }

    for instance in &config.instances {
        errors.extend(validate_instance(instance));
    }

    let sync = &config.sync;
    if sync.refresh_interval_seconds == Some(0) {
        errors.push(ValidationError::NotPositive {
            setting: "sync.refresh_interval_seconds",
        });
    }
    if matches!(sync.refresh_interval_seconds, Some(secs) if secs > MAX_REFRESH_INTERVAL_SECS) {
        errors.push(ValidationError::TooLarge {
            setting: "sync.refresh_interval_seconds",
            max: MAX_REFRESH_INTERVAL_SECS,
        });
    }
    if sync.request_timeout_seconds == Some(0) {
        errors.push(ValidationError::NotPositive {
            setting: "sync.request_timeout_seconds",
        });
    }
    if matches!(sync.request_timeout_seconds, Some(secs) if secs > MAX_REQUEST_TIMEOUT_SECS) {
        errors.push(ValidationError::TooLarge {
            setting: "sync.request_timeout_seconds",
            max: MAX_REQUEST_TIMEOUT_SECS,
        });
    }
    if matches!(sync.warning_threshold_days, Some(days) if days <= 0) {
        errors.push(ValidationError::NotPositive {
            setting: "sync.warning_threshold_days",
        });
    }

    if let Some(url) = &config.notifier.webhook_url
        && let Err(message) = check_http_url(url)
    {
        errors.push(ValidationError::InvalidUrl {
            value: url.clone(),
            message,
        });
    }

    errors
}

fn validate_instance(instance: &RawInstance) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if instance.id.trim().is_empty() {
        errors.push(ValidationError::InstanceError {
            instance_id: instance.id.clone(),
            message: "id cannot be empty".into(),
        });
    } else if instance.id.contains(char::is_whitespace) {
        errors.push(ValidationError::InstanceError {
            instance_id: instance.id.clone(),
            message: "id cannot contain whitespace".into(),
        });
    }

    if let Err(message) = check_http_url(&instance.base_url) {
        errors.push(ValidationError::InstanceError {
            instance_id: instance.id.clone(),
            message: format!("base_url '{}': {}", instance.base_url, message),
        });
    }

    errors
}

/// The URL must parse and use http(s) with a host
pub fn check_http_url(url: &str) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|e| e.to_string())?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}', expected http or https", parsed.scheme()));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err("missing host".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawNotifierConfig, RawSyncConfig};

    fn instance(id: &str, base_url: &str) -> RawInstance {
        RawInstance {
            id: id.into(),
            base_url: base_url.into(),
            environment: "prod".into(),
        }
    }

    fn config(instances: Vec<RawInstance>) -> RawConfig {
        RawConfig {
            config_version: 1,
            sync: RawSyncConfig::default(),
            notifier: RawNotifierConfig::default(),
            instances,
        }
    }

    #[test]
    fn test_check_http_url() {
        assert!(check_http_url("http://localhost:8080/pf1").is_ok());
        assert!(check_http_url("https://pf.example.com").is_ok());

        assert!(check_http_url("localhost:8080").is_err());
        assert!(check_http_url("ftp://pf.example.com").is_err());
        assert!(check_http_url("http://").is_err());
    }

    #[test]
    fn test_unparseable_urls_rejected() {
        assert!(check_http_url("http://pf host/pf1").is_err());
        assert!(check_http_url("http://[::1/pf1").is_err());
        assert!(check_http_url("https://pf1.example.com:99999").is_err());
        assert!(check_http_url("http://[::1]:8080/pf1").is_ok());

        let errors = validate_config(&config(vec![instance("pf1", "http://pf host/pf1")]));
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::InstanceError { instance_id, .. } if instance_id == "pf1"));
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let mut config = config(vec![instance("pf1", "http://localhost:8080/pf1")]);
        config.sync.refresh_interval_seconds = Some(9_223_372_036_854_775_807);
        config.sync.request_timeout_seconds = Some(MAX_REQUEST_TIMEOUT_SECS + 1);

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::TooLarge { setting: "sync.refresh_interval_seconds", .. }
        )));

        config.sync.refresh_interval_seconds = Some(MAX_REFRESH_INTERVAL_SECS);
        config.sync.request_timeout_seconds = Some(MAX_REQUEST_TIMEOUT_SECS);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_duplicate_id_detection() {
        let config = config(vec![
            instance("pf1", "http://localhost:8080/pf1"),
            instance("pf1", "http://localhost:8080/pf2"),
        ]);

        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateInstanceId(id) if id == "pf1")));
    }

    #[test]
    fn test_empty_directory_rejected() {
        let errors = validate_config(&config(vec![]));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::GlobalError(_))));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = config(vec![instance("", "not-a-url")]);
        config.sync.refresh_interval_seconds = Some(0);
        config.sync.warning_threshold_days = Some(-3);
        config.notifier.webhook_url = Some("hooks.example.com".into());

        let errors = validate_config(&config);
        // empty id, bad base_url, interval, threshold, webhook
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_valid_config_has_no_errors() {
        let config = config(vec![
            instance("pf1", "http://localhost:8080/pf1"),
            instance("pf2", "http://localhost:8080/pf2"),
        ]);
        assert!(validate_config(&config).is_empty());
    }
}
