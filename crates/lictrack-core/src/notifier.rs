//! Best-effort alerts for degraded licenses

use async_trait::async_trait;
use chrono::NaiveDate;
use lictrack_api::{DATE_FORMAT, LicenseRecord, LicenseStatus};
use lictrack_config::NotifierSettings;
use lictrack_util::InstanceId;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// A single alert about one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub instance_id: InstanceId,
    pub status: LicenseStatus,
    pub days_to_expiry: i64,
    pub expiry_date: NaiveDate,
    pub message: String,
}

/// The alert a record raises, or `None` if its license is OK
pub fn alert_for(record: &LicenseRecord) -> Option<Alert> {
    if !record.status.is_degraded() {
        return None;
    }

    let date = record.expiry_date.format(DATE_FORMAT);
    let message = match record.status {
        LicenseStatus::Expired => format!(
            "License EXPIRED: instance={} expired {}d ago ({})",
            record.instance_id,
            record.days_to_expiry.abs(),
            date
        ),
        _ => format!(
            "License WARNING: instance={} expires in {}d ({})",
            record.instance_id, record.days_to_expiry, date
        ),
    };

    Some(Alert {
        instance_id: record.instance_id.clone(),
        status: record.status,
        days_to_expiry: record.days_to_expiry,
        expiry_date: record.expiry_date,
        message,
    })
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {0}")]
    Status(u16),

    #[error("Alert sink unavailable: {0}")]
    Unavailable(String),
}

/// Somewhere alerts can be sent
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Emits alerts as warnings in the service log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        warn!(
            instance = %alert.instance_id,
            status = %alert.status,
            days_to_expiry = alert.days_to_expiry,
            "{}",
            alert.message
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    text: &'a str,
}

/// Posts `{"text": "<message>"}` to a chat-style incoming webhook
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookBody {
                text: &alert.message,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Fans alerts out to every configured sink.
///
/// Delivery failures are logged and swallowed; they never fail the
/// operation that produced the alert.
#[derive(Clone, Default)]
pub struct Notifier {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl Notifier {
    /// A notifier with no sinks
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the sinks described by the `[notifier]` config section
    pub fn from_settings(settings: &NotifierSettings, timeout: Duration) -> Result<Self, AlertError> {
        let mut notifier = Self::new();
        if settings.log_alerts {
            notifier = notifier.with_sink(Arc::new(LogSink));
        }
        if let Some(url) = &settings.webhook_url {
            notifier = notifier.with_sink(Arc::new(WebhookSink::new(url.clone(), timeout)?));
        }
        Ok(notifier)
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Send one alert per degraded record to every sink.
    ///
    /// Returns the number of alerts raised (OK records raise none).
    pub async fn notify(&self, records: &[LicenseRecord]) -> usize {
        let alerts: Vec<Alert> = records.iter().filter_map(alert_for).collect();

        for alert in &alerts {
            for sink in &self.sinks {
                match sink.deliver(alert).await {
                    Ok(()) => debug!(sink = sink.name(), instance = %alert.instance_id, "Alert delivered"),
                    Err(e) => warn!(
                        sink = sink.name(),
                        instance = %alert.instance_id,
                        error = %e,
                        "Alert delivery failed"
                    ),
                }
            }
        }

        alerts.len()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("Notifier").field("sinks", &names).finish()
    }
}
