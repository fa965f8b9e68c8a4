//! License records and status tiers

use chrono::{DateTime, Local, NaiveDate};
use lictrack_util::InstanceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier of a license's remaining validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
    Ok,
    Warning,
    Expired,
}

impl LicenseStatus {
    /// Whether this tier should raise an alert
    pub fn is_degraded(&self) -> bool {
        !matches!(self, LicenseStatus::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Ok => "OK",
            LicenseStatus::Warning => "WARNING",
            LicenseStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached license snapshot for one instance.
///
/// `days_to_expiry` and `status` were derived from `expiry_date` as of
/// `last_synced_at`; they are not recomputed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub instance_id: InstanceId,
    pub environment: String,
    pub issued_to: String,
    pub product: String,
    pub license_key_id: String,
    pub expiry_date: NaiveDate,
    pub days_to_expiry: i64,
    pub status: LicenseStatus,
    pub last_synced_at: DateTime<Local>,
}

impl LicenseRecord {
    /// Compare everything except the sync timestamp
    pub fn same_license(&self, other: &LicenseRecord) -> bool {
        self.instance_id == other.instance_id
            && self.environment == other.environment
            && self.issued_to == other.issued_to
            && self.product == other.product
            && self.license_key_id == other.license_key_id
            && self.expiry_date == other.expiry_date
            && self.days_to_expiry == other.days_to_expiry
            && self.status == other.status
    }
}

/// Per-instance synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum InstanceState {
    /// Never successfully synchronized
    Unknown,
    /// Last successful synchronization yielded this tier
    Known(LicenseStatus),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> LicenseRecord {
        LicenseRecord {
            instance_id: InstanceId::new("pf1"),
            environment: "prod".into(),
            issued_to: "Acme Corporation".into(),
            product: "PingFederate".into(),
            license_key_id: "LIC-PROD-ABC123".into(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            days_to_expiry: 45,
            status: LicenseStatus::Ok,
            last_synced_at: Local.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LicenseStatus::Warning).unwrap(), "\"WARNING\"");
        let parsed: LicenseStatus = serde_json::from_str("\"EXPIRED\"").unwrap();
        assert_eq!(parsed, LicenseStatus::Expired);
        assert_eq!(LicenseStatus::Ok.to_string(), "OK");
    }

    #[test]
    fn degraded_tiers() {
        assert!(!LicenseStatus::Ok.is_degraded());
        assert!(LicenseStatus::Warning.is_degraded());
        assert!(LicenseStatus::Expired.is_degraded());
    }

    #[test]
    fn same_license_ignores_sync_time() {
        let a = record();
        let mut b = record();
        b.last_synced_at = Local.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(a.same_license(&b));
        assert_ne!(a, b);

        b.license_key_id = "LIC-OTHER".into();
        assert!(!a.same_license(&b));
    }

    #[test]
    fn instance_state_serialization() {
        let json = serde_json::to_string(&InstanceState::Known(LicenseStatus::Warning)).unwrap();
        assert!(json.contains("known"));
        assert!(json.contains("WARNING"));
    }
}
