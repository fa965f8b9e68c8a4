//! Translation from remote payloads to cached records

use chrono::{DateTime, Local};
use lictrack_api::{LicenseRecord, RemoteLicense};
use lictrack_config::Instance;
use lictrack_util::Result;

use crate::StatusClassifier;

/// Build the cache record for `instance` from what its endpoint returned.
///
/// Days and tier are computed as of `synced_at`, which becomes the record's
/// `last_synced_at`. Fails with `Malformed` if the expiry date can't be
/// parsed.
pub fn record_from_remote(
    instance: &Instance,
    payload: RemoteLicense,
    classifier: &StatusClassifier,
    synced_at: DateTime<Local>,
) -> Result<LicenseRecord> {
    let expiry_date = payload.parse_expiry(&instance.id)?;
    let classification = classifier.classify(expiry_date, synced_at.date_naive());

    Ok(LicenseRecord {
        instance_id: instance.id.clone(),
        environment: instance.environment.clone(),
        issued_to: payload.issued_to,
        product: payload.product,
        license_key_id: payload.license_key_id,
        expiry_date,
        days_to_expiry: classification.days_to_expiry,
        status: classification.status,
        last_synced_at: synced_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use lictrack_api::LicenseStatus;
    use lictrack_util::ErrorKind;

    fn payload(expiry: &str) -> RemoteLicense {
        RemoteLicense {
            issued_to: "Acme Corporation".into(),
            product: "PingFederate".into(),
            expiry_date: expiry.into(),
            license_key_id: "LIC-STAGE-GHI789".into(),
        }
    }

    #[test]
    fn maps_fields_and_derives_status() {
        let instance = Instance::new("pf3", "http://h/pf3", "staging");
        let synced_at = Local.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();

        let record = record_from_remote(
            &instance,
            payload("2024-01-16"),
            &StatusClassifier::new(30),
            synced_at,
        )
        .unwrap();

        assert_eq!(record.instance_id, instance.id);
        assert_eq!(record.environment, "staging");
        assert_eq!(record.issued_to, "Acme Corporation");
        assert_eq!(record.license_key_id, "LIC-STAGE-GHI789");
        assert_eq!(record.expiry_date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(record.days_to_expiry, 15);
        assert_eq!(record.status, LicenseStatus::Warning);
        assert_eq!(record.last_synced_at, synced_at);
    }

    #[test]
    fn unparseable_expiry_is_malformed() {
        let instance = Instance::new("pf1", "http://h/pf1", "prod");
        let err = record_from_remote(
            &instance,
            payload("16/01/2024"),
            &StatusClassifier::new(30),
            Local::now(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
