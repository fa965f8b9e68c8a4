//! Results of a refresh cycle

use chrono::{DateTime, Local};
use lictrack_api::{LicenseRecord, LicenseStatus};
use lictrack_util::{CycleId, InstanceId, LicenseError, format_duration};
use std::time::Duration;

/// What happened to one instance during a cycle
#[derive(Debug)]
pub struct RefreshOutcome {
    pub instance_id: InstanceId,
    pub result: Result<LicenseRecord, LicenseError>,
}

impl RefreshOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn record(&self) -> Option<&LicenseRecord> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&LicenseError> {
        self.result.as_ref().err()
    }
}

/// Per-instance outcomes of a full refresh, in directory order
#[derive(Debug)]
pub struct RefreshReport {
    pub cycle_id: CycleId,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub outcomes: Vec<RefreshOutcome>,
}

impl RefreshReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Records from the instances that refreshed successfully
    pub fn records(&self) -> impl Iterator<Item = &LicenseRecord> {
        self.outcomes.iter().filter_map(RefreshOutcome::record)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&InstanceId, &LicenseError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error().map(|e| (&o.instance_id, e)))
    }

    pub fn count_with_status(&self, status: LicenseStatus) -> usize {
        self.records().filter(|r| r.status == status).count()
    }

    /// One-line summary suitable for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "{} instances: {} refreshed, {} failed ({} warning, {} expired) in {}",
            self.len(),
            self.succeeded(),
            self.failed(),
            self.count_with_status(LicenseStatus::Warning),
            self.count_with_status(LicenseStatus::Expired),
            format_duration(self.elapsed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lictrack_util::ErrorKind;

    fn ok(id: &str, status: LicenseStatus) -> RefreshOutcome {
        RefreshOutcome {
            instance_id: InstanceId::new(id),
            result: Ok(LicenseRecord {
                instance_id: InstanceId::new(id),
                environment: "prod".into(),
                issued_to: "Acme Corporation".into(),
                product: "PingFederate".into(),
                license_key_id: "LIC-1".into(),
                expiry_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                days_to_expiry: 10,
                status,
                last_synced_at: Local::now(),
            }),
        }
    }

    fn failed(id: &str) -> RefreshOutcome {
        let instance_id = InstanceId::new(id);
        RefreshOutcome {
            result: Err(LicenseError::unreachable(&instance_id, "connection refused")),
            instance_id,
        }
    }

    #[test]
    fn test_counts_and_summary() {
        let report = RefreshReport {
            cycle_id: CycleId::new(),
            started_at: Local::now(),
            elapsed: Duration::from_millis(250),
            outcomes: vec![
                ok("pf1", LicenseStatus::Ok),
                failed("pf2"),
                ok("pf3", LicenseStatus::Warning),
                ok("pf4", LicenseStatus::Expired),
            ],
        };

        assert_eq!(report.len(), 4);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.records().count(), 3);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.as_str(), "pf2");
        assert_eq!(failures[0].1.kind(), ErrorKind::Unreachable);

        assert_eq!(
            report.summary(),
            "4 instances: 3 refreshed, 1 failed (1 warning, 1 expired) in 250ms"
        );
    }
}
