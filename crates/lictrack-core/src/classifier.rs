//! License status classification

use chrono::NaiveDate;
use lictrack_api::LicenseStatus;
use lictrack_util::days_between;

/// Result of classifying one expiry date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whole calendar days until expiry; negative once expired
    pub days_to_expiry: i64,
    pub status: LicenseStatus,
}

/// Maps an expiry date to a severity tier.
///
/// Rules, first match wins: `days <= 0` is EXPIRED, `days <= threshold` is
/// WARNING, anything else is OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusClassifier {
    warning_threshold_days: i64,
}

impl StatusClassifier {
    pub fn new(warning_threshold_days: i64) -> Self {
        Self {
            warning_threshold_days,
        }
    }

    pub fn warning_threshold_days(&self) -> i64 {
        self.warning_threshold_days
    }

    pub fn classify(&self, expiry: NaiveDate, as_of: NaiveDate) -> Classification {
        let days_to_expiry = days_between(as_of, expiry);

        let status = if days_to_expiry <= 0 {
            LicenseStatus::Expired
        } else if days_to_expiry <= self.warning_threshold_days {
            LicenseStatus::Warning
        } else {
            LicenseStatus::Ok
        };

        Classification {
            days_to_expiry,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reference_examples() {
        let classifier = StatusClassifier::new(30);
        let as_of = date(2024, 1, 1);

        let c = classifier.classify(date(2023, 12, 31), as_of);
        assert_eq!(c.status, LicenseStatus::Expired);
        assert_eq!(c.days_to_expiry, -1);

        let c = classifier.classify(date(2024, 1, 10), as_of);
        assert_eq!(c.status, LicenseStatus::Warning);
        assert_eq!(c.days_to_expiry, 9);

        let c = classifier.classify(date(2024, 6, 1), as_of);
        assert_eq!(c.status, LicenseStatus::Ok);
        assert_eq!(c.days_to_expiry, 152);
    }

    #[test]
    fn test_boundaries() {
        let classifier = StatusClassifier::new(30);
        let as_of = date(2024, 3, 1);

        // Expiring today counts as expired
        assert_eq!(classifier.classify(as_of, as_of).status, LicenseStatus::Expired);
        assert_eq!(
            classifier.classify(date(2024, 3, 2), as_of).status,
            LicenseStatus::Warning
        );
        assert_eq!(
            classifier.classify(date(2024, 3, 31), as_of).status,
            LicenseStatus::Warning
        );
        assert_eq!(
            classifier.classify(date(2024, 4, 1), as_of).status,
            LicenseStatus::Ok
        );
    }

    #[test]
    fn test_tier_rule_over_range() {
        let as_of = date(2024, 1, 1);
        for threshold in [1, 7, 30, 90] {
            let classifier = StatusClassifier::new(threshold);
            for offset in -120..=120 {
                let expiry = as_of + chrono::Duration::days(offset);
                let c = classifier.classify(expiry, as_of);

                assert_eq!(c.days_to_expiry, offset);
                let expected = if expiry <= as_of {
                    LicenseStatus::Expired
                } else if expiry <= as_of + chrono::Duration::days(threshold) {
                    LicenseStatus::Warning
                } else {
                    LicenseStatus::Ok
                };
                assert_eq!(c.status, expected, "threshold={} offset={}", threshold, offset);
            }
        }
    }

    #[test]
    fn test_threshold_is_configurable() {
        let as_of = date(2024, 1, 1);
        let expiry = date(2024, 1, 16); // 15 days out

        assert_eq!(
            StatusClassifier::new(30).classify(expiry, as_of).status,
            LicenseStatus::Warning
        );
        assert_eq!(
            StatusClassifier::new(14).classify(expiry, as_of).status,
            LicenseStatus::Ok
        );
    }
}
