//! Payloads exchanged with remote license endpoints

use chrono::NaiveDate;
use lictrack_util::{InstanceId, LicenseError};
use serde::{Deserialize, Serialize};

use crate::DATE_FORMAT;

/// License resource as returned by `GET|PUT <base>/license`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLicense {
    pub issued_to: String,
    pub product: String,
    /// `YYYY-MM-DD`
    pub expiry_date: String,
    pub license_key_id: String,
}

impl RemoteLicense {
    /// Parse the expiry date, attributing failures to `instance`
    pub fn parse_expiry(&self, instance: &InstanceId) -> Result<NaiveDate, LicenseError> {
        NaiveDate::parse_from_str(self.expiry_date.trim(), DATE_FORMAT).map_err(|e| {
            LicenseError::malformed(
                instance,
                format!("invalid expiryDate '{}': {}", self.expiry_date, e),
            )
        })
    }
}

/// Body of `PUT <base>/license`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyLicenseRequest {
    /// Base64-encoded license file
    pub value: String,
}

/// License agreement resource (`<base>/license/agreement`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseAgreement {
    #[serde(default)]
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_agreement_url: Option<String>,
}
