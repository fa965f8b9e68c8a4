//! reqwest-backed license endpoint client

use async_trait::async_trait;
use lictrack_api::{ApplyLicenseRequest, LicenseAgreement, RemoteLicense};
use lictrack_config::Instance;
use lictrack_util::{LicenseError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::LicenseEndpoint;

/// Whether a request mutates remote state; decides how 400s are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Error body shape used by license endpoints (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// HTTP client for instance license endpoints.
///
/// A single pooled `reqwest::Client` is shared by every request, so one
/// `HttpLicenseClient` can serve a whole refresh fan-out.
#[derive(Debug, Clone)]
pub struct HttpLicenseClient {
    client: Client,
    timeout: Duration,
}

impl HttpLicenseClient {
    /// Create a client whose every call is bounded by `timeout`
    pub fn new(timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client, timeout })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        instance: &Instance,
        request: RequestBuilder,
        access: Access,
    ) -> Result<T> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(instance, e))?;

        let status = response.status();
        debug!(instance = %instance.id, status = %status, "License endpoint responded");

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| self.transport_error(instance, e))?;
            return serde_json::from_slice(&body)
                .map_err(|e| LicenseError::malformed(&instance.id, e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.detail)
            .unwrap_or(text);

        Err(match status {
            StatusCode::NOT_FOUND => LicenseError::not_found(&instance.id),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
                if access == Access::Write =>
            {
                LicenseError::rejected(&instance.id, detail)
            }
            _ if detail.is_empty() => {
                LicenseError::unreachable(&instance.id, format!("HTTP {}", status.as_u16()))
            }
            _ => LicenseError::unreachable(
                &instance.id,
                format!("HTTP {}: {}", status.as_u16(), detail),
            ),
        })
    }

    fn transport_error(&self, instance: &Instance, err: reqwest::Error) -> LicenseError {
        if err.is_timeout() {
            LicenseError::unreachable(
                &instance.id,
                format!("request timed out after {}ms", self.timeout.as_millis()),
            )
        } else {
            LicenseError::unreachable(&instance.id, err.to_string())
        }
    }
}

#[async_trait]
impl LicenseEndpoint for HttpLicenseClient {
    async fn read_license(&self, instance: &Instance) -> Result<RemoteLicense> {
        let request = self.client.get(instance.license_url());
        self.execute(instance, request, Access::Read).await
    }

    async fn write_license(&self, instance: &Instance, encoded: &str) -> Result<RemoteLicense> {
        let body = ApplyLicenseRequest {
            value: encoded.to_string(),
        };
        let request = self.client.put(instance.license_url()).json(&body);
        self.execute(instance, request, Access::Write).await
    }

    async fn read_agreement(&self, instance: &Instance) -> Result<LicenseAgreement> {
        let request = self.client.get(instance.agreement_url());
        self.execute(instance, request, Access::Read).await
    }

    async fn write_agreement(
        &self,
        instance: &Instance,
        agreement: &LicenseAgreement,
    ) -> Result<LicenseAgreement> {
        let request = self.client.put(instance.agreement_url()).json(agreement);
        self.execute(instance, request, Access::Write).await
    }
}
