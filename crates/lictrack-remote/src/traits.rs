//! License endpoint trait

use async_trait::async_trait;
use lictrack_api::{LicenseAgreement, RemoteLicense};
use lictrack_config::Instance;
use lictrack_util::Result;

/// Per-instance license resource surface.
///
/// Implementations bound every call with a timeout and never retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait LicenseEndpoint: Send + Sync {
    /// `GET <base>/license`
    ///
    /// Fails with `Unreachable`, `Malformed` or `NotFound`.
    async fn read_license(&self, instance: &Instance) -> Result<RemoteLicense>;

    /// `PUT <base>/license` with the base64-encoded license file.
    ///
    /// Returns the license as the remote parsed it. Fails with `Rejected`
    /// when the remote refuses the blob, in addition to the read failures.
    async fn write_license(&self, instance: &Instance, encoded: &str) -> Result<RemoteLicense>;

    /// `GET <base>/license/agreement`
    async fn read_agreement(&self, instance: &Instance) -> Result<LicenseAgreement>;

    /// `PUT <base>/license/agreement`
    async fn write_agreement(
        &self,
        instance: &Instance,
        agreement: &LicenseAgreement,
    ) -> Result<LicenseAgreement>;
}
