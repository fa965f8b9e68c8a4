//! In-memory license endpoint for testing
//!
//! `MockEndpoint` keeps per-instance license and agreement state and parses
//! applied license files the way real endpoints do, so engine tests can
//! exercise apply semantics without a network.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use lictrack_api::{DATE_FORMAT, LicenseAgreement, RemoteLicense};
use lictrack_config::Instance;
use lictrack_util::{Clock, InstanceId, LicenseError, Result, SystemClock};
use rand::Rng;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;

/// Days added to "today" when a license file carries no expiry marker
pub const DEFAULT_LICENSE_TERM_DAYS: i64 = 365;

static EXPIRY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"EXPIRY=(\d{4}-\d{2}-\d{2})").expect("valid regex"));
static EXPIRATION_DATE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ExpirationDate=(\d{4}-\d{2}-\d{2})").expect("valid regex"));
static ORGANIZATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Organization=(.+)").expect("valid regex"));
static ID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ID=(\w+)").expect("valid regex"));

const GENERATED_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Parse a base64-encoded license file against the instance's current license.
///
/// Recognized markers: `EXPIRY=YYYY-MM-DD` (or `ExpirationDate=`),
/// `Organization=<rest of line>` and `ID=<word>`. Without an expiry marker the
/// license runs [`DEFAULT_LICENSE_TERM_DAYS`] from `today`; without an
/// organization the current one is kept; without an ID a random one is
/// generated. Errors are the remote's rejection message.
pub fn parse_license_blob(
    encoded: &str,
    current: &RemoteLicense,
    today: NaiveDate,
) -> std::result::Result<RemoteLicense, String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("Invalid license file: {}", e))?;
    let content =
        String::from_utf8(bytes).map_err(|e| format!("Invalid license file: {}", e))?;

    let expiry = match EXPIRY_MARKER
        .captures(&content)
        .or_else(|| EXPIRATION_DATE_MARKER.captures(&content))
    {
        Some(caps) => {
            let raw = &caps[1];
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|e| format!("Invalid license file: expiry '{}': {}", raw, e))?
        }
        None => today + chrono::Duration::days(DEFAULT_LICENSE_TERM_DAYS),
    };

    let issued_to = ORGANIZATION_MARKER
        .captures(&content)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| current.issued_to.clone());

    let key_suffix = ID_MARKER
        .captures(&content)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(generate_license_id);

    Ok(RemoteLicense {
        issued_to,
        product: current.product.clone(),
        expiry_date: expiry.format(DATE_FORMAT).to_string(),
        license_key_id: format!("LIC-{}", key_suffix),
    })
}

fn generate_license_id() -> String {
    let mut rng = rand::rng();
    (0..8)
        .map(|_| GENERATED_ID_CHARSET[rng.random_range(0..GENERATED_ID_CHARSET.len())] as char)
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock license endpoint for unit/integration testing
pub struct MockEndpoint {
    clock: Arc<dyn Clock>,
    licenses: Mutex<HashMap<InstanceId, RemoteLicense>>,
    agreements: Mutex<HashMap<InstanceId, LicenseAgreement>>,

    /// Instances whose calls fail with `Unreachable`
    unreachable: Mutex<HashSet<InstanceId>>,
    /// Instances whose license reads return an unparseable expiry
    malformed: Mutex<HashSet<InstanceId>>,
    /// Artificial delay applied to every call
    latency: Mutex<Duration>,

    reads: Mutex<HashMap<InstanceId, usize>>,
    writes: Mutex<HashMap<InstanceId, usize>>,
    reads_in_flight: Mutex<HashMap<InstanceId, usize>>,
    max_concurrent_reads: AtomicUsize,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` for the default expiry of marker-less license files
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            licenses: Mutex::new(HashMap::new()),
            agreements: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(HashSet::new()),
            malformed: Mutex::new(HashSet::new()),
            latency: Mutex::new(Duration::ZERO),
            reads: Mutex::new(HashMap::new()),
            writes: Mutex::new(HashMap::new()),
            reads_in_flight: Mutex::new(HashMap::new()),
            max_concurrent_reads: AtomicUsize::new(0),
        }
    }

    /// Register (or replace) an instance's license
    pub fn set_license(&self, id: impl Into<InstanceId>, license: RemoteLicense) {
        let id = id.into();
        lock(&self.agreements).entry(id.clone()).or_default();
        lock(&self.licenses).insert(id, license);
    }

    pub fn license(&self, id: &InstanceId) -> Option<RemoteLicense> {
        lock(&self.licenses).get(id).cloned()
    }

    pub fn set_unreachable(&self, id: impl Into<InstanceId>, unreachable: bool) {
        let id = id.into();
        let mut set = lock(&self.unreachable);
        if unreachable {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    pub fn set_malformed(&self, id: impl Into<InstanceId>, malformed: bool) {
        let id = id.into();
        let mut set = lock(&self.malformed);
        if malformed {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    pub fn read_count(&self, id: &InstanceId) -> usize {
        lock(&self.reads).get(id).copied().unwrap_or(0)
    }

    pub fn write_count(&self, id: &InstanceId) -> usize {
        lock(&self.writes).get(id).copied().unwrap_or(0)
    }

    /// Highest number of simultaneous reads of any single instance
    pub fn max_concurrent_reads(&self) -> usize {
        self.max_concurrent_reads.load(Ordering::SeqCst)
    }

    async fn simulate_call(&self, id: &InstanceId) -> Result<()> {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if lock(&self.unreachable).contains(id) {
            return Err(LicenseError::unreachable(id, "connection refused"));
        }
        Ok(())
    }

    fn enter_read(&self, id: &InstanceId) {
        *lock(&self.reads).entry(id.clone()).or_insert(0) += 1;

        let mut in_flight = lock(&self.reads_in_flight);
        let count = in_flight.entry(id.clone()).or_insert(0);
        *count += 1;
        self.max_concurrent_reads.fetch_max(*count, Ordering::SeqCst);
    }

    fn exit_read(&self, id: &InstanceId) {
        if let Some(count) = lock(&self.reads_in_flight).get_mut(id) {
            *count = count.saturating_sub(1);
        }
    }
}

impl Default for MockEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl crate::LicenseEndpoint for MockEndpoint {
    async fn read_license(&self, instance: &Instance) -> Result<RemoteLicense> {
        let id = &instance.id;
        self.enter_read(id);
        let result = self.simulate_call(id).await;
        self.exit_read(id);
        result?;

        let mut license = self
            .license(id)
            .ok_or_else(|| LicenseError::not_found(id))?;

        if lock(&self.malformed).contains(id) {
            license.expiry_date = "not-a-date".into();
        }
        Ok(license)
    }

    async fn write_license(&self, instance: &Instance, encoded: &str) -> Result<RemoteLicense> {
        let id = &instance.id;
        *lock(&self.writes).entry(id.clone()).or_insert(0) += 1;
        self.simulate_call(id).await?;

        let mut licenses = lock(&self.licenses);
        let current = licenses.get(id).ok_or_else(|| LicenseError::not_found(id))?;

        let updated = parse_license_blob(encoded, current, self.clock.today())
            .map_err(|message| LicenseError::rejected(id, message))?;
        licenses.insert(id.clone(), updated.clone());
        Ok(updated)
    }

    async fn read_agreement(&self, instance: &Instance) -> Result<LicenseAgreement> {
        let id = &instance.id;
        self.simulate_call(id).await?;
        lock(&self.agreements)
            .get(id)
            .cloned()
            .ok_or_else(|| LicenseError::not_found(id))
    }

    async fn write_agreement(
        &self,
        instance: &Instance,
        agreement: &LicenseAgreement,
    ) -> Result<LicenseAgreement> {
        let id = &instance.id;
        self.simulate_call(id).await?;
        let mut agreements = lock(&self.agreements);
        let slot = agreements
            .get_mut(id)
            .ok_or_else(|| LicenseError::not_found(id))?;
        *slot = agreement.clone();
        Ok(agreement.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LicenseEndpoint;
    use chrono::{Local, TimeZone};
    use lictrack_util::{ErrorKind, FixedClock};

    fn current() -> RemoteLicense {
        RemoteLicense {
            issued_to: "Acme Corporation".into(),
            product: "PingFederate".into(),
            expiry_date: "2024-01-16".into(),
            license_key_id: "LIC-STAGE-GHI789".into(),
        }
    }

    fn encode(content: &str) -> String {
        STANDARD.encode(content)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn blob_with_all_markers() {
        let blob = encode("ID=NEWKEY1\nOrganization=  Globex Inc  \nEXPIRY=2025-01-01\n");
        let parsed = parse_license_blob(&blob, &current(), today()).unwrap();

        assert_eq!(parsed.expiry_date, "2025-01-01");
        assert_eq!(parsed.issued_to, "Globex Inc");
        assert_eq!(parsed.license_key_id, "LIC-NEWKEY1");
        assert_eq!(parsed.product, "PingFederate");
    }

    #[test]
    fn expiration_date_marker_is_fallback() {
        let blob = encode("ExpirationDate=2026-03-31");
        let parsed = parse_license_blob(&blob, &current(), today()).unwrap();
        assert_eq!(parsed.expiry_date, "2026-03-31");

        // EXPIRY wins when both are present
        let blob = encode("ExpirationDate=2026-03-31\nEXPIRY=2025-06-30");
        let parsed = parse_license_blob(&blob, &current(), today()).unwrap();
        assert_eq!(parsed.expiry_date, "2025-06-30");
    }

    #[test]
    fn blob_without_markers_uses_defaults() {
        let blob = encode("some opaque license body");
        let parsed = parse_license_blob(&blob, &current(), today()).unwrap();

        assert_eq!(parsed.expiry_date, "2024-12-31");
        assert_eq!(parsed.issued_to, "Acme Corporation");
        assert!(parsed.license_key_id.starts_with("LIC-"));
        assert_eq!(parsed.license_key_id.len(), "LIC-".len() + 8);
    }

    #[test]
    fn invalid_blobs_are_rejected() {
        assert!(parse_license_blob("%%% not base64", &current(), today()).is_err());
        assert!(parse_license_blob(&STANDARD.encode([0xff, 0xfe]), &current(), today()).is_err());
        assert!(parse_license_blob(&encode("EXPIRY=2025-13-40"), &current(), today()).is_err());
    }

    #[tokio::test]
    async fn write_updates_state_and_failed_write_does_not() {
        let clock = Arc::new(FixedClock::new(Local.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
        let mock = MockEndpoint::with_clock(clock);
        mock.set_license("pf3", current());
        let pf3 = Instance::new("pf3", "http://mock/pf3", "staging");

        let err = mock.write_license(&pf3, "%%%").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(mock.license(&pf3.id), Some(current()));

        let updated = mock
            .write_license(&pf3, &encode("EXPIRY=2025-01-01"))
            .await
            .unwrap();
        assert_eq!(mock.read_license(&pf3).await.unwrap(), updated);
        assert_eq!(mock.write_count(&pf3.id), 2);
        assert_eq!(mock.read_count(&pf3.id), 1);
    }

    #[tokio::test]
    async fn failure_injection() {
        let mock = MockEndpoint::new();
        mock.set_license("pf1", current());
        let pf1 = Instance::new("pf1", "http://mock/pf1", "prod");
        let pf9 = Instance::new("pf9", "http://mock/pf9", "prod");

        assert_eq!(mock.read_license(&pf9).await.unwrap_err().kind(), ErrorKind::NotFound);

        mock.set_unreachable("pf1", true);
        assert_eq!(mock.read_license(&pf1).await.unwrap_err().kind(), ErrorKind::Unreachable);
        mock.set_unreachable("pf1", false);

        mock.set_malformed("pf1", true);
        let garbled = mock.read_license(&pf1).await.unwrap();
        assert!(garbled.parse_expiry(&pf1.id).is_err());
    }

    #[tokio::test]
    async fn agreement_round_trip() {
        let mock = MockEndpoint::new();
        mock.set_license("pf1", current());
        let pf1 = Instance::new("pf1", "http://mock/pf1", "prod");

        assert!(!mock.read_agreement(&pf1).await.unwrap().accepted);
        let accepted = LicenseAgreement {
            accepted: true,
            license_agreement_url: None,
        };
        mock.write_agreement(&pf1, &accepted).await.unwrap();
        assert!(mock.read_agreement(&pf1).await.unwrap().accepted);
    }
}
