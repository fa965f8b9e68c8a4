//! License synchronization engine

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lictrack_api::{InstanceState, LicenseAgreement, LicenseRecord};
use lictrack_config::{Instance, InstanceDirectory};
use lictrack_remote::LicenseEndpoint;
use lictrack_util::{Clock, CycleId, InstanceId, LicenseError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{
    LicenseCache, Notifier, RefreshOutcome, RefreshReport, StatusClassifier, record_from_remote,
};

/// Keeps the license cache in step with the remote instances.
///
/// Shared behind an `Arc` by the scheduler and any manual callers. At most
/// one full refresh cycle runs at a time; single-instance refreshes and
/// applies are not serialized against it, and the cache keeps whichever
/// record was written last.
pub struct SyncEngine {
    directory: InstanceDirectory,
    endpoint: Arc<dyn LicenseEndpoint>,
    classifier: StatusClassifier,
    cache: LicenseCache,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    cycle_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        directory: InstanceDirectory,
        endpoint: Arc<dyn LicenseEndpoint>,
        classifier: StatusClassifier,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            instance_count = directory.len(),
            warning_threshold_days = classifier.warning_threshold_days(),
            "Sync engine initialized"
        );

        Self {
            cache: LicenseCache::new(&directory),
            directory,
            endpoint,
            classifier,
            notifier,
            clock,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &InstanceDirectory {
        &self.directory
    }

    pub fn classifier(&self) -> &StatusClassifier {
        &self.classifier
    }

    fn instance(&self, id: &InstanceId) -> Result<&Instance> {
        self.directory
            .get(id)
            .ok_or_else(|| LicenseError::not_found(id))
    }

    /// Fetch, translate and cache one instance without alerting
    async fn sync_instance(&self, instance: &Instance) -> Result<LicenseRecord> {
        let payload = self.endpoint.read_license(instance).await?;
        let record = record_from_remote(instance, payload, &self.classifier, self.clock.now())?;
        self.cache.put(record.clone()).await?;

        debug!(
            instance = %record.instance_id,
            status = %record.status,
            days_to_expiry = record.days_to_expiry,
            "License synced"
        );
        Ok(record)
    }

    /// Refresh a single instance and return its new record.
    ///
    /// On failure the cached record, if any, is left untouched.
    pub async fn refresh_one(&self, id: &InstanceId) -> Result<LicenseRecord> {
        let instance = self.instance(id)?;

        match self.sync_instance(instance).await {
            Ok(record) => {
                info!(instance = %id, status = %record.status, "License refreshed");
                self.notifier.notify(std::slice::from_ref(&record)).await;
                Ok(record)
            }
            Err(e) => {
                warn!(instance = %id, error = %e, "License refresh failed");
                Err(e)
            }
        }
    }

    /// Refresh every instance concurrently.
    ///
    /// Waits for any cycle already in flight, then runs a new one. One
    /// instance failing never stops the others; the report carries one
    /// outcome per instance in directory order.
    pub async fn refresh_all(self: &Arc<Self>) -> Result<RefreshReport> {
        let _cycle = self.cycle_lock.lock().await;
        self.run_cycle().await
    }

    /// Like [`refresh_all`](Self::refresh_all), but returns `None` instead
    /// of waiting when a cycle is already running.
    pub async fn try_refresh_all(self: &Arc<Self>) -> Option<Result<RefreshReport>> {
        let Ok(_cycle) = self.cycle_lock.try_lock() else {
            debug!("Refresh cycle already in flight");
            return None;
        };
        Some(self.run_cycle().await)
    }

    async fn run_cycle(self: &Arc<Self>) -> Result<RefreshReport> {
        if self.directory.is_empty() {
            return Err(LicenseError::EmptyDirectory);
        }

        let cycle_id = CycleId::new();
        let started_at = self.clock.now();
        let timer = Instant::now();
        debug!(cycle = %cycle_id, instances = self.directory.len(), "Refresh cycle starting");

        let ids = self.directory.ids();
        let mut tasks = JoinSet::new();
        for (index, id) in ids.iter().cloned().enumerate() {
            let engine = Arc::clone(self);
            tasks.spawn(async move {
                // Inner task so a panic is still attributed to its instance
                let sync = {
                    let id = id.clone();
                    tokio::spawn(async move {
                        match engine.directory.get(&id) {
                            Some(instance) => engine.sync_instance(instance).await,
                            None => Err(LicenseError::not_found(&id)),
                        }
                    })
                };
                let result = sync.await.unwrap_or_else(|e| {
                    error!(cycle = %cycle_id, instance = %id, error = %e, "Refresh task did not complete");
                    Err(LicenseError::internal(&id, format!("refresh task failed: {}", e)))
                });
                (index, result)
            });
        }

        // Slots are filled in completion order and read back in directory order
        let mut results: Vec<Option<Result<LicenseRecord>>> = ids.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => error!(cycle = %cycle_id, error = %e, "Refresh task failed to complete"),
            }
        }

        let outcomes: Vec<RefreshOutcome> = ids
            .into_iter()
            .zip(results)
            .map(|(instance_id, result)| {
                let result = result.unwrap_or_else(|| {
                    Err(LicenseError::internal(&instance_id, "refresh task did not complete"))
                });
                if let Err(e) = &result {
                    warn!(cycle = %cycle_id, instance = %instance_id, error = %e, "License refresh failed");
                }
                RefreshOutcome { instance_id, result }
            })
            .collect();

        let report = RefreshReport {
            cycle_id,
            started_at,
            elapsed: timer.elapsed(),
            outcomes,
        };

        let records: Vec<LicenseRecord> = report.records().cloned().collect();
        self.notifier.notify(&records).await;

        info!(cycle = %cycle_id, "Refresh cycle complete: {}", report.summary());
        Ok(report)
    }

    /// Upload a license file from disk to one instance.
    ///
    /// The file is read and base64-encoded locally; a read failure is
    /// reported as `LocalIo` before anything is sent.
    pub async fn apply_license(&self, id: &InstanceId, path: &Path) -> Result<LicenseRecord> {
        self.instance(id)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LicenseError::local_io(path, e))?;
        debug!(instance = %id, path = %path.display(), bytes = bytes.len(), "License file read");

        self.apply_blob(id, &bytes).await
    }

    /// Upload raw license bytes to one instance.
    ///
    /// On success the cache holds the remote's view of the new license. On
    /// any failure the cache is left as it was.
    pub async fn apply_blob(&self, id: &InstanceId, blob: &[u8]) -> Result<LicenseRecord> {
        let instance = self.instance(id)?;
        let encoded = STANDARD.encode(blob);

        let result = async {
            let payload = self.endpoint.write_license(instance, &encoded).await?;
            let record =
                record_from_remote(instance, payload, &self.classifier, self.clock.now())?;
            self.cache.put(record.clone()).await?;
            Ok::<_, LicenseError>(record)
        }
        .await;

        match result {
            Ok(record) => {
                info!(
                    instance = %id,
                    license_key_id = %record.license_key_id,
                    expiry_date = %record.expiry_date,
                    status = %record.status,
                    "License applied"
                );
                self.notifier.notify(std::slice::from_ref(&record)).await;
                Ok(record)
            }
            Err(e) => {
                warn!(instance = %id, error = %e, "License apply failed");
                Err(e)
            }
        }
    }

    /// Cached record for one instance; never contacts the remote
    pub async fn get_license(&self, id: &InstanceId) -> Result<LicenseRecord> {
        self.cache.get(id).await
    }

    /// All cached records in directory order; never contacts the remote
    pub async fn get_all_licenses(&self) -> Vec<LicenseRecord> {
        self.cache.get_all().await
    }

    /// Cached tier for an instance, `Unknown` until its first sync
    pub async fn instance_state(&self, id: &InstanceId) -> Result<InstanceState> {
        self.instance(id)?;
        Ok(self.cache.status_of(id).await)
    }

    /// Read the license agreement state straight from the instance
    pub async fn get_agreement(&self, id: &InstanceId) -> Result<LicenseAgreement> {
        let instance = self.instance(id)?;
        self.endpoint.read_agreement(instance).await
    }

    /// Write the license agreement state to the instance
    pub async fn set_agreement(
        &self,
        id: &InstanceId,
        agreement: &LicenseAgreement,
    ) -> Result<LicenseAgreement> {
        let instance = self.instance(id)?;
        let updated = self.endpoint.write_agreement(instance, agreement).await?;
        info!(instance = %id, accepted = updated.accepted, "License agreement updated");
        Ok(updated)
    }
}
