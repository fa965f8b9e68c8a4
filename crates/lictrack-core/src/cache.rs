//! In-memory license state cache

use lictrack_api::{InstanceState, LicenseRecord};
use lictrack_config::InstanceDirectory;
use lictrack_util::{InstanceId, LicenseError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Latest known license snapshot per instance.
///
/// Entries are only ever replaced whole, so readers see either the previous
/// record or the new one. The key set is limited to the directory the cache
/// was built for, and `get_all` returns records in directory order.
#[derive(Debug)]
pub struct LicenseCache {
    order: Vec<InstanceId>,
    records: RwLock<HashMap<InstanceId, LicenseRecord>>,
}

impl LicenseCache {
    pub fn new(directory: &InstanceDirectory) -> Self {
        Self {
            order: directory.ids(),
            records: RwLock::new(HashMap::with_capacity(directory.len())),
        }
    }

    /// Cached record for one instance; `NotFound` if never synced
    pub async fn get(&self, id: &InstanceId) -> Result<LicenseRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LicenseError::not_found(id))
    }

    /// All cached records, in directory order
    pub async fn get_all(&self) -> Vec<LicenseRecord> {
        let records = self.records.read().await;
        self.order
            .iter()
            .filter_map(|id| records.get(id).cloned())
            .collect()
    }

    /// Replace the entry for `record.instance_id`.
    ///
    /// Records for instances outside the directory are refused.
    pub async fn put(&self, record: LicenseRecord) -> Result<()> {
        if !self.order.contains(&record.instance_id) {
            return Err(LicenseError::not_found(&record.instance_id));
        }

        self.records
            .write()
            .await
            .insert(record.instance_id.clone(), record);
        Ok(())
    }

    /// Cached tier for `id`, or `Unknown` if it has never synced
    pub async fn status_of(&self, id: &InstanceId) -> InstanceState {
        match self.records.read().await.get(id) {
            Some(record) => InstanceState::Known(record.status),
            None => InstanceState::Unknown,
        }
    }

    /// Number of instances with a cached record
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
