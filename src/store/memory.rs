//! In-process store with optional JSON snapshot of targets.

use std::collections::{BTreeMap, VecDeque};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::monitor::types::{Observation, Target, TargetId};
use crate::store::{
    validate_new_target, validate_status, NewTarget, ObservationStore, StoreError, TargetStatus,
    TargetStore, ThresholdUpdate,
};

/// Thread-safe in-memory store.
///
/// Observations are kept in a bounded ring per target.
#[derive(Debug)]
pub struct MemoryStore {
    targets: RwLock<BTreeMap<TargetId, Target>>,
    next_id: AtomicI64,
    observations: DashMap<TargetId, VecDeque<Observation>>,
    retention: usize,
    snapshot_path: Option<PathBuf>,
    /// Held for the whole snapshot write so writers never interleave.
    snapshot_lock: Mutex<()>,
}

impl MemoryStore {
    /// Create an empty store without a snapshot file.
    pub fn new(retention: usize) -> Self {
        Self {
            targets: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            observations: DashMap::new(),
            retention: retention.max(1),
            snapshot_path: None,
            snapshot_lock: Mutex::new(()),
        }
    }

    /// Open a store backed by a targets snapshot, loading it if the file exists.
    pub fn load_from_file(path: impl AsRef<Path>, retention: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut store = Self::new(retention);
        store.snapshot_path = Some(path.to_path_buf());

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let targets: Vec<Target> = serde_json::from_reader(reader)?;

            let max_id = targets.iter().map(|t| t.id).max().unwrap_or(0);
            store.next_id.store(max_id + 1, Ordering::SeqCst);

            let map = store.targets.get_mut().unwrap_or_else(PoisonError::into_inner);
            for target in targets {
                map.insert(target.id, target);
            }
            tracing::info!(path = %path.display(), targets = map.len(), "Loaded target snapshot");
        }

        Ok(store)
    }

    /// Write registered targets to the snapshot file, if one is configured.
    ///
    /// The file is replaced atomically: a sibling `.tmp` file is written,
    /// synced and renamed over the snapshot.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let _guard = self.snapshot_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Read under the snapshot lock so a later write always sees newer targets.
        let targets: Vec<Target> = self.read_targets().values().cloned().collect();

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, &targets)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), targets = targets.len(), "Saved target snapshot");
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.save_to_file() {
            tracing::warn!(error = %e, "Failed to write target snapshot");
        }
    }

    fn read_targets(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<TargetId, Target>> {
        self.targets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_targets(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<TargetId, Target>> {
        self.targets.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TargetStore for MemoryStore {
    async fn list_targets(&self) -> Result<Vec<Target>, StoreError> {
        Ok(self.read_targets().values().cloned().collect())
    }

    async fn get_target(&self, id: TargetId) -> Result<Target, StoreError> {
        self.read_targets()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn upsert_target(&self, new: NewTarget) -> Result<Target, StoreError> {
        validate_new_target(&new)?;

        let target = {
            let mut targets = self.write_targets();
            match targets.values_mut().find(|t| t.url == new.url) {
                Some(existing) => {
                    existing.expected_status = new.expected_status;
                    existing.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    let target = Target {
                        id,
                        url: new.url,
                        expected_status: new.expected_status,
                        slow_threshold_ms: new.slow_threshold_ms,
                        created_at: Utc::now(),
                    };
                    targets.insert(id, target.clone());
                    target
                }
            }
        };

        self.persist();
        Ok(target)
    }

    async fn update_thresholds(&self, id: TargetId, update: ThresholdUpdate) -> Result<Target, StoreError> {
        if let Some(status) = update.expected_status {
            validate_status(status)?;
        }

        let target = {
            let mut targets = self.write_targets();
            let target = targets.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            if let Some(status) = update.expected_status {
                target.expected_status = status;
            }
            if let Some(slow) = update.slow_threshold_ms {
                target.slow_threshold_ms = slow;
            }
            target.clone()
        };

        self.persist();
        Ok(target)
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn insert_observation(&self, observation: Observation) -> Result<(), StoreError> {
        let mut ring = self.observations.entry(observation.target_id).or_default();
        ring.push_back(observation);
        while ring.len() > self.retention {
            ring.pop_front();
        }
        Ok(())
    }

    async fn recent_observations(&self, target_id: TargetId, limit: usize) -> Result<Vec<Observation>, StoreError> {
        Ok(self
            .observations
            .get(&target_id)
            .map(|ring| ring.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn latest_status(&self) -> Result<Vec<TargetStatus>, StoreError> {
        let targets: Vec<Target> = self.read_targets().values().cloned().collect();
        Ok(targets
            .into_iter()
            .filter_map(|target| {
                let observation = self.observations.get(&target.id)?.back().cloned()?;
                Some(TargetStatus { target, observation })
            })
            .collect())
    }
}
