//! Lazily loaded, cached community configs with write-through saves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::{CommunityConfig, CommunityConfigError};
use crate::gateway::{ChannelId, CommunityId};

/// Holds at most one config record per community.
///
/// Records are loaded from disk on first reference (or created in memory if
/// never saved) and every mutation is written back before it returns. Each
/// record has its own lock, so saves for one community never wait on another.
#[derive(Debug)]
pub struct CommunityConfigStore {
    directory: PathBuf,
    records: RwLock<HashMap<CommunityId, Arc<Mutex<CommunityConfig>>>>,
}

impl CommunityConfigStore {
    /// Creates a store persisting records under `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Directory the records are saved to.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of records currently cached.
    pub async fn cached(&self) -> usize {
        self.records.read().await.len()
    }

    async fn record(
        &self,
        id: CommunityId,
    ) -> Result<Arc<Mutex<CommunityConfig>>, CommunityConfigError> {
        if let Some(record) = self.records.read().await.get(&id) {
            return Ok(Arc::clone(record));
        }

        // Load outside the map lock; if another task won the race, keep its record.
        let config = match CommunityConfig::load(&self.directory, id).await? {
            Some(config) => {
                info!(
                    "Loaded community configuration for {} from {}",
                    id,
                    CommunityConfig::path_for(&self.directory, id).display()
                );
                config
            }
            None => {
                debug!("No saved configuration for community {}, using defaults", id);
                CommunityConfig::new(id)
            }
        };

        let mut records = self.records.write().await;
        let record = records
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(config)));
        Ok(Arc::clone(record))
    }

    /// Returns a snapshot of the community's record, creating it if needed.
    pub async fn get_or_create(
        &self,
        id: CommunityId,
    ) -> Result<CommunityConfig, CommunityConfigError> {
        let record = self.record(id).await?;
        let config = record.lock().await;
        Ok(config.clone())
    }

    /// Returns the community's prefix, assigning `default` if none is set.
    ///
    /// The assignment is saved before it becomes visible. If the save fails
    /// the record keeps no prefix and the next call tries again.
    pub async fn prefix_or_init(
        &self,
        id: CommunityId,
        default: char,
    ) -> Result<char, CommunityConfigError> {
        let record = self.record(id).await?;
        let mut config = record.lock().await;

        if let Some(prefix) = config.prefix_char() {
            return Ok(prefix);
        }

        let mut updated = config.clone();
        updated.set_prefix(default);
        updated.save(&self.directory).await?;
        *config = updated;
        debug!("Assigned default prefix '{}' to community {}", default, id);
        Ok(default)
    }

    /// Applies `change` to a copy of the record, saves it, then commits it.
    ///
    /// A failed save leaves the cached record untouched. The record lock is
    /// held through the save so files are written in mutation order.
    pub async fn update<R>(
        &self,
        id: CommunityId,
        change: impl FnOnce(&mut CommunityConfig) -> R + Send,
    ) -> Result<(R, CommunityConfig), CommunityConfigError> {
        let record = self.record(id).await?;
        let mut config = record.lock().await;
        let mut updated = config.clone();
        let result = change(&mut updated);
        updated.save(&self.directory).await?;
        *config = updated;
        Ok((result, config.clone()))
    }

    /// Sets the community's command prefix.
    pub async fn set_prefix(
        &self,
        id: CommunityId,
        prefix: char,
    ) -> Result<CommunityConfig, CommunityConfigError> {
        let ((), config) = self.update(id, |c| c.set_prefix(prefix)).await?;
        Ok(config)
    }

    /// Adds channels to the ignored set. Returns how many were newly added.
    pub async fn add_ignored_channels(
        &self,
        id: CommunityId,
        channels: Vec<ChannelId>,
    ) -> Result<usize, CommunityConfigError> {
        let (added, _) = self
            .update(id, |c| c.add_ignored_channels(channels))
            .await?;
        Ok(added)
    }

    /// Removes channels from the ignored set. Returns how many were removed.
    pub async fn remove_ignored_channels(
        &self,
        id: CommunityId,
        channels: Vec<ChannelId>,
    ) -> Result<usize, CommunityConfigError> {
        let (removed, _) = self
            .update(id, |c| c.remove_ignored_channels(channels))
            .await?;
        Ok(removed)
    }
}
