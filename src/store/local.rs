//! Local persistence: file-backed community configs, in-memory users.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{CustomConfigSource, Database, Session, StoreError, UserRecord};
use crate::config::{
    CommunityConfig, CommunityConfigStore, CustomCommand, CustomConfig, CustomConfigFile,
};
use crate::gateway::{Author, ChannelId, CommunityId, UserId};

#[derive(Debug)]
struct Inner {
    communities: CommunityConfigStore,
    users: RwLock<HashMap<UserId, UserRecord>>,
    blacklist: HashSet<UserId>,
    custom: RwLock<CustomConfigFile>,
    next_session: AtomicU64,
    open_sessions: AtomicUsize,
}

/// Database for running the bot on a single machine.
#[derive(Debug, Clone)]
pub struct LocalDatabase {
    inner: Arc<Inner>,
}

impl LocalDatabase {
    /// Creates a database over the given stores.
    #[must_use]
    pub fn new(
        communities: CommunityConfigStore,
        custom: CustomConfigFile,
        blacklist: impl IntoIterator<Item = UserId>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                communities,
                users: RwLock::new(HashMap::new()),
                blacklist: blacklist.into_iter().collect(),
                custom: RwLock::new(custom),
                next_session: AtomicU64::new(1),
                open_sessions: AtomicUsize::new(0),
            }),
        }
    }

    /// The underlying community config store.
    #[must_use]
    pub fn communities(&self) -> &CommunityConfigStore {
        &self.inner.communities
    }

    /// Number of sessions opened and not yet released.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }

    /// Replaces the aliases and custom commands of one community.
    pub async fn set_custom_config(&self, id: CommunityId, config: CustomConfig) {
        self.inner.custom.write().await.insert(id, config);
    }
}

#[async_trait]
impl Database for LocalDatabase {
    async fn open_session(&self) -> Result<Arc<dyn Session>, StoreError> {
        let id = self.inner.next_session.fetch_add(1, Ordering::Relaxed);
        self.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        debug!("Opened session {}", id);
        Ok(Arc::new(LocalSession {
            inner: Arc::clone(&self.inner),
            id,
            closed: AtomicBool::new(false),
        }))
    }
}

#[async_trait]
impl CustomConfigSource for LocalDatabase {
    async fn custom_config(&self, id: CommunityId) -> Result<CustomConfig, StoreError> {
        Ok(self.inner.custom.read().await.get(id).cloned().unwrap_or_default())
    }
}

#[derive(Debug)]
struct LocalSession {
    inner: Arc<Inner>,
    id: u64,
    closed: AtomicBool,
}

impl LocalSession {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::SessionClosed(self.id));
        }
        Ok(())
    }

    /// Marks the session released. Returns false if it already was.
    fn release(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.open_sessions.fetch_sub(1, Ordering::SeqCst);
        true
    }
}

impl Drop for LocalSession {
    fn drop(&mut self) {
        if self.release() {
            warn!("Session {} dropped without being closed", self.id);
        }
    }
}

#[async_trait]
impl Session for LocalSession {
    fn id(&self) -> u64 {
        self.id
    }

    async fn user(&self, author: &Author) -> Result<UserRecord, StoreError> {
        self.ensure_open()?;
        if let Some(record) = self.inner.users.read().await.get(&author.id) {
            return Ok(record.clone());
        }

        let is_blacklisted = self.inner.blacklist.contains(&author.id);
        let mut users = self.inner.users.write().await;
        let record = users.entry(author.id).or_insert_with(|| {
            debug!("Creating user record for {} ({})", author.name, author.id);
            UserRecord {
                is_blacklisted,
                ..UserRecord::new(author)
            }
        });
        Ok(record.clone())
    }

    async fn community(&self, id: CommunityId) -> Result<CommunityConfig, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.communities.get_or_create(id).await?)
    }

    async fn community_prefix(&self, id: CommunityId, default: char) -> Result<char, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.communities.prefix_or_init(id, default).await?)
    }

    async fn set_community_prefix(
        &self,
        id: CommunityId,
        prefix: char,
    ) -> Result<CommunityConfig, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.communities.set_prefix(id, prefix).await?)
    }

    async fn add_ignored_channels(
        &self,
        id: CommunityId,
        channels: Vec<ChannelId>,
    ) -> Result<usize, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.communities.add_ignored_channels(id, channels).await?)
    }

    async fn remove_ignored_channels(
        &self,
        id: CommunityId,
        channels: Vec<ChannelId>,
    ) -> Result<usize, StoreError> {
        self.ensure_open()?;
        Ok(self
            .inner
            .communities
            .remove_ignored_channels(id, channels)
            .await?)
    }

    async fn custom_command(
        &self,
        id: CommunityId,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.custom.read().await.command(id, name).cloned())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if !self.release() {
            return Err(StoreError::SessionClosed(self.id));
        }
        debug!("Closed session {}", self.id);
        Ok(())
    }
}
