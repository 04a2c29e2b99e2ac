//! Persistence collaborators used while dispatching a message.
//!
//! A [`Database`] hands out one [`Session`] per inbound message. The session
//! covers user lookups, community config reads and writes, and custom command
//! lookups for that message, and is closed once dispatch completes.

mod local;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CommunityConfig, CommunityConfigError, CustomCommand, CustomConfig};
use crate::gateway::{Author, ChannelId, CommunityId, UserId};

pub use local::LocalDatabase;

/// Errors raised by persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Community config error: {0}")]
    CommunityConfig(#[from] CommunityConfigError),

    #[error("Session {0} is already closed")]
    SessionClosed(u64),
}

/// Stored state of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub is_blacklisted: bool,
    pub first_seen: DateTime<Utc>,
}

impl UserRecord {
    /// Creates the default record for a newly seen author.
    #[must_use]
    pub fn new(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name.clone(),
            is_blacklisted: false,
            first_seen: Utc::now(),
        }
    }
}

/// Source of persistence sessions.
#[async_trait]
pub trait Database: Send + Sync {
    async fn open_session(&self) -> Result<Arc<dyn Session>, StoreError>;
}

/// Persistence scope of a single dispatch.
#[async_trait]
pub trait Session: Send + Sync {
    /// Identifier for logging.
    fn id(&self) -> u64;

    /// Returns the author's record, creating a default one if absent.
    async fn user(&self, author: &Author) -> Result<UserRecord, StoreError>;

    /// Returns the community's config, creating a default one if absent.
    async fn community(&self, id: CommunityId) -> Result<CommunityConfig, StoreError>;

    /// Returns the community's prefix, assigning `default` first if unset.
    async fn community_prefix(&self, id: CommunityId, default: char) -> Result<char, StoreError>;

    async fn set_community_prefix(
        &self,
        id: CommunityId,
        prefix: char,
    ) -> Result<CommunityConfig, StoreError>;

    /// Returns how many channels were newly ignored.
    async fn add_ignored_channels(
        &self,
        id: CommunityId,
        channels: Vec<ChannelId>,
    ) -> Result<usize, StoreError>;

    /// Returns how many channels were un-ignored.
    async fn remove_ignored_channels(
        &self,
        id: CommunityId,
        channels: Vec<ChannelId>,
    ) -> Result<usize, StoreError>;

    /// Looks up a custom command by exact name.
    async fn custom_command(
        &self,
        id: CommunityId,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError>;

    /// Releases the session. Further calls fail with [`StoreError::SessionClosed`].
    async fn close(&self) -> Result<(), StoreError>;
}

/// Read access to per-community aliases and custom commands.
#[async_trait]
pub trait CustomConfigSource: Send + Sync {
    async fn custom_config(&self, id: CommunityId) -> Result<CustomConfig, StoreError>;
}
