//! Per-community configuration records.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ConfigError;
use crate::gateway::{ChannelId, CommunityId};

/// File name suffix of a persisted community config.
pub const CONFIG_FILE_SUFFIX: &str = ".config.json";

/// Errors that can occur while loading or saving a community config.
#[derive(Debug, Error)]
pub enum CommunityConfigError {
    #[error("Failed to access community config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse community config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Community {id} has an invalid prefix: {reason}")]
    InvalidPrefix { id: CommunityId, reason: &'static str },

    #[error("Not a community config file name: {0}")]
    InvalidFileName(String),
}

/// Deployment classification of a community.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerType {
    Test,
    #[default]
    Prod,
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => write!(f, "TEST"),
            Self::Prod => write!(f, "PROD"),
        }
    }
}

impl FromStr for ServerType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEST" => Ok(Self::Test),
            "PROD" => Ok(Self::Prod),
            _ => Err(ConfigError::InvalidDeployment(s.to_owned())),
        }
    }
}

/// Settings of a single community.
///
/// The id is never written to disk; it is derived from the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityConfig {
    #[serde(skip)]
    pub id: CommunityId,

    #[serde(rename = "type", default)]
    pub server_type: ServerType,

    /// Command prefix override. Only the first character is significant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default)]
    pub ignored_channels: BTreeSet<ChannelId>,
}

impl CommunityConfig {
    /// Creates the in-memory default record for a community.
    #[must_use]
    pub const fn new(id: CommunityId) -> Self {
        Self {
            id,
            server_type: ServerType::Prod,
            prefix: None,
            ignored_channels: BTreeSet::new(),
        }
    }

    /// Path of the persisted record for `id` inside `directory`.
    #[must_use]
    pub fn path_for(directory: &Path, id: CommunityId) -> PathBuf {
        directory.join(format!("{id}{CONFIG_FILE_SUFFIX}"))
    }

    /// Extracts the community id from a config file name.
    ///
    /// Only canonical names are accepted, i.e. names [`Self::path_for`] would
    /// produce. `0100.config.json` is rejected because it is never loaded.
    pub fn id_from_path(path: &Path) -> Result<CommunityId, CommunityConfigError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        name.strip_suffix(CONFIG_FILE_SUFFIX)
            .and_then(|id| id.parse::<u64>().ok())
            .map(CommunityId)
            .filter(|id| format!("{id}{CONFIG_FILE_SUFFIX}") == name)
            .ok_or_else(|| CommunityConfigError::InvalidFileName(name.to_owned()))
    }

    /// Loads the record stored at `path`, taking the id from its file name.
    pub async fn load_path(path: &Path) -> Result<Self, CommunityConfigError> {
        let id = Self::id_from_path(path)?;
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.id = id;
        Ok(config)
    }

    /// Loads the record for `id` from `directory`.
    ///
    /// Returns `Ok(None)` if it has never been saved.
    pub async fn load(
        directory: &Path,
        id: CommunityId,
    ) -> Result<Option<Self>, CommunityConfigError> {
        let path = Self::path_for(directory, id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut config: Self = serde_json::from_str(&content)?;
        config.id = id;
        Ok(Some(config))
    }

    /// Writes the whole record to `directory`, replacing any previous file.
    pub async fn save(&self, directory: &Path) -> Result<(), CommunityConfigError> {
        tokio::fs::create_dir_all(directory).await?;
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(Self::path_for(directory, self.id), content).await?;
        Ok(())
    }

    /// Returns the effective prefix character, if one is set.
    #[must_use]
    pub fn prefix_char(&self) -> Option<char> {
        self.prefix.as_deref().and_then(|p| p.chars().next())
    }

    /// Assigns the command prefix.
    pub fn set_prefix(&mut self, prefix: char) {
        self.prefix = Some(prefix.to_string());
    }

    #[must_use]
    pub fn is_ignored(&self, channel: ChannelId) -> bool {
        self.ignored_channels.contains(&channel)
    }

    /// Adds channels to the ignored set. Returns how many were newly added.
    pub fn add_ignored_channels(&mut self, channels: impl IntoIterator<Item = ChannelId>) -> usize {
        channels
            .into_iter()
            .filter(|c| self.ignored_channels.insert(*c))
            .count()
    }

    /// Removes channels from the ignored set. Returns how many were removed.
    pub fn remove_ignored_channels(
        &mut self,
        channels: impl IntoIterator<Item = ChannelId>,
    ) -> usize {
        channels
            .into_iter()
            .filter(|c| self.ignored_channels.remove(c))
            .count()
    }

    /// Whether commands are accepted when running as `deployment`.
    #[must_use]
    pub fn allows_commands(&self, deployment: ServerType) -> bool {
        self.server_type == deployment
    }

    /// Checks the stored prefix, if any.
    pub fn validate(&self) -> Result<(), CommunityConfigError> {
        let Some(prefix) = self.prefix.as_deref() else {
            return Ok(());
        };

        let reason = match prefix.chars().next() {
            None => Some("prefix is empty"),
            Some(c) if c.is_whitespace() => Some("prefix starts with whitespace"),
            Some(_) if prefix.chars().count() > 1 => Some("only the first character is used"),
            Some(_) => None,
        };

        match reason {
            Some(reason) => Err(CommunityConfigError::InvalidPrefix {
                id: self.id,
                reason,
            }),
            None => Ok(()),
        }
    }
}
