//! Configuration module for the dispatch bot.
//!
//! Covers process settings read at startup, the per-community config records
//! persisted one file per community, and the per-community aliases and custom
//! commands.

mod community;
mod custom;
mod settings;
mod store;

pub use community::{CONFIG_FILE_SUFFIX, CommunityConfig, CommunityConfigError, ServerType};
pub use custom::{
    Alias, AliasTable, CustomCommand, CustomConfig, CustomConfigError, CustomConfigFile,
};
pub use settings::{BotSettings, ConfigError, parse_prefix};
pub use store::CommunityConfigStore;
