//! Process-wide bot settings.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ServerType;
use crate::gateway::UserId;

/// Bot-specific settings, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Default command prefix for direct messages and communities without one.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,

    /// Directory holding one `<id>.config.json` file per community.
    #[serde(default = "default_config_directory")]
    pub config_directory: PathBuf,

    /// Path to the aliases and custom commands file.
    #[serde(default = "default_custom_config_path")]
    pub custom_config_path: PathBuf,

    /// Deployment this process runs as; communities of the other type are skipped.
    #[serde(default)]
    pub deployment: ServerType,

    /// Account the bot is logged in as.
    #[serde(default = "default_bot_user_id")]
    pub bot_user_id: UserId,

    /// Users whose messages are never dispatched.
    #[serde(default)]
    pub blacklisted_users: Vec<UserId>,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

const fn default_command_prefix() -> char {
    '!'
}

fn default_config_directory() -> PathBuf {
    PathBuf::from("config")
}

fn default_custom_config_path() -> PathBuf {
    PathBuf::from("custom.json")
}

const fn default_bot_user_id() -> UserId {
    UserId(1)
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            config_directory: default_config_directory(),
            custom_config_path: default_custom_config_path(),
            deployment: ServerType::default(),
            bot_user_id: default_bot_user_id(),
            blacklisted_users: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates settings from environment variables.
    ///
    /// Unset variables take their defaults; set but malformed ones are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if any set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates bot settings from environment variables with defaults.
    ///
    /// Malformed variables are ignored in favour of their defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup_with_defaults(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            command_prefix: read_var(&lookup, "COMMAND_PREFIX", parse_prefix)?
                .unwrap_or(defaults.command_prefix),
            config_directory: read_var(&lookup, "CONFIG_DIRECTORY", |s| Ok(PathBuf::from(s)))?
                .unwrap_or(defaults.config_directory),
            custom_config_path: read_var(&lookup, "CUSTOM_CONFIG_PATH", |s| {
                Ok(PathBuf::from(s))
            })?
            .unwrap_or(defaults.custom_config_path),
            deployment: read_var(&lookup, "DEPLOYMENT", ServerType::from_str)?
                .unwrap_or(defaults.deployment),
            bot_user_id: read_var(&lookup, "BOT_USER_ID", |s| parse_user_id("BOT_USER_ID", s))?
                .unwrap_or(defaults.bot_user_id),
            blacklisted_users: read_var(&lookup, "BLACKLISTED_USERS", parse_user_list)?
                .unwrap_or(defaults.blacklisted_users),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        })
    }

    fn from_lookup_with_defaults(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            command_prefix: read_var(&lookup, "COMMAND_PREFIX", parse_prefix)
                .ok()
                .flatten()
                .unwrap_or(defaults.command_prefix),
            config_directory: lookup("CONFIG_DIRECTORY")
                .map_or(defaults.config_directory, PathBuf::from),
            custom_config_path: lookup("CUSTOM_CONFIG_PATH")
                .map_or(defaults.custom_config_path, PathBuf::from),
            deployment: read_var(&lookup, "DEPLOYMENT", ServerType::from_str)
                .ok()
                .flatten()
                .unwrap_or(defaults.deployment),
            bot_user_id: read_var(&lookup, "BOT_USER_ID", |s| parse_user_id("BOT_USER_ID", s))
                .ok()
                .flatten()
                .unwrap_or(defaults.bot_user_id),
            blacklisted_users: read_var(&lookup, "BLACKLISTED_USERS", parse_user_list)
                .ok()
                .flatten()
                .unwrap_or(defaults.blacklisted_users),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

fn read_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    parse: impl FnOnce(&str) -> Result<T, ConfigError>,
) -> Result<Option<T>, ConfigError> {
    lookup(name).map(|value| parse(&value)).transpose()
}

/// Parses a command prefix, which must be exactly one non-whitespace character.
pub fn parse_prefix(value: &str) -> Result<char, ConfigError> {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() => Ok(c),
        _ => Err(ConfigError::InvalidPrefix(value.to_owned())),
    }
}

fn parse_user_id(var: &'static str, value: &str) -> Result<UserId, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(UserId)
        .map_err(|_| ConfigError::InvalidUserId {
            var,
            value: value.to_owned(),
        })
}

fn parse_user_list(value: &str) -> Result<Vec<UserId>, ConfigError> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_user_id("BLACKLISTED_USERS", s))
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid command prefix '{0}' (must be a single non-whitespace character)")]
    InvalidPrefix(String),

    #[error("Invalid deployment '{0}' (expected TEST or PROD)")]
    InvalidDeployment(String),

    #[error("Invalid user id in {var}: '{value}'")]
    InvalidUserId { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let settings = BotSettings::from_lookup(vars(&[
            ("COMMAND_PREFIX", "?"),
            ("CONFIG_DIRECTORY", "/srv/communities"),
            ("DEPLOYMENT", "test"),
            ("BOT_USER_ID", "42"),
            ("BLACKLISTED_USERS", "7,8"),
        ]))
        .unwrap();
        assert_eq!(settings.command_prefix, '?');
        assert_eq!(settings.config_directory, PathBuf::from("/srv/communities"));
        assert_eq!(settings.custom_config_path, PathBuf::from("custom.json"));
        assert_eq!(settings.deployment, ServerType::Test);
        assert_eq!(settings.bot_user_id, UserId(42));
        assert_eq!(settings.blacklisted_users, vec![UserId(7), UserId(8)]);
    }

    #[test]
    fn test_from_lookup_rejects_malformed_values() {
        assert!(matches!(
            BotSettings::from_lookup(vars(&[("COMMAND_PREFIX", "!!")])),
            Err(ConfigError::InvalidPrefix(_))
        ));
        assert!(matches!(
            BotSettings::from_lookup(vars(&[("DEPLOYMENT", "staging")])),
            Err(ConfigError::InvalidDeployment(_))
        ));
        assert!(matches!(
            BotSettings::from_lookup(vars(&[("BOT_USER_ID", "me")])),
            Err(ConfigError::InvalidUserId { var: "BOT_USER_ID", .. })
        ));
    }

    #[test]
    fn test_from_lookup_with_defaults_falls_back() {
        let settings = BotSettings::from_lookup_with_defaults(vars(&[
            ("COMMAND_PREFIX", "!!"),
            ("DEPLOYMENT", "staging"),
            ("BLACKLISTED_USERS", "1,abc"),
            ("CONFIG_DIRECTORY", "cfg"),
        ]));
        assert_eq!(settings.command_prefix, '!');
        assert_eq!(settings.deployment, ServerType::Prod);
        assert!(settings.blacklisted_users.is_empty());
        assert_eq!(settings.config_directory, PathBuf::from("cfg"));
    }

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.command_prefix, '!');
        assert_eq!(settings.config_directory, PathBuf::from("config"));
        assert_eq!(settings.deployment, ServerType::Prod);
        assert!(settings.blacklisted_users.is_empty());
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("~").unwrap(), '~');
        assert_eq!(parse_prefix(" ? ").unwrap(), '?');
        assert!(matches!(parse_prefix(""), Err(ConfigError::InvalidPrefix(_))));
        assert!(matches!(parse_prefix("!!"), Err(ConfigError::InvalidPrefix(_))));
    }

    #[test]
    fn test_parse_user_list() {
        assert_eq!(
            parse_user_list("1, 2,,3").unwrap(),
            vec![UserId(1), UserId(2), UserId(3)]
        );
        assert!(parse_user_list("1,abc").is_err());
    }
}
