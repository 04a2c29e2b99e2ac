//! Per-community aliases and custom commands.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{DispatchContext, TemplateVars, expand_template};
use crate::gateway::{CommunityId, GatewayError};

/// Errors in the custom config file.
#[derive(Debug, Error)]
pub enum CustomConfigError {
    #[error("Failed to read custom config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse custom config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Alias trigger cannot be empty")]
    EmptyTrigger,

    #[error("Duplicate alias trigger: {0}")]
    DuplicateAlias(String),

    #[error("Invalid custom command name: '{0}'")]
    InvalidCommandName(String),

    #[error("Duplicate custom command: {0}")]
    DuplicateCommand(String),
}

/// A shorthand that expands to a full command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub trigger: String,
    pub expansion: String,
}

impl Alias {
    #[must_use]
    pub fn new(trigger: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            expansion: expansion.into(),
        }
    }
}

/// Ordered alias table with unique triggers.
///
/// Order is significant: the first trigger the command text starts with wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(Vec<Alias>);

impl AliasTable {
    /// Appends an alias, rejecting empty and duplicate triggers.
    pub fn insert(&mut self, alias: Alias) -> Result<(), CustomConfigError> {
        if alias.trigger.is_empty() {
            return Err(CustomConfigError::EmptyTrigger);
        }
        if self.0.iter().any(|a| a.trigger == alias.trigger) {
            return Err(CustomConfigError::DuplicateAlias(alias.trigger));
        }
        self.0.push(alias);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self) -> Result<(), CustomConfigError> {
        let mut seen = HashSet::new();
        for alias in &self.0 {
            if alias.trigger.is_empty() {
                return Err(CustomConfigError::EmptyTrigger);
            }
            if !seen.insert(alias.trigger.as_str()) {
                return Err(CustomConfigError::DuplicateAlias(alias.trigger.clone()));
            }
        }
        Ok(())
    }
}

impl FromIterator<Alias> for AliasTable {
    fn from_iter<I: IntoIterator<Item = Alias>>(iter: I) -> Self {
        let mut table = Self::default();
        for alias in iter {
            // Later duplicates lose to the first occurrence.
            let _ = table.insert(alias);
        }
        table
    }
}

/// A community-defined command that replies with a response template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub name: String,
    pub response: String,
}

impl CustomCommand {
    #[must_use]
    pub fn new(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: response.into(),
        }
    }

    /// Renders the response against `input` and sends it to the message's channel.
    pub async fn execute(&self, ctx: &DispatchContext, input: &str) -> Result<(), GatewayError> {
        let vars = TemplateVars {
            input,
            ..ctx.template_vars()
        };
        let response = expand_template(&self.response, &vars);
        if response.trim().is_empty() {
            return Ok(());
        }
        ctx.respond(&response).await
    }
}

/// Aliases and custom commands of one community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<AliasTable>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CustomCommand>,
}

impl CustomConfig {
    pub fn add_alias(&mut self, alias: Alias) -> Result<(), CustomConfigError> {
        self.aliases.get_or_insert_with(AliasTable::default).insert(alias)
    }

    pub fn add_command(&mut self, command: CustomCommand) -> Result<(), CustomConfigError> {
        validate_command_name(&command.name)?;
        if self.command(&command.name).is_some() {
            return Err(CustomConfigError::DuplicateCommand(command.name));
        }
        self.commands.push(command);
        Ok(())
    }

    /// Finds a custom command by exact name.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&CustomCommand> {
        self.commands.iter().find(|c| c.name == name)
    }

    fn validate(&self) -> Result<(), CustomConfigError> {
        if let Some(aliases) = &self.aliases {
            aliases.validate()?;
        }
        let mut seen = HashSet::new();
        for command in &self.commands {
            validate_command_name(&command.name)?;
            if !seen.insert(command.name.as_str()) {
                return Err(CustomConfigError::DuplicateCommand(command.name.clone()));
            }
        }
        Ok(())
    }
}

fn validate_command_name(name: &str) -> Result<(), CustomConfigError> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(CustomConfigError::InvalidCommandName(name.to_owned()));
    }
    Ok(())
}

/// The custom config file: one entry per community id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomConfigFile {
    communities: HashMap<CommunityId, CustomConfig>,
}

impl CustomConfigFile {
    /// Loads and validates the file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CustomConfigError> {
        let content = std::fs::read_to_string(path)?;
        let file: Self = serde_json::from_str(&content)?;
        file.validate()?;
        Ok(file)
    }

    /// Loads the file, or returns an empty config if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, CustomConfigError> {
        match Self::load_from_file(path) {
            Err(CustomConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CustomConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CustomConfigError> {
        self.communities.values().try_for_each(CustomConfig::validate)
    }

    #[must_use]
    pub fn get(&self, id: CommunityId) -> Option<&CustomConfig> {
        self.communities.get(&id)
    }

    pub fn insert(&mut self, id: CommunityId, config: CustomConfig) {
        self.communities.insert(id, config);
    }

    #[must_use]
    pub fn command(&self, id: CommunityId, name: &str) -> Option<&CustomCommand> {
        self.get(id).and_then(|c| c.command(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Creates an example file for users to reference.
    #[must_use]
    pub fn example() -> Self {
        let mut config = CustomConfig::default();
        let _ = config.add_alias(Alias::new("gm", "greet morning $input"));
        let _ = config.add_command(CustomCommand::new("echo", "$input"));
        let _ = config.add_command(CustomCommand::new("rules", "Be nice, $user."));

        let mut file = Self::default();
        file.insert(CommunityId(100), config);
        file
    }
}
