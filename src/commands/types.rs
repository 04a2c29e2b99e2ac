//! Command table types and definitions.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::DispatchContext;
use crate::gateway::GatewayError;
use crate::store::StoreError;

/// Why a command could not be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// No command with that name. Dispatch falls through to custom commands.
    UnknownCommand,
    /// Arguments could not be parsed.
    ParseFailed,
    /// Wrong number of arguments.
    BadArgCount,
    /// The command cannot run here (e.g. community-only in a direct message).
    UnmetPrecondition,
    /// The command body raised an error or panicked.
    Exception,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnknownCommand => "UnknownCommand",
            Self::ParseFailed => "ParseFailed",
            Self::BadArgCount => "BadArgCount",
            Self::UnmetPrecondition => "UnmetPrecondition",
            Self::Exception => "Exception",
        };
        f.write_str(name)
    }
}

/// A failed command execution.
#[derive(Debug)]
pub struct CommandFailure {
    pub error: CommandError,

    /// Text shown to the user.
    pub reason: String,

    /// Underlying fault, present for [`CommandError::Exception`].
    pub exception: Option<anyhow::Error>,
}

impl CommandFailure {
    #[must_use]
    pub fn new(error: CommandError, reason: impl Into<String>) -> Self {
        Self {
            error,
            reason: reason.into(),
            exception: None,
        }
    }

    #[must_use]
    pub fn unknown_command() -> Self {
        Self::new(CommandError::UnknownCommand, "Unknown command.")
    }

    #[must_use]
    pub fn parse_failed(reason: impl Into<String>) -> Self {
        Self::new(CommandError::ParseFailed, reason)
    }

    #[must_use]
    pub fn bad_arg_count(reason: impl Into<String>) -> Self {
        Self::new(CommandError::BadArgCount, reason)
    }

    #[must_use]
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::new(CommandError::UnmetPrecondition, reason)
    }

    /// Wraps a fault raised inside a command body.
    #[must_use]
    pub fn exception(error: anyhow::Error) -> Self {
        Self {
            error: CommandError::Exception,
            reason: error.to_string(),
            exception: Some(error),
        }
    }

    #[must_use]
    pub fn is_unknown_command(&self) -> bool {
        self.error == CommandError::UnknownCommand
    }
}

impl From<anyhow::Error> for CommandFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::exception(error)
    }
}

impl From<GatewayError> for CommandFailure {
    fn from(error: GatewayError) -> Self {
        Self::exception(error.into())
    }
}

impl From<StoreError> for CommandFailure {
    fn from(error: StoreError) -> Self {
        Self::exception(error.into())
    }
}

/// Result of executing command text against a command table.
pub type CommandResult = Result<(), CommandFailure>;

/// Executes command text. Faults inside commands come back as values.
#[async_trait]
pub trait CommandTable: Send + Sync {
    async fn execute(&self, ctx: &DispatchContext, command: &str) -> CommandResult;
}

/// A statically registered command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, lowercase.
    fn name(&self) -> &'static str;

    /// Alternative names, lowercase.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Usage line shown in help, without prefix.
    fn usage(&self) -> &'static str;

    /// One-line description shown in help.
    fn summary(&self) -> &'static str;

    /// Runs the command with the text after its name, trimmed.
    async fn run(&self, ctx: Arc<DispatchContext>, args: String) -> CommandResult;
}

/// Splits command text into a lowercase name and trimmed arguments.
#[must_use]
pub fn split_command(text: &str) -> Option<(String, &str)> {
    let text = text.trim_start();
    let (name, args) = match text.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (text.trim_end(), ""),
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args))
}
