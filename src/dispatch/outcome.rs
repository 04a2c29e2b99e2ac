//! Dispatch outcome classification.

use std::fmt;

/// Final classification of one inbound message.
#[derive(Debug)]
pub enum Outcome {
    /// Filtered out, no prefix, or in an ignored channel. Silent.
    NotACommand,
    /// A standard or custom command ran.
    Success,
    /// Neither a standard nor a custom command matched. Silent.
    UnknownCommand,
    /// A standard command failed; the reason was sent to the channel.
    UserFacingFailure(String),
    /// Storage or gateway failure around the command. Logged and tracked, no reply.
    InternalFault(anyhow::Error),
}

impl Outcome {
    /// Whether this outcome produces no log noise and no reply.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::NotACommand | Self::UnknownCommand)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotACommand => write!(f, "not a command"),
            Self::Success => write!(f, "success"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::UserFacingFailure(reason) => write!(f, "failed: {reason}"),
            Self::InternalFault(e) => write!(f, "internal fault: {e}"),
        }
    }
}

/// Result of the standard command step.
///
/// `ExpectedUnknown` is the only result that lets dispatch continue to custom
/// commands; every real failure is already classified.
#[derive(Debug)]
pub(crate) enum StandardOutcome {
    Handled(Outcome),
    ExpectedUnknown,
}
