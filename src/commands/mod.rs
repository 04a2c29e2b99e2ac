//! Command table module.
//!
//! The dispatcher hands prefix-stripped command text to a [`CommandTable`].
//! [`StaticCommandTable`] resolves the first word against registered
//! [`Command`]s and reports every fault as a [`CommandFailure`] value.

mod builtin;
mod table;
mod types;

pub use builtin::{
    AliasesCommand, HelpCommand, IgnoreCommand, PingCommand, PrefixCommand, UnignoreCommand,
    WhoamiCommand,
};
pub use table::StaticCommandTable;
pub use types::{
    Command, CommandError, CommandFailure, CommandResult, CommandTable, split_command,
};
