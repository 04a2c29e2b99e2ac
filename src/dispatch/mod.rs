//! Message dispatch module.
//!
//! Turns inbound chat messages into command executions. The [`Dispatcher`]
//! filters a message, resolves the community prefix, expands aliases and
//! then tries the standard command table before falling back to the
//! community's custom commands. Every message ends in an [`Outcome`].

mod alias;
mod context;
mod counters;
mod dispatcher;
mod filter;
mod outcome;
mod prefix;
mod tracking;

#[cfg(test)]
pub(crate) mod testing;

pub use alias::{TemplateVars, expand_template, resolve_alias};
pub use context::DispatchContext;
pub use counters::{
    COMMAND_FAILED, COMMAND_SUCCESS, CUSTOM_COMMAND_EXECUTED, Counter, CounterSet,
};
pub use dispatcher::{Dispatcher, DispatcherServices};
pub use filter::{admit, is_dispatchable_event};
pub use outcome::Outcome;
pub use prefix::{ResolvedPrefix, resolve_prefix, strip_prefix};
pub use tracking::{ErrorTracker, LoggingErrorTracker};
