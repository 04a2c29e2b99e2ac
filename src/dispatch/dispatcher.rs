//! Message dispatcher.
//!
//! Per message the pipeline is:
//! 1. Ingestion filter (message kind, bots, ourselves, blacklisted users)
//! 2. Prefix resolution, assigning the default prefix to new communities
//! 3. Alias expansion; an expanded command only ever runs as a standard command
//! 4. Standard command table
//! 5. Custom command lookup, only after the table reports an unknown command
//!
//! Every path ends in an [`Outcome`]. Nothing raised by collaborators escapes
//! [`Dispatcher::handle_message`].

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::alias::resolve_alias;
use super::counters::{COMMAND_FAILED, COMMAND_SUCCESS, CUSTOM_COMMAND_EXECUTED, CounterSet};
use super::filter::{admit, is_dispatchable_event};
use super::outcome::StandardOutcome;
use super::prefix::{ResolvedPrefix, resolve_prefix, strip_prefix};
use super::{DispatchContext, ErrorTracker, Outcome};
use crate::commands::CommandTable;
use crate::config::ServerType;
use crate::gateway::{Gateway, InboundMessage, UserId};
use crate::store::{CustomConfigSource, Database, Session, StoreError};

/// Collaborators the dispatcher depends on.
#[derive(Clone)]
pub struct DispatcherServices {
    pub database: Arc<dyn Database>,
    pub custom_configs: Arc<dyn CustomConfigSource>,
    pub commands: Arc<dyn CommandTable>,
    pub gateway: Arc<dyn Gateway>,
    pub errors: Arc<dyn ErrorTracker>,
    pub counters: Arc<CounterSet>,
}

/// Turns inbound messages into executed commands.
///
/// Safe to share between concurrent message tasks.
pub struct Dispatcher {
    services: DispatcherServices,
    default_prefix: char,
    deployment: ServerType,
}

impl Dispatcher {
    /// Creates a dispatcher running as a production deployment.
    #[must_use]
    pub fn new(services: DispatcherServices, default_prefix: char) -> Self {
        Self {
            services,
            default_prefix,
            deployment: ServerType::Prod,
        }
    }

    /// Sets which communities accept commands.
    #[must_use]
    pub const fn with_deployment(mut self, deployment: ServerType) -> Self {
        self.deployment = deployment;
        self
    }

    #[must_use]
    pub const fn default_prefix(&self) -> char {
        self.default_prefix
    }

    #[must_use]
    pub fn counters(&self) -> &Arc<CounterSet> {
        &self.services.counters
    }

    /// Handles one inbound message from start to finish.
    ///
    /// Opens a session for the message and closes it on every exit path.
    pub async fn handle_message(&self, message: InboundMessage) -> Outcome {
        let identity = self.services.gateway.current_user();
        if !is_dispatchable_event(&message, identity) {
            return Outcome::NotACommand;
        }

        let location = location_of(&message);
        let session = match self.services.database.open_session().await {
            Ok(session) => session,
            Err(e) => {
                return self.internal_fault(
                    anyhow::Error::new(e).context("failed to open session"),
                    &location,
                );
            }
        };

        let outcome = match self.prepare(&session, message, identity).await {
            Ok(Some((ctx, command))) => self.dispatch(ctx, &command).await,
            Ok(None) => Outcome::NotACommand,
            Err(e) => self.internal_fault(
                anyhow::Error::new(e).context("failed to prepare dispatch"),
                &location,
            ),
        };

        if let Err(e) = session.close().await {
            warn!("Failed to close session {}: {}", session.id(), e);
        }
        outcome
    }

    /// Filters the message and resolves its prefix.
    ///
    /// Returns `None` when the message is not a command.
    async fn prepare(
        &self,
        session: &Arc<dyn Session>,
        message: InboundMessage,
        identity: Option<UserId>,
    ) -> Result<Option<(DispatchContext, String)>, StoreError> {
        let Some(user) = admit(&message, identity, session.as_ref()).await? else {
            return Ok(None);
        };

        let ResolvedPrefix { prefix, community } =
            resolve_prefix(session.as_ref(), message.community, self.default_prefix).await?;

        let Some(command) = strip_prefix(&message.content, prefix) else {
            return Ok(None);
        };
        let command = command.to_owned();

        if let Some(config) = &community {
            if config.is_ignored(message.channel) {
                debug!(
                    "Ignoring command in ignored channel {} of community {}",
                    message.channel, config.id
                );
                return Ok(None);
            }
            if !config.allows_commands(self.deployment) {
                debug!(
                    "Ignoring command in {} community {} (running as {})",
                    config.server_type, config.id, self.deployment
                );
                return Ok(None);
            }
        }

        let ctx = DispatchContext::new(
            message,
            community,
            user,
            prefix,
            Arc::clone(session),
            Arc::clone(&self.services.gateway),
        );
        Ok(Some((ctx, command)))
    }

    /// Dispatches prefix-stripped command text: alias, then standard, then custom.
    pub async fn dispatch(&self, mut ctx: DispatchContext, command: &str) -> Outcome {
        if let Some(id) = ctx.community_id() {
            let custom = match self.services.custom_configs.custom_config(id).await {
                Ok(custom) => custom,
                Err(e) => {
                    return self.internal_fault(
                        anyhow::Error::new(e).context("failed to load aliases"),
                        &ctx.location(),
                    );
                }
            };

            let expanded = custom
                .aliases
                .as_ref()
                .and_then(|aliases| resolve_alias(aliases, command, &ctx.template_vars()));

            if let Some(expanded) = expanded {
                debug!("Expanded alias \"{}\" to \"{}\"", command, expanded);
                ctx.alias_expanded = true;
                return match self.execute_standard(&ctx, &expanded).await {
                    StandardOutcome::Handled(outcome) => outcome,
                    StandardOutcome::ExpectedUnknown => Outcome::UnknownCommand,
                };
            }
        }

        match self.execute_standard(&ctx, command).await {
            StandardOutcome::Handled(outcome) => outcome,
            StandardOutcome::ExpectedUnknown => self.execute_custom(ctx, command).await,
        }
    }

    async fn execute_standard(&self, ctx: &DispatchContext, command: &str) -> StandardOutcome {
        let failure = match self.services.commands.execute(ctx, command).await {
            Ok(()) => {
                info!(
                    "Command successfully executed \"{}\" {}.",
                    ctx.message.content,
                    ctx.location()
                );
                self.services.counters.get(COMMAND_SUCCESS).increment();
                return StandardOutcome::Handled(Outcome::Success);
            }
            Err(failure) if failure.is_unknown_command() => {
                return StandardOutcome::ExpectedUnknown;
            }
            Err(failure) => failure,
        };

        error!(
            "Command failed \"{}\" {} ({})",
            command,
            ctx.location(),
            failure.error
        );
        self.services.counters.get(COMMAND_FAILED).increment();
        match &failure.exception {
            Some(exception) => {
                self.services.errors.register_exception(exception);
                error!("{:?}", exception);
            }
            None => error!("{}", failure.reason),
        }

        if let Err(e) = ctx.respond(&failure.reason).await {
            warn!(
                "Failed to send failure reason to channel {}: {}",
                ctx.message.channel, e
            );
        }
        StandardOutcome::Handled(Outcome::UserFacingFailure(failure.reason))
    }

    async fn execute_custom(&self, mut ctx: DispatchContext, command: &str) -> Outcome {
        let Some(id) = ctx.community_id() else {
            return Outcome::UnknownCommand;
        };
        let command = command.trim_start();
        let Some(name) = command.split_whitespace().next() else {
            return Outcome::UnknownCommand;
        };

        let definition = match ctx.session().custom_command(id, name).await {
            Ok(Some(definition)) => definition,
            Ok(None) => return Outcome::UnknownCommand,
            Err(e) => {
                return self.internal_fault(
                    anyhow::Error::new(e).context("custom command lookup failed"),
                    &ctx.location(),
                );
            }
        };

        let input = command[name.len()..].trim().to_owned();
        ctx.input.clone_from(&input);
        if let Err(e) = definition.execute(&ctx, &input).await {
            return self.internal_fault(
                anyhow::Error::new(e).context(format!("custom command '{name}' failed")),
                &ctx.location(),
            );
        }

        self.services.counters.get(CUSTOM_COMMAND_EXECUTED).increment();
        info!("Custom command \"{}\" executed {}.", name, ctx.location());
        Outcome::Success
    }

    fn internal_fault(&self, error: anyhow::Error, location: &str) -> Outcome {
        error!("Dispatch fault {}: {:#}", location, error);
        self.services.errors.register_exception(&error);
        Outcome::InternalFault(error)
    }
}

fn location_of(message: &InboundMessage) -> String {
    match message.community {
        Some(id) => format!("in channel {} of community {}", message.channel, id),
        None => "in private channel".to_owned(),
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("default_prefix", &self.default_prefix)
            .field("deployment", &self.deployment)
            .finish_non_exhaustive()
    }
}
