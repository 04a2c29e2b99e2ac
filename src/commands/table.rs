//! Statically registered command table.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::builtin;
use super::types::{Command, CommandFailure, CommandResult, CommandTable, split_command};
use crate::dispatch::DispatchContext;
use crate::store::CustomConfigSource;

/// Command table keyed by lowercase command name and alias.
///
/// Each command body runs in its own task, so a panic is reported as a
/// [`CommandError::Exception`](super::CommandError::Exception) failure
/// instead of unwinding into the dispatcher.
#[derive(Default)]
pub struct StaticCommandTable {
    commands: Vec<Arc<dyn Command>>,
    index: HashMap<&'static str, usize>,
}

impl StaticCommandTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with every built-in command registered.
    #[must_use]
    pub fn with_builtins(custom: Arc<dyn CustomConfigSource>) -> Self {
        let mut table = Self::new();
        table.register(builtin::PingCommand);
        table.register(builtin::WhoamiCommand);
        table.register(builtin::PrefixCommand);
        table.register(builtin::IgnoreCommand);
        table.register(builtin::UnignoreCommand);
        table.register(builtin::AliasesCommand::new(custom));

        let mut entries = table.help_entries();
        entries.push((builtin::HelpCommand::USAGE, builtin::HelpCommand::SUMMARY));
        table.register(builtin::HelpCommand::new(entries));

        for command in &table.commands {
            info!("Registered command: {}", command.name());
        }
        table
    }

    /// Adds a command. A later registration replaces earlier names it collides with.
    pub fn register(&mut self, command: impl Command + 'static) {
        let position = self.commands.len();
        for name in std::iter::once(command.name()).chain(command.aliases().iter().copied()) {
            if self.index.insert(name, position).is_some() {
                warn!("Command name '{}' registered twice, keeping the latest", name);
            }
        }
        self.commands.push(Arc::new(command));
    }

    /// Looks up a command by lowercase name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    /// Usage and summary of every registered command, in registration order.
    #[must_use]
    pub fn help_entries(&self) -> Vec<(&'static str, &'static str)> {
        self.commands
            .iter()
            .map(|c| (c.usage(), c.summary()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[async_trait]
impl CommandTable for StaticCommandTable {
    async fn execute(&self, ctx: &DispatchContext, command: &str) -> CommandResult {
        let Some((name, args)) = split_command(command) else {
            return Err(CommandFailure::unknown_command());
        };
        let Some(handler) = self.get(&name) else {
            return Err(CommandFailure::unknown_command());
        };

        debug!("Executing command '{}' {}", name, ctx.location());
        let handler = Arc::clone(handler);
        let mut ctx = ctx.clone();
        ctx.input = args.to_owned();
        let args = args.to_owned();

        let task = tokio::spawn(async move { handler.run(Arc::new(ctx), args).await });
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(CommandFailure::exception(anyhow!(
                "Command '{}' panicked: {}",
                name,
                panic_message(&*e.into_panic())
            ))),
            Err(e) => Err(CommandFailure::exception(
                anyhow::Error::new(e).context(format!("Command '{name}' was cancelled")),
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl std::fmt::Debug for StaticCommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.index.keys().collect();
        names.sort();
        f.debug_struct("StaticCommandTable")
            .field("names", &names)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use crate::dispatch::testing::{Harness, context};

    struct Panicking;

    #[async_trait]
    impl Command for Panicking {
        fn name(&self) -> &'static str {
            "explode"
        }

        fn usage(&self) -> &'static str {
            "explode"
        }

        fn summary(&self) -> &'static str {
            "Panics"
        }

        async fn run(&self, _ctx: Arc<DispatchContext>, _args: String) -> CommandResult {
            panic!("kaboom");
        }
    }

    struct Failing;

    #[async_trait]
    impl Command for Failing {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn aliases(&self) -> &'static [&'static str] {
            &["oops"]
        }

        fn usage(&self) -> &'static str {
            "fail"
        }

        fn summary(&self) -> &'static str {
            "Returns an error"
        }

        async fn run(&self, _ctx: Arc<DispatchContext>, args: String) -> CommandResult {
            Err(anyhow!("failed with '{args}'").into())
        }
    }

    #[tokio::test]
    async fn test_unknown_names() {
        let harness = Harness::new().await;
        let ctx = context(&harness, "!nope").await;
        let table = StaticCommandTable::new();

        assert!(table.execute(&ctx, "nope").await.unwrap_err().is_unknown_command());
        assert!(table.execute(&ctx, "   ").await.unwrap_err().is_unknown_command());
    }

    #[tokio::test]
    async fn test_panic_becomes_exception() {
        let harness = Harness::new().await;
        let ctx = context(&harness, "!explode").await;
        let mut table = StaticCommandTable::new();
        table.register(Panicking);

        let failure = table.execute(&ctx, "explode").await.unwrap_err();
        assert_eq!(failure.error, CommandError::Exception);
        assert!(failure.reason.contains("kaboom"));
        assert!(failure.exception.is_some());
    }

    #[tokio::test]
    async fn test_error_becomes_exception_via_alias_case_insensitive() {
        let harness = Harness::new().await;
        let ctx = context(&harness, "!OOPS now").await;
        let mut table = StaticCommandTable::new();
        table.register(Failing);

        let failure = table.execute(&ctx, "OOPS  now ").await.unwrap_err();
        assert_eq!(failure.error, CommandError::Exception);
        assert_eq!(failure.reason, "failed with 'now'");
    }

    #[tokio::test]
    async fn test_builtins_registered() {
        let harness = Harness::new().await;
        let table = StaticCommandTable::with_builtins(Arc::new(harness.db.clone()));
        for name in ["ping", "whoami", "help", "prefix", "ignore", "unignore", "aliases"] {
            assert!(table.get(name).is_some(), "missing {name}");
        }
        assert_eq!(table.help_entries().len(), table.len());
    }
}
