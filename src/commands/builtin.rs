//! Built-in commands.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use super::types::{Command, CommandFailure, CommandResult};
use crate::config::parse_prefix;
use crate::dispatch::DispatchContext;
use crate::gateway::{ChannelId, CommunityId};
use crate::store::CustomConfigSource;

/// Replies with "Pong!".
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn usage(&self) -> &'static str {
        "ping"
    }

    fn summary(&self) -> &'static str {
        "Check that the bot is responding"
    }

    async fn run(&self, ctx: Arc<DispatchContext>, _args: String) -> CommandResult {
        ctx.respond("Pong!").await?;
        Ok(())
    }
}

/// Shows the caller's user record.
pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &'static str {
        "whoami"
    }

    fn usage(&self) -> &'static str {
        "whoami"
    }

    fn summary(&self) -> &'static str {
        "Show what the bot knows about you"
    }

    async fn run(&self, ctx: Arc<DispatchContext>, _args: String) -> CommandResult {
        let user = &ctx.user;
        ctx.respond(&format!(
            "{} ({}), first seen {}",
            user.name,
            user.id,
            user.first_seen.format("%Y-%m-%d %H:%M UTC")
        ))
        .await?;
        Ok(())
    }
}

/// Lists the registered commands.
pub struct HelpCommand {
    entries: Vec<(&'static str, &'static str)>,
}

impl HelpCommand {
    pub const USAGE: &'static str = "help";
    pub const SUMMARY: &'static str = "Show this help message";

    #[must_use]
    pub fn new(entries: Vec<(&'static str, &'static str)>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["h", "?"]
    }

    fn usage(&self) -> &'static str {
        Self::USAGE
    }

    fn summary(&self) -> &'static str {
        Self::SUMMARY
    }

    async fn run(&self, ctx: Arc<DispatchContext>, _args: String) -> CommandResult {
        let mut text = format!("Commands (prefix: {})\n", ctx.prefix);
        for (usage, summary) in &self.entries {
            let _ = writeln!(text, "  {}{usage} - {summary}", ctx.prefix);
        }
        ctx.respond(text.trim_end()).await?;
        Ok(())
    }
}

/// Shows or changes the community's command prefix.
pub struct PrefixCommand;

#[async_trait]
impl Command for PrefixCommand {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn usage(&self) -> &'static str {
        "prefix [char]"
    }

    fn summary(&self) -> &'static str {
        "Show or change the command prefix"
    }

    async fn run(&self, ctx: Arc<DispatchContext>, args: String) -> CommandResult {
        let id = require_community(&ctx)?;

        if args.is_empty() {
            ctx.respond(&format!("Current prefix: `{}`", ctx.prefix)).await?;
            return Ok(());
        }

        let prefix = parse_prefix(&args).map_err(|e| CommandFailure::parse_failed(e.to_string()))?;
        ctx.session().set_community_prefix(id, prefix).await?;
        ctx.respond(&format!("✓ Prefix set to `{prefix}`")).await?;
        Ok(())
    }
}

/// Stops dispatching commands in channels.
pub struct IgnoreCommand;

#[async_trait]
impl Command for IgnoreCommand {
    fn name(&self) -> &'static str {
        "ignore"
    }

    fn usage(&self) -> &'static str {
        "ignore [channel...]"
    }

    fn summary(&self) -> &'static str {
        "Ignore commands in this or the given channels"
    }

    async fn run(&self, ctx: Arc<DispatchContext>, args: String) -> CommandResult {
        let id = require_community(&ctx)?;
        let channels = parse_channels(&args, ctx.message.channel)?;
        let requested = channels.len();
        let added = ctx.session().add_ignored_channels(id, channels).await?;
        ctx.respond(&format!(
            "✓ Ignoring {added} new channel(s) ({} already ignored).",
            requested - added
        ))
        .await?;
        Ok(())
    }
}

/// Resumes dispatching commands in channels.
pub struct UnignoreCommand;

#[async_trait]
impl Command for UnignoreCommand {
    fn name(&self) -> &'static str {
        "unignore"
    }

    fn usage(&self) -> &'static str {
        "unignore <channel...>"
    }

    fn summary(&self) -> &'static str {
        "Accept commands in the given channels again"
    }

    async fn run(&self, ctx: Arc<DispatchContext>, args: String) -> CommandResult {
        let id = require_community(&ctx)?;
        // Commands posted in an ignored channel never get here, so the channel must be named.
        if args.is_empty() {
            return Err(CommandFailure::bad_arg_count(
                "Name at least one channel to stop ignoring.",
            ));
        }
        let channels = parse_channels(&args, ctx.message.channel)?;
        let removed = ctx.session().remove_ignored_channels(id, channels).await?;
        ctx.respond(&format!("✓ No longer ignoring {removed} channel(s)."))
            .await?;
        Ok(())
    }
}

/// Lists the community's aliases.
pub struct AliasesCommand {
    custom: Arc<dyn CustomConfigSource>,
}

impl AliasesCommand {
    #[must_use]
    pub fn new(custom: Arc<dyn CustomConfigSource>) -> Self {
        Self { custom }
    }
}

#[async_trait]
impl Command for AliasesCommand {
    fn name(&self) -> &'static str {
        "aliases"
    }

    fn usage(&self) -> &'static str {
        "aliases"
    }

    fn summary(&self) -> &'static str {
        "List this community's aliases"
    }

    async fn run(&self, ctx: Arc<DispatchContext>, _args: String) -> CommandResult {
        let id = require_community(&ctx)?;
        let config = self.custom.custom_config(id).await?;

        let aliases = match config.aliases {
            Some(aliases) if !aliases.is_empty() => aliases,
            _ => {
                ctx.respond("No aliases configured.").await?;
                return Ok(());
            }
        };

        let mut text = String::from("Aliases:\n");
        for alias in aliases.iter() {
            let _ = writeln!(text, "  {}{} → {}", ctx.prefix, alias.trigger, alias.expansion);
        }
        ctx.respond(text.trim_end()).await?;
        Ok(())
    }
}

fn require_community(ctx: &DispatchContext) -> Result<CommunityId, CommandFailure> {
    ctx.community_id().ok_or_else(|| {
        CommandFailure::precondition("This command can only be used in a community.")
    })
}

/// Parses channel ids (`123` or `<#123>`), defaulting to `current` when empty.
fn parse_channels(args: &str, current: ChannelId) -> Result<Vec<ChannelId>, CommandFailure> {
    if args.trim().is_empty() {
        return Ok(vec![current]);
    }

    args.split_whitespace()
        .map(|token| {
            let raw = token
                .strip_prefix("<#")
                .and_then(|t| t.strip_suffix('>'))
                .unwrap_or(token);
            raw.parse::<u64>()
                .map(ChannelId)
                .map_err(|_| CommandFailure::parse_failed(format!("Not a channel: '{token}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use crate::dispatch::testing::{Harness, context, direct_context};

    #[test]
    fn test_parse_channels() {
        assert_eq!(parse_channels("", ChannelId(5)).unwrap(), vec![ChannelId(5)]);
        assert_eq!(
            parse_channels("1 <#2>", ChannelId(5)).unwrap(),
            vec![ChannelId(1), ChannelId(2)]
        );
        let failure = parse_channels("1 general", ChannelId(5)).unwrap_err();
        assert_eq!(failure.error, CommandError::ParseFailed);
    }

    #[tokio::test]
    async fn test_ping_replies() {
        let harness = Harness::new().await;
        let ctx = Arc::new(context(&harness, "!ping").await);
        PingCommand.run(ctx, String::new()).await.unwrap();
        assert_eq!(harness.gateway.replies(), vec!["Pong!".to_owned()]);
    }

    #[tokio::test]
    async fn test_whoami_reports_first_seen() {
        let harness = Harness::new().await;
        let ctx = Arc::new(direct_context(&harness, "!whoami").await);
        let expected = format!(
            "alice (5), first seen {}",
            ctx.user.first_seen.format("%Y-%m-%d %H:%M UTC")
        );
        WhoamiCommand.run(ctx, String::new()).await.unwrap();
        assert_eq!(harness.gateway.replies(), vec![expected]);
    }

    #[tokio::test]
    async fn test_prefix_requires_community() {
        let harness = Harness::new().await;
        let ctx = Arc::new(direct_context(&harness, "!prefix ?").await);
        let failure = PrefixCommand.run(ctx, "?".to_owned()).await.unwrap_err();
        assert_eq!(failure.error, CommandError::UnmetPrecondition);
    }

    #[tokio::test]
    async fn test_prefix_change_is_saved() {
        let harness = Harness::new().await;
        let ctx = Arc::new(context(&harness, "!prefix ?").await);
        let id = ctx.community_id().unwrap();

        PrefixCommand.run(ctx, "?".to_owned()).await.unwrap();
        let config = harness.db.communities().get_or_create(id).await.unwrap();
        assert_eq!(config.prefix_char(), Some('?'));
        assert_eq!(harness.gateway.replies(), vec!["✓ Prefix set to `?`".to_owned()]);
    }

    #[tokio::test]
    async fn test_prefix_rejects_multiple_characters() {
        let harness = Harness::new().await;
        let ctx = Arc::new(context(&harness, "!prefix ab").await);
        let failure = PrefixCommand.run(ctx, "ab".to_owned()).await.unwrap_err();
        assert_eq!(failure.error, CommandError::ParseFailed);
    }

    #[tokio::test]
    async fn test_ignore_current_channel_twice() {
        let harness = Harness::new().await;
        let ctx = Arc::new(context(&harness, "!ignore").await);
        let id = ctx.community_id().unwrap();

        IgnoreCommand.run(Arc::clone(&ctx), String::new()).await.unwrap();
        IgnoreCommand.run(Arc::clone(&ctx), String::new()).await.unwrap();

        let config = harness.db.communities().get_or_create(id).await.unwrap();
        assert_eq!(config.ignored_channels.len(), 1);
        assert!(config.is_ignored(ctx.message.channel));
    }

    #[tokio::test]
    async fn test_unignore_requires_channel() {
        let harness = Harness::new().await;
        let ctx = Arc::new(context(&harness, "!unignore").await);
        let failure = UnignoreCommand.run(ctx, String::new()).await.unwrap_err();
        assert_eq!(failure.error, CommandError::BadArgCount);
    }

    #[tokio::test]
    async fn test_help_lists_entries_with_prefix() {
        let harness = Harness::new().await;
        let ctx = Arc::new(context(&harness, "!help").await);
        HelpCommand::new(vec![("ping", "Check")])
            .run(ctx, String::new())
            .await
            .unwrap();
        let replies = harness.gateway.replies();
        assert!(replies[0].contains("!ping - Check"));
    }
}
