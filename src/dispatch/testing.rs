//! Test doubles for dispatcher collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tempfile::TempDir;

use super::{CounterSet, DispatchContext, Dispatcher, DispatcherServices, ErrorTracker};
use crate::commands::{
    Command, CommandError, CommandFailure, CommandResult, CommandTable, split_command,
};
use crate::config::{CommunityConfigStore, CustomConfigFile};
use crate::gateway::{
    Author, ChannelId, CommunityId, Gateway, GatewayError, InboundMessage, UserId,
};
use crate::store::{Database, LocalDatabase};

pub const BOT_ID: UserId = UserId(1);
pub const AUTHOR: UserId = UserId(5);
pub const BLACKLISTED: UserId = UserId(66);
pub const COMMUNITY: CommunityId = CommunityId(100);
pub const CHANNEL: ChannelId = ChannelId(10);
pub const DM_CHANNEL: ChannelId = ChannelId(20);

/// Gateway that records replies instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    replies: Mutex<Vec<(ChannelId, String)>>,
    failing: AtomicBool,
}

impl RecordingGateway {
    pub fn replies(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    fn current_user(&self) -> Option<UserId> {
        Some(BOT_ID)
    }

    async fn respond(&self, channel: ChannelId, text: &str) -> Result<(), GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Closed);
        }
        self.replies.lock().unwrap().push((channel, text.to_owned()));
        Ok(())
    }
}

/// Scripted behaviour of one command name.
#[derive(Debug, Clone)]
pub enum Script {
    Succeed,
    Reply(String),
    Fail(CommandError, String),
    Throw(String),
}

/// Command table answering from scripts and recording every call.
#[derive(Debug, Default)]
pub struct ScriptedTable {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTable {
    pub fn script(&self, name: &str, script: Script) {
        self.scripts.lock().unwrap().insert(name.to_owned(), script);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandTable for ScriptedTable {
    async fn execute(&self, ctx: &DispatchContext, command: &str) -> CommandResult {
        self.calls.lock().unwrap().push(command.to_owned());

        let script = split_command(command)
            .and_then(|(name, _)| self.scripts.lock().unwrap().get(&name).cloned());

        match script {
            None => Err(CommandFailure::unknown_command()),
            Some(Script::Succeed) => Ok(()),
            Some(Script::Reply(text)) => {
                ctx.respond(&text).await?;
                Ok(())
            }
            Some(Script::Fail(error, reason)) => Err(CommandFailure::new(error, reason)),
            Some(Script::Throw(message)) => Err(CommandFailure::exception(anyhow!(message))),
        }
    }
}

/// Error tracker that keeps every registered fault.
#[derive(Debug, Default)]
pub struct CapturingTracker {
    errors: Mutex<Vec<String>>,
}

impl CapturingTracker {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl ErrorTracker for CapturingTracker {
    fn register_exception(&self, error: &anyhow::Error) {
        self.errors.lock().unwrap().push(format!("{error:#}"));
    }
}

/// Command whose body panics.
pub struct PanicCommand;

#[async_trait]
impl Command for PanicCommand {
    fn name(&self) -> &'static str {
        "panic"
    }

    fn usage(&self) -> &'static str {
        "panic"
    }

    fn summary(&self) -> &'static str {
        "Panics"
    }

    async fn run(&self, _ctx: Arc<DispatchContext>, _args: String) -> CommandResult {
        panic!("command body panicked");
    }
}

/// A temporary database wired to recording fakes.
pub struct Harness {
    pub dir: TempDir,
    pub db: LocalDatabase,
    pub gateway: Arc<RecordingGateway>,
    pub table: Arc<ScriptedTable>,
    pub tracker: Arc<CapturingTracker>,
    pub counters: Arc<CounterSet>,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = LocalDatabase::new(
            CommunityConfigStore::new(dir.path()),
            CustomConfigFile::default(),
            [BLACKLISTED],
        );
        Self {
            dir,
            db,
            gateway: Arc::new(RecordingGateway::default()),
            table: Arc::new(ScriptedTable::default()),
            tracker: Arc::new(CapturingTracker::default()),
            counters: Arc::new(CounterSet::new()),
        }
    }

    pub fn services(&self, commands: Arc<dyn CommandTable>) -> DispatcherServices {
        DispatcherServices {
            database: Arc::new(self.db.clone()),
            custom_configs: Arc::new(self.db.clone()),
            commands,
            gateway: Arc::clone(&self.gateway) as Arc<dyn Gateway>,
            errors: Arc::clone(&self.tracker) as Arc<dyn ErrorTracker>,
            counters: Arc::clone(&self.counters),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher_with(Arc::clone(&self.table) as Arc<dyn CommandTable>)
    }

    pub fn dispatcher_with(&self, commands: Arc<dyn CommandTable>) -> Dispatcher {
        Dispatcher::new(self.services(commands), '!')
    }

    pub fn dispatcher_with_prefix(&self, prefix: char) -> Dispatcher {
        let table = Arc::clone(&self.table) as Arc<dyn CommandTable>;
        Dispatcher::new(self.services(table), prefix)
    }

    /// A message from the regular author in the test community.
    pub fn message(&self, content: &str) -> InboundMessage {
        InboundMessage::new(Author::new(AUTHOR, "alice"), CHANNEL, Some(COMMUNITY), content)
    }

    /// A direct message from the regular author.
    pub fn direct(&self, content: &str) -> InboundMessage {
        InboundMessage::new(Author::new(AUTHOR, "alice"), DM_CHANNEL, None, content)
    }
}

/// Builds a context for a community message, as the dispatcher would.
pub async fn context(harness: &Harness, content: &str) -> DispatchContext {
    build_context(harness, harness.message(content)).await
}

/// Builds a context for a direct message.
pub async fn direct_context(harness: &Harness, content: &str) -> DispatchContext {
    build_context(harness, harness.direct(content)).await
}

async fn build_context(harness: &Harness, message: InboundMessage) -> DispatchContext {
    let session = harness.db.open_session().await.unwrap();
    let user = session.user(&message.author).await.unwrap();
    let community = match message.community {
        Some(id) => Some(session.community(id).await.unwrap()),
        None => None,
    };
    DispatchContext::new(
        message,
        community,
        user,
        '!',
        session,
        Arc::clone(&harness.gateway) as Arc<dyn Gateway>,
    )
}
