//! Per-message dispatch context.

use std::fmt;
use std::sync::Arc;

use super::TemplateVars;
use crate::config::CommunityConfig;
use crate::gateway::{CommunityId, Gateway, GatewayError, InboundMessage};
use crate::store::{Session, UserRecord};

/// Everything known about one inbound message while it is dispatched.
///
/// Created once per message and dropped when dispatch completes.
#[derive(Clone)]
pub struct DispatchContext {
    pub message: InboundMessage,

    /// Config of the message's community; `None` for direct messages.
    pub community: Option<CommunityConfig>,

    pub user: UserRecord,

    /// Prefix the message matched.
    pub prefix: char,

    /// Input left for the command being executed.
    pub input: String,

    /// Set once an alias replaced the command text.
    pub alias_expanded: bool,

    session: Arc<dyn Session>,
    gateway: Arc<dyn Gateway>,
}

impl DispatchContext {
    #[must_use]
    pub fn new(
        message: InboundMessage,
        community: Option<CommunityConfig>,
        user: UserRecord,
        prefix: char,
        session: Arc<dyn Session>,
        gateway: Arc<dyn Gateway>,
    ) -> Self {
        Self {
            message,
            community,
            user,
            prefix,
            input: String::new(),
            alias_expanded: false,
            session,
            gateway,
        }
    }

    #[must_use]
    pub fn community_id(&self) -> Option<CommunityId> {
        self.community.as_ref().map(|c| c.id)
    }

    /// Persistence session of this dispatch.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Sends text to the channel the message came from.
    pub async fn respond(&self, text: &str) -> Result<(), GatewayError> {
        self.gateway.respond(self.message.channel, text).await
    }

    /// Template variables with the current input.
    #[must_use]
    pub fn template_vars(&self) -> TemplateVars<'_> {
        TemplateVars {
            input: &self.input,
            user: &self.message.author.name,
            channel: self.message.channel,
        }
    }

    /// Where the message was posted, for log lines.
    #[must_use]
    pub fn location(&self) -> String {
        match self.community_id() {
            Some(id) => format!("in channel {} of community {}", self.message.channel, id),
            None => "in private channel".to_owned(),
        }
    }
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("message", &self.message)
            .field("community", &self.community_id())
            .field("user", &self.user.id)
            .field("prefix", &self.prefix)
            .field("input", &self.input)
            .field("alias_expanded", &self.alias_expanded)
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}
