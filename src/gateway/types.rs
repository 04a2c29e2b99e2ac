//! Gateway identifiers and message types.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

snowflake!(
    /// Stable identifier of a chat community (guild).
    CommunityId
);
snowflake!(
    /// Stable identifier of a channel.
    ChannelId
);
snowflake!(
    /// Stable identifier of a user account.
    UserId
);

/// Kind of gateway message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// An ordinary message typed by a user.
    User,
    /// Gateway-internal or system notice (joins, pins, ...).
    System,
}

/// Author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub is_bot: bool,
}

impl Author {
    /// Creates a human (non-bot) author.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_bot: false,
        }
    }

    /// Marks this author as a bot account.
    #[must_use]
    pub const fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }
}

/// A message received from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub kind: MessageKind,
    pub author: Author,
    pub channel: ChannelId,
    /// `None` for direct messages.
    pub community: Option<CommunityId>,
    pub content: String,
}

impl InboundMessage {
    /// Creates an ordinary user message.
    #[must_use]
    pub fn new(
        author: Author,
        channel: ChannelId,
        community: Option<CommunityId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind: MessageKind::User,
            author,
            channel,
            community,
            content: content.into(),
        }
    }

    /// Returns true if the message was sent outside any community.
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        self.community.is_none()
    }
}
