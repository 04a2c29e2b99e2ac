//! Chat gateway module.
//!
//! Models inbound chat messages and the small slice of the gateway client the
//! dispatcher needs: the bot's own identity and replying to a channel.

mod console;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use console::{ConsoleGateway, ConsoleSource};
pub use types::{Author, ChannelId, CommunityId, InboundMessage, MessageKind, UserId};

/// Errors raised by a gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to send message to channel {channel}: {reason}")]
    SendFailed { channel: ChannelId, reason: String },

    #[error("Gateway connection closed")]
    Closed,
}

/// Outbound half of a chat gateway client.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Identity of the bot account this client is logged in as.
    fn current_user(&self) -> Option<UserId>;

    /// Sends plain text to a channel.
    async fn respond(&self, channel: ChannelId, text: &str) -> Result<(), GatewayError>;
}
