//! Console gateway for running the dispatcher locally.
//!
//! Every stdin line becomes a message from a single console user. Lines are
//! posted to the configured community and channel unless they start with:
//! - `dm ` to send a direct message
//! - `#<channel> ` to post in another channel of the community

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use super::{Author, ChannelId, CommunityId, Gateway, GatewayError, InboundMessage, UserId};

/// Prints replies to stdout.
#[derive(Debug)]
pub struct ConsoleGateway {
    identity: UserId,
    stdout: Mutex<Stdout>,
}

impl ConsoleGateway {
    /// Creates a console gateway logged in as `identity`.
    #[must_use]
    pub fn new(identity: UserId) -> Self {
        Self {
            identity,
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    fn current_user(&self) -> Option<UserId> {
        Some(self.identity)
    }

    async fn respond(&self, channel: ChannelId, text: &str) -> Result<(), GatewayError> {
        let line = format!("[#{channel}] {text}\n");
        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| GatewayError::SendFailed {
                channel,
                reason: e.to_string(),
            })?;
        stdout.flush().await.map_err(|e| GatewayError::SendFailed {
            channel,
            reason: e.to_string(),
        })
    }
}

/// Turns console input lines into inbound messages.
#[derive(Debug, Clone)]
pub struct ConsoleSource {
    author: Author,
    community: CommunityId,
    channel: ChannelId,
    /// Channel id used for direct messages.
    dm_channel: ChannelId,
}

impl ConsoleSource {
    /// Creates a source posting as `author` in `community`/`channel`.
    #[must_use]
    pub const fn new(author: Author, community: CommunityId, channel: ChannelId) -> Self {
        Self {
            author,
            community,
            channel,
            dm_channel: ChannelId(0),
        }
    }

    /// Parses one input line. Returns `None` for blank lines.
    #[must_use]
    pub fn parse_line(&self, line: &str) -> Option<InboundMessage> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        if let Some(text) = line.strip_prefix("dm ") {
            return Some(InboundMessage::new(
                self.author.clone(),
                self.dm_channel,
                None,
                text,
            ));
        }

        if let Some(rest) = line.strip_prefix('#')
            && let Some((channel, text)) = rest.split_once(' ')
            && let Ok(channel) = channel.parse::<u64>()
        {
            return Some(InboundMessage::new(
                self.author.clone(),
                ChannelId(channel),
                Some(self.community),
                text,
            ));
        }

        Some(InboundMessage::new(
            self.author.clone(),
            self.channel,
            Some(self.community),
            line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ConsoleSource {
        ConsoleSource::new(Author::new(UserId(7), "console"), CommunityId(100), ChannelId(200))
    }

    #[test]
    fn test_parse_plain_line() {
        let msg = source().parse_line("!ping").unwrap();
        assert_eq!(msg.content, "!ping");
        assert_eq!(msg.community, Some(CommunityId(100)));
        assert_eq!(msg.channel, ChannelId(200));
        assert_eq!(msg.author.id, UserId(7));
    }

    #[test]
    fn test_parse_direct_message() {
        let msg = source().parse_line("dm !help").unwrap();
        assert!(msg.is_direct());
        assert_eq!(msg.content, "!help");
    }

    #[test]
    fn test_parse_channel_override() {
        let msg = source().parse_line("#42 !ignore").unwrap();
        assert_eq!(msg.channel, ChannelId(42));
        assert_eq!(msg.content, "!ignore");
    }

    #[test]
    fn test_parse_non_numeric_channel_is_plain_text() {
        let msg = source().parse_line("#general hi").unwrap();
        assert_eq!(msg.channel, ChannelId(200));
        assert_eq!(msg.content, "#general hi");
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(source().parse_line("   \n").is_none());
    }
}
