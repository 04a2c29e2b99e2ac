//! Message ingestion filter.

use tracing::debug;

use crate::gateway::{InboundMessage, MessageKind, UserId};
use crate::store::{Session, StoreError, UserRecord};

/// Checks that need no storage: message kind, bot authors, and our own messages.
#[must_use]
pub fn is_dispatchable_event(message: &InboundMessage, identity: Option<UserId>) -> bool {
    message.kind == MessageKind::User
        && !message.author.is_bot
        && identity != Some(message.author.id)
}

/// Returns the author's record if the message may be dispatched.
///
/// The user lookup creates a default record for unseen authors. Every
/// rejection is silent.
pub async fn admit(
    message: &InboundMessage,
    identity: Option<UserId>,
    session: &dyn Session,
) -> Result<Option<UserRecord>, StoreError> {
    if !is_dispatchable_event(message, identity) {
        return Ok(None);
    }

    let user = session.user(&message.author).await?;
    if user.is_blacklisted {
        debug!("Ignoring message from blacklisted user {}", user.id);
        return Ok(None);
    }
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommunityConfigStore, CustomConfigFile};
    use crate::gateway::{Author, ChannelId, CommunityId};
    use crate::store::{Database, LocalDatabase};

    const BOT: Option<UserId> = Some(UserId(1));

    fn message(author: Author) -> InboundMessage {
        InboundMessage::new(author, ChannelId(10), Some(CommunityId(100)), "!ping")
    }

    #[test]
    fn test_rejects_system_messages() {
        let mut msg = message(Author::new(UserId(5), "alice"));
        msg.kind = MessageKind::System;
        assert!(!is_dispatchable_event(&msg, BOT));
    }

    #[test]
    fn test_rejects_bots_and_self() {
        assert!(!is_dispatchable_event(&message(Author::new(UserId(9), "other").bot()), BOT));
        assert!(!is_dispatchable_event(&message(Author::new(UserId(1), "me")), BOT));
        assert!(is_dispatchable_event(&message(Author::new(UserId(5), "alice")), BOT));
    }

    #[tokio::test]
    async fn test_admit_checks_blacklist() {
        let dir = tempfile::tempdir().unwrap();
        let db = LocalDatabase::new(
            CommunityConfigStore::new(dir.path()),
            CustomConfigFile::default(),
            [UserId(66)],
        );
        let session = db.open_session().await.unwrap();

        let admitted = admit(&message(Author::new(UserId(5), "alice")), BOT, session.as_ref())
            .await
            .unwrap();
        assert_eq!(admitted.map(|u| u.id), Some(UserId(5)));

        let rejected = admit(&message(Author::new(UserId(66), "mallory")), BOT, session.as_ref())
            .await
            .unwrap();
        assert!(rejected.is_none());
        session.close().await.unwrap();
    }
}
