//! Command prefix resolution.

use crate::config::CommunityConfig;
use crate::gateway::CommunityId;
use crate::store::{Session, StoreError};

/// Prefix in effect for a message, with the community config it came from.
#[derive(Debug, Clone)]
pub struct ResolvedPrefix {
    pub prefix: char,
    pub community: Option<CommunityConfig>,
}

/// Resolves the prefix for a message posted in `community`.
///
/// Direct messages use `default`. A community without a prefix is assigned
/// `default` first, and the returned config already reflects that.
pub async fn resolve_prefix(
    session: &dyn Session,
    community: Option<CommunityId>,
    default: char,
) -> Result<ResolvedPrefix, StoreError> {
    let Some(id) = community else {
        return Ok(ResolvedPrefix {
            prefix: default,
            community: None,
        });
    };

    let prefix = session.community_prefix(id, default).await?;
    let config = session.community(id).await?;
    Ok(ResolvedPrefix {
        prefix,
        community: Some(config),
    })
}

/// Returns the text after `prefix` if `content` starts with it.
#[must_use]
pub fn strip_prefix(content: &str, prefix: char) -> Option<&str> {
    content.strip_prefix(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommunityConfigStore, CustomConfigFile};
    use crate::store::{Database, LocalDatabase};

    fn database(dir: &std::path::Path) -> LocalDatabase {
        LocalDatabase::new(CommunityConfigStore::new(dir), CustomConfigFile::default(), [])
    }

    #[tokio::test]
    async fn test_direct_message_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        let session = db.open_session().await.unwrap();

        let resolved = resolve_prefix(session.as_ref(), None, '!').await.unwrap();
        assert_eq!(resolved.prefix, '!');
        assert!(resolved.community.is_none());
        assert_eq!(db.communities().cached().await, 0);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unset_prefix_is_assigned_and_visible() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        let session = db.open_session().await.unwrap();

        let resolved = resolve_prefix(session.as_ref(), Some(CommunityId(4)), '!')
            .await
            .unwrap();
        assert_eq!(resolved.prefix, '!');
        assert_eq!(
            resolved.community.unwrap().prefix.as_deref(),
            Some("!")
        );

        // A later default change does not affect the community.
        let resolved = resolve_prefix(session.as_ref(), Some(CommunityId(4)), '?')
            .await
            .unwrap();
        assert_eq!(resolved.prefix, '!');
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_stored_prefix_first_character_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CommunityConfig::new(CommunityId(4));
        config.prefix = Some(">>".to_owned());
        config.save(dir.path()).await.unwrap();

        let db = database(dir.path());
        let session = db.open_session().await.unwrap();
        let resolved = resolve_prefix(session.as_ref(), Some(CommunityId(4)), '!')
            .await
            .unwrap();
        assert_eq!(resolved.prefix, '>');
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_stored_prefix_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CommunityConfig::new(CommunityId(4));
        config.prefix = Some(String::new());
        config.save(dir.path()).await.unwrap();

        let db = database(dir.path());
        let session = db.open_session().await.unwrap();
        let resolved = resolve_prefix(session.as_ref(), Some(CommunityId(4)), '!')
            .await
            .unwrap();
        assert_eq!(resolved.prefix, '!');
        session.close().await.unwrap();
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("!ping", '!'), Some("ping"));
        assert_eq!(strip_prefix("ping", '!'), None);
        assert_eq!(strip_prefix(" !ping", '!'), None);
        assert_eq!(strip_prefix("¡hola", '¡'), Some("hola"));
        assert_eq!(strip_prefix("", '!'), None);
    }
}
