//! Append-only per-meme comment logs.

use crate::store::{keys, Store, StoreError};

/// Ordered, append-only comment list scoped to a meme id.
///
/// Appends rewrite the full list; logs are small and local, so the rewrite
/// is cheaper than any incremental encoding would be. Individual entries are
/// never edited or deleted; only the whole log can be cleared when an item
/// is removed.
#[derive(Clone)]
pub struct CommentLog {
    store: Store,
}

impl CommentLog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Comments for a meme in insertion order, default empty.
    pub async fn comments(&self, meme_id: &str) -> Result<Vec<String>, StoreError> {
        self.store
            .get_json_or_default(&keys::comments(meme_id))
            .await
    }

    /// Append a comment. Empty or whitespace-only text is rejected as a
    /// no-op (returns `false`); nothing is written in that case.
    pub async fn append(&self, meme_id: &str, text: &str) -> Result<bool, StoreError> {
        if text.trim().is_empty() {
            tracing::debug!(meme_id = %meme_id, "Rejected blank comment");
            return Ok(false);
        }

        let mut comments = self.comments(meme_id).await?;
        comments.push(text.to_string());
        self.store
            .set_json(&keys::comments(meme_id), &comments)
            .await?;
        Ok(true)
    }

    /// Drop the entire log for a meme (item removal cleanup).
    pub async fn clear(&self, meme_id: &str) -> Result<(), StoreError> {
        self.store.remove(&keys::comments(meme_id)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::CommentLog;
    use crate::store::{keys, MemoryStore, Store};

    fn test_log() -> CommentLog {
        CommentLog::new(Store::new(Arc::new(MemoryStore::default())))
    }

    #[tokio::test]
    async fn test_default_empty() {
        let log = test_log();
        assert!(log.comments("1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let log = test_log();
        for text in ["a", "b", "c"] {
            assert!(log.append("1", text).await.unwrap());
        }
        assert_eq!(log.comments("1").await.unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_blank_comment_is_noop() {
        let log = test_log();
        log.append("1", "first").await.unwrap();

        assert!(!log.append("1", "").await.unwrap());
        assert!(!log.append("1", "   \t\n").await.unwrap());
        assert_eq!(log.comments("1").await.unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_logs_are_scoped_per_meme() {
        let log = test_log();
        log.append("1", "on doge").await.unwrap();
        log.append("2", "on cat").await.unwrap();

        assert_eq!(log.comments("1").await.unwrap(), vec!["on doge"]);
        assert_eq!(log.comments("2").await.unwrap(), vec!["on cat"]);
    }

    #[tokio::test]
    async fn test_clear() {
        let log = test_log();
        log.append("1", "bye").await.unwrap();
        log.clear("1").await.unwrap();
        assert!(log.comments("1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_log_degrades_to_empty() {
        let log = test_log();
        log.store
            .set_raw(&keys::comments("1"), "[unterminated")
            .await
            .unwrap();

        assert!(log.comments("1").await.unwrap().is_empty());
        log.append("1", "fresh start").await.unwrap();
        assert_eq!(log.comments("1").await.unwrap(), vec!["fresh start"]);
    }
}
