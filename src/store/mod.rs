mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-layer errors.
///
/// Note that *decode* failures are deliberately not represented here: a
/// record that cannot be decoded is treated as absent by the typed accessors
/// on [`Store`], so a corrupted value degrades to the type's default instead
/// of failing the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another process has the database locked
    #[error("Another instance of memeverse appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Store migration failed: {0}")]
    Migration(String),

    /// Generic backend error
    #[error("Store error: {0}")]
    Backend(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return StoreError::InstanceLocked;
        }

        StoreError::Backend(err)
    }
}

// ============================================================================
// Record Keys
// ============================================================================

/// Namespaced keys for every persisted record.
///
/// The key names match the original gallery's persisted records verbatim so
/// an existing store remains readable.
pub mod keys {
    /// Liked-meme snapshot list (JSON list of memes, insertion order)
    pub const LIKED_MEMES: &str = "likedMemes";
    /// Aggregate like counters (JSON mapping meme id → count)
    pub const MEME_LIKES: &str = "memeLikes";
    /// Engagement scores (JSON mapping username → score)
    pub const USER_ENGAGEMENT: &str = "userEngagement";
    /// User-authored uploads (JSON list)
    pub const UPLOADED_MEMES: &str = "uploadedMemes";
    /// Profile fields (plain strings, not JSON-wrapped)
    pub const PROFILE_NAME: &str = "profileName";
    pub const PROFILE_BIO: &str = "profileBio";
    pub const PROFILE_PIC: &str = "profilePic";

    /// Per-meme like counter written by the detail view.
    /// Stored as a bare integer string, not JSON-wrapped.
    pub fn likes(meme_id: &str) -> String {
        format!("likes-{meme_id}")
    }

    /// Per-meme comment log (JSON list of strings)
    pub fn comments(meme_id: &str) -> String {
        format!("comments-{meme_id}")
    }
}

// ============================================================================
// KeyValueStore
// ============================================================================

/// The persistent, string-keyed storage medium.
///
/// Implementations: [`SqliteStore`] for production, [`MemoryStore`] for tests
/// and ephemeral sessions. Every component depends on this interface through
/// [`Store`], never on a concrete medium.
///
/// Access is assumed single-client: read-modify-write sequences are not
/// atomic across processes, and concurrent mutation of the same key can lose
/// updates. That is an accepted limitation, not a guarantee this layer
/// provides.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the raw stored text for `key`, or `None` if not set.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set `key` to `value` (UPSERT, last-write-wins).
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is a no-op.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Typed Accessors
// ============================================================================

/// Cheaply cloneable handle over the injected [`KeyValueStore`], adding the
/// typed JSON / counter / plain-string accessors the rest of the core uses.
///
/// The decode contract: malformed stored text is treated as absent. A
/// corrupted record is logged and the caller sees the default for its type
/// (empty list/map, zero, empty string), never an error.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn KeyValueStore>,
}

impl Store {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Get the raw stored text for `key`.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    /// Set the raw stored text for `key`.
    pub async fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    /// Remove `key`.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }

    /// Decode the JSON record at `key`, or `None` if missing or malformed.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.inner.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Undecodable record, treating as absent");
                Ok(None)
            }
        }
    }

    /// Decode the JSON record at `key`, falling back to `T::default()` when
    /// missing or malformed.
    pub async fn get_json_or_default<T>(&self, key: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.get_json(key).await?.unwrap_or_default())
    }

    /// Encode `value` as JSON and store it at `key`.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        // Serializing the core's record types cannot fail; map defensively anyway
        let raw = serde_json::to_string(value)
            .map_err(|e| StoreError::Migration(format!("encode {key}: {e}")))?;
        self.inner.set(key, &raw).await
    }

    /// Read a bare integer counter (the `likes-<id>` records are stored as
    /// plain digit strings, not JSON). Missing or malformed yields 0.
    pub async fn get_counter(&self, key: &str) -> Result<u64, StoreError> {
        let Some(raw) = self.inner.get(key).await? else {
            return Ok(0);
        };
        match raw.trim().parse::<u64>() {
            Ok(n) => Ok(n),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Undecodable counter, treating as zero");
                Ok(0)
            }
        }
    }

    /// Write a bare integer counter as a plain digit string.
    pub async fn set_counter(&self, key: &str, value: u64) -> Result<(), StoreError> {
        self.inner.set(key, &value.to_string()).await
    }

    /// Read a plain-string record, substituting `default` when missing.
    pub async fn get_string_or<'a>(
        &self,
        key: &str,
        default: &'a str,
    ) -> Result<String, StoreError> {
        Ok(self
            .inner
            .get(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }
}
