//! Per-meme like state and per-user engagement scores.
//!
//! Two independent pieces of bookkeeping exist side by side: a boolean
//! *liked* toggle (membership in the liked snapshot set) and a monotonic
//! *like counter* incremented once per observed click. The displayed count
//! and the is-liked flag are related but not identical; this mirrors the
//! observed behavior of the source gallery and is preserved as-is pending
//! product clarification.

use std::collections::BTreeMap;

use crate::catalog::Meme;
use crate::store::{keys, Store, StoreError};

/// Like counters, the liked snapshot set, and engagement scores, all backed
/// by the injected store. Every mutation writes through immediately; there
/// is no in-memory copy that can diverge from the medium.
#[derive(Clone)]
pub struct EngagementRecord {
    store: Store,
}

impl EngagementRecord {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // ========================================================================
    // Like Counters
    // ========================================================================

    /// Current like count for a meme, default 0.
    ///
    /// The aggregate `memeLikes` map is authoritative; a meme absent from it
    /// falls back to its bare `likes-<id>` counter so records written by the
    /// detail view alone still read back.
    pub async fn like_count(&self, meme_id: &str) -> Result<u64, StoreError> {
        let counts: BTreeMap<String, u64> =
            self.store.get_json_or_default(keys::MEME_LIKES).await?;
        if let Some(count) = counts.get(meme_id) {
            return Ok(*count);
        }
        self.store.get_counter(&keys::likes(meme_id)).await
    }

    /// Increment a meme's like counter and return the new value.
    ///
    /// Writes both the aggregate `memeLikes` map and the per-meme
    /// `likes-<id>` record so the detail view and the leaderboard agree.
    /// Read-increment-write: not atomic across concurrent clients.
    pub async fn increment_like_count(&self, meme_id: &str) -> Result<u64, StoreError> {
        let mut counts: BTreeMap<String, u64> =
            self.store.get_json_or_default(keys::MEME_LIKES).await?;

        let current = match counts.get(meme_id) {
            Some(count) => *count,
            None => self.store.get_counter(&keys::likes(meme_id)).await?,
        };
        let next = current.saturating_add(1);

        counts.insert(meme_id.to_string(), next);
        self.store.set_json(keys::MEME_LIKES, &counts).await?;
        self.store.set_counter(&keys::likes(meme_id), next).await?;

        tracing::debug!(meme_id = %meme_id, count = next, "Incremented like counter");
        Ok(next)
    }

    // ========================================================================
    // Liked Set
    // ========================================================================

    /// The liked snapshot set, in like order (first liked first).
    ///
    /// Full meme snapshots are retained, not just ids, so a liked meme stays
    /// displayable even if absent from a later catalog fetch.
    pub async fn liked_memes(&self) -> Result<Vec<Meme>, StoreError> {
        self.store.get_json_or_default(keys::LIKED_MEMES).await
    }

    /// Whether a meme is currently in the liked set.
    pub async fn is_liked(&self, meme_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .liked_memes()
            .await?
            .iter()
            .any(|meme| meme.id == meme_id))
    }

    /// Toggle liked-set membership for a meme. Returns the new membership
    /// state (`true` = now liked). Two toggles restore the original state
    /// exactly, element identity included.
    pub async fn toggle_liked(&self, meme: &Meme) -> Result<bool, StoreError> {
        let mut liked = self.liked_memes().await?;

        let now_liked = match liked.iter().position(|m| m.id == meme.id) {
            Some(index) => {
                liked.remove(index);
                false
            }
            None => {
                liked.push(meme.clone());
                true
            }
        };

        self.store.set_json(keys::LIKED_MEMES, &liked).await?;
        tracing::debug!(meme_id = %meme.id, liked = now_liked, "Toggled liked state");
        Ok(now_liked)
    }

    /// Remove a liked snapshot by position (profile cleanup). Out-of-range
    /// indices are a no-op; returns whether anything was removed.
    pub async fn remove_liked_at(&self, index: usize) -> Result<bool, StoreError> {
        let mut liked = self.liked_memes().await?;
        if index >= liked.len() {
            return Ok(false);
        }
        liked.remove(index);
        self.store.set_json(keys::LIKED_MEMES, &liked).await?;
        Ok(true)
    }

    // ========================================================================
    // Engagement Scores
    // ========================================================================

    /// Username → score mapping. Usernames are free-form local strings with
    /// no uniqueness enforcement beyond key identity.
    pub async fn engagement_scores(&self) -> Result<BTreeMap<String, f64>, StoreError> {
        self.store.get_json_or_default(keys::USER_ENGAGEMENT).await
    }

    /// Add `points` to a user's engagement score and return the new total.
    /// How scores accrue is decided by the caller; this only persists them.
    pub async fn record_engagement(&self, username: &str, points: f64) -> Result<f64, StoreError> {
        let mut scores = self.engagement_scores().await?;
        let total = scores.get(username).copied().unwrap_or(0.0) + points;
        scores.insert(username.to_string(), total);
        self.store.set_json(keys::USER_ENGAGEMENT, &scores).await?;
        Ok(total)
    }
}
