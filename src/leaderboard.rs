//! Read-side leaderboard projections over the local engagement store.

use crate::catalog::Meme;
use crate::engagement::EngagementRecord;
use crate::store::StoreError;

/// Default size bound for the meme ranking.
pub const DEFAULT_TOP_MEMES: usize = 10;
/// Default size bound for the user ranking.
pub const DEFAULT_TOP_USERS: usize = 5;

/// A liked meme annotated with its current like count.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMeme {
    pub meme: Meme,
    pub like_count: u64,
}

/// A username annotated with its engagement score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedUser {
    pub username: String,
    pub score: f64,
}

/// Computes sorted, size-bounded rankings from the engagement record.
///
/// Pure read-side: recomputed on demand, never mutates anything. Callers
/// re-request after mutations; there is no subscription mechanism.
#[derive(Clone)]
pub struct LeaderboardAggregator {
    engagement: EngagementRecord,
}

impl LeaderboardAggregator {
    pub fn new(engagement: EngagementRecord) -> Self {
        Self { engagement }
    }

    /// Top `n` memes by like count, descending.
    ///
    /// Eligibility is the liked snapshot set, not the full catalog: only
    /// memes the user explicitly liked are ranked. The sort is stable, so
    /// ties keep like order (first liked first).
    pub async fn top_memes(&self, n: usize) -> Result<Vec<RankedMeme>, StoreError> {
        let liked = self.engagement.liked_memes().await?;

        let mut ranked = Vec::with_capacity(liked.len());
        for meme in liked {
            let like_count = self.engagement.like_count(&meme.id).await?;
            ranked.push(RankedMeme { meme, like_count });
        }

        ranked.sort_by(|a, b| b.like_count.cmp(&a.like_count));
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Top `n` users by engagement score, descending. Stable sort: ties keep
    /// the score mapping's key iteration order, which is deterministic.
    pub async fn top_users(&self, n: usize) -> Result<Vec<RankedUser>, StoreError> {
        let scores = self.engagement.engagement_scores().await?;

        let mut ranked: Vec<RankedUser> = scores
            .into_iter()
            .map(|(username, score)| RankedUser { username, score })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(n);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{LeaderboardAggregator, DEFAULT_TOP_MEMES, DEFAULT_TOP_USERS};
    use crate::catalog::Meme;
    use crate::engagement::EngagementRecord;
    use crate::store::{MemoryStore, Store};

    fn test_setup() -> (EngagementRecord, LeaderboardAggregator) {
        let record = EngagementRecord::new(Store::new(Arc::new(MemoryStore::default())));
        let board = LeaderboardAggregator::new(record.clone());
        (record, board)
    }

    fn test_meme(id: &str, name: &str) -> Meme {
        Meme {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("https://i.imgflip.com/{id}.jpg"),
            width: 500,
            height: 500,
        }
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_rankings() {
        let (_, board) = test_setup();
        assert!(board.top_memes(DEFAULT_TOP_MEMES).await.unwrap().is_empty());
        assert!(board.top_users(DEFAULT_TOP_USERS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ties_broken_by_like_order() {
        let (record, board) = test_setup();

        // Liked in order m3, m1, m2 with counts {m1: 5, m2: 5, m3: 2}
        record.toggle_liked(&test_meme("m3", "Three")).await.unwrap();
        record.toggle_liked(&test_meme("m1", "One")).await.unwrap();
        record.toggle_liked(&test_meme("m2", "Two")).await.unwrap();
        for _ in 0..5 {
            record.increment_like_count("m1").await.unwrap();
            record.increment_like_count("m2").await.unwrap();
        }
        record.increment_like_count("m3").await.unwrap();
        record.increment_like_count("m3").await.unwrap();

        let top = board.top_memes(10).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|r| r.meme.id.as_str()).collect();
        // Descending by count; m1 before m2 because it was liked first
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(top[0].like_count, 5);
        assert_eq!(top[2].like_count, 2);
    }

    #[tokio::test]
    async fn test_only_liked_memes_are_eligible() {
        let (record, board) = test_setup();

        // A counter alone does not enter the ranking
        record.increment_like_count("unliked").await.unwrap();
        record.toggle_liked(&test_meme("liked", "Liked")).await.unwrap();

        let top = board.top_memes(10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].meme.id, "liked");
    }

    #[tokio::test]
    async fn test_top_memes_size_bound() {
        let (record, board) = test_setup();
        for i in 0..15 {
            record
                .toggle_liked(&test_meme(&i.to_string(), &format!("Meme {i}")))
                .await
                .unwrap();
        }

        assert_eq!(board.top_memes(10).await.unwrap().len(), 10);
        assert_eq!(board.top_memes(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_top_users_sorted_descending() {
        let (record, board) = test_setup();
        record.record_engagement("alex", 10.0).await.unwrap();
        record.record_engagement("sam", 40.0).await.unwrap();
        record.record_engagement("kit", 25.0).await.unwrap();

        let top = board.top_users(5).await.unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["sam", "kit", "alex"]);
    }

    #[tokio::test]
    async fn test_top_users_tie_break_is_deterministic() {
        let (record, board) = test_setup();
        record.record_engagement("zoe", 5.0).await.unwrap();
        record.record_engagement("abe", 5.0).await.unwrap();

        // Equal scores keep key iteration order of the mapping
        let top = board.top_users(5).await.unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["abe", "zoe"]);
    }

    #[tokio::test]
    async fn test_rankings_never_mutate_the_record() {
        let (record, board) = test_setup();
        record.toggle_liked(&test_meme("1", "Doge")).await.unwrap();
        record.increment_like_count("1").await.unwrap();

        let before = record.liked_memes().await.unwrap();
        board.top_memes(10).await.unwrap();
        board.top_users(5).await.unwrap();
        let after = record.liked_memes().await.unwrap();

        assert_eq!(before, after);
        assert_eq!(record.like_count("1").await.unwrap(), 1);
    }
}
